use std::collections::BTreeSet;
use std::sync::Arc;

use serde::Serialize;
use tracing::{error, info};

use crate::clock::Clock;
use crate::error::AppError;
use crate::models::course::{COURSES_ROOT_KEY, root_marker};
use crate::models::{Course, CourseField, Identity, Semester, TeacherSlot};
use crate::store::{DocumentStore, StoreError};

struct SampleCourse {
    code: &'static str,
    name: &'static str,
    teachers: [&'static str; 2],
}

const FIRST_SEMESTER_SAMPLES: &[SampleCourse] = &[
    SampleCourse { code: "ENG-101", name: "English Composition", teachers: ["Dr. Sarah Johnson", "Prof. Mike Wilson"] },
    SampleCourse { code: "MATH-101", name: "Calculus I", teachers: ["Dr. David Lee", "Prof. Emily Chen"] },
    SampleCourse { code: "PHY-101", name: "Physics I", teachers: ["Dr. Robert Brown", "Prof. Lisa Garcia"] },
    SampleCourse { code: "CSE-101", name: "Introduction to Computer Science", teachers: ["Dr. Ahmed Rahman", "Prof. Maria Rodriguez"] },
];

const SECOND_SEMESTER_SAMPLES: &[SampleCourse] = &[
    SampleCourse { code: "CSE-201", name: "Data Structures", teachers: ["Dr. John Smith", "Prof. Anna Davis"] },
    SampleCourse { code: "MATH-201", name: "Discrete Mathematics", teachers: ["Dr. Kevin Wu", "Prof. Rachel Kim"] },
    SampleCourse { code: "ENG-201", name: "Technical Writing", teachers: ["Dr. Jennifer Lopez", "Prof. Steven Clark"] },
    SampleCourse { code: "PHY-201", name: "Physics II", teachers: ["Dr. Michael Taylor", "Prof. Sandra Martinez"] },
];

fn samples_for(semester: Semester) -> &'static [SampleCourse] {
    match semester {
        Semester::Second => SECOND_SEMESTER_SAMPLES,
        _ => FIRST_SEMESTER_SAMPLES,
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SaveReport {
    pub updated: usize,
    pub created: usize,
    pub deleted: usize,
}

/// Staged course list of one semester.
///
/// Rows are edited in memory only. `save` pushes every row to the store:
/// persisted rows are merged, drafts are created and take over the key the
/// store assigns, and persisted rows that were dropped from the list are
/// deleted.
pub struct CourseEditor {
    store: Arc<dyn DocumentStore>,
    clock: Arc<dyn Clock>,
    semester: Semester,
    courses: Vec<Course>,
    // keys the store is known to hold for this semester
    persisted: BTreeSet<String>,
}

impl CourseEditor {
    pub fn new(store: Arc<dyn DocumentStore>, clock: Arc<dyn Clock>, semester: Semester) -> Self {
        Self {
            store,
            clock,
            semester,
            courses: Vec::new(),
            persisted: BTreeSet::new(),
        }
    }

    pub fn courses(&self) -> &[Course] {
        &self.courses
    }

    pub fn into_courses(self) -> Vec<Course> {
        self.courses
    }

    /// Loads the semester's courses. A failed read leaves an empty list.
    pub async fn load(&mut self) {
        if let Err(e) = self.try_load().await {
            error!("Error fetching courses for {} semester: {}", self.semester, e);
            self.persisted.clear();
            self.courses.clear();
        }
    }

    /// Like `load`, but hands the read failure back to the caller.
    pub async fn try_load(&mut self) -> Result<(), StoreError> {
        let courses = self.fetch().await?;
        self.persisted = courses
            .iter()
            .filter_map(|c| c.id.persisted_key().map(str::to_string))
            .collect();
        self.courses = courses;
        Ok(())
    }

    async fn fetch(&self) -> Result<Vec<Course>, StoreError> {
        let root = Course::root_collection();
        if self.store.get_one(&root, COURSES_ROOT_KEY).await?.is_none() {
            self.store
                .overwrite(&root, COURSES_ROOT_KEY, root_marker(self.clock.now()))
                .await?;
        }

        let docs = self.store.list_all(&Course::collection(self.semester), None).await?;
        Ok(docs.iter().map(Course::from_document).collect())
    }

    pub fn add_blank(&mut self) -> usize {
        self.courses.push(Course::blank(self.clock.now()));
        self.courses.len() - 1
    }

    /// Replaces the list with example drafts for the semester.
    pub fn generate_sample(&mut self) {
        let now = self.clock.now();
        self.courses = samples_for(self.semester)
            .iter()
            .map(|s| Course::draft(s.code, s.name, s.teachers, now))
            .collect();
    }

    /// Installs rows staged elsewhere, e.g. by the browser.
    pub fn replace_rows(&mut self, rows: Vec<Course>) {
        self.courses = rows;
    }

    pub fn edit_field(&mut self, index: usize, field: CourseField, value: impl Into<String>) -> Result<(), AppError> {
        self.row_mut(index)?.set_field(field, value.into());
        Ok(())
    }

    pub fn edit_teacher(&mut self, index: usize, slot: TeacherSlot, value: impl Into<String>) -> Result<(), AppError> {
        self.row_mut(index)?.set_teacher(slot, value.into());
        Ok(())
    }

    fn row_mut(&mut self, index: usize) -> Result<&mut Course, AppError> {
        self.courses
            .get_mut(index)
            .ok_or_else(|| AppError::Validation(format!("No course at row {}", index + 1)))
    }

    /// Removes a row. Persisted rows are deleted from the store first and
    /// stay in the list if that fails.
    pub async fn delete_at(&mut self, index: usize) -> Result<Course, AppError> {
        let course = self
            .courses
            .get(index)
            .ok_or_else(|| AppError::Validation(format!("No course at row {}", index + 1)))?;

        if let Some(key) = course.id.persisted_key().map(str::to_string) {
            self.store.delete(&Course::collection(self.semester), &key).await?;
            self.persisted.remove(&key);
            info!("Deleted course {} from {} semester", key, self.semester);
        }

        Ok(self.courses.remove(index))
    }

    /// Writes every row, one store call at a time. The first failure stops
    /// the run; writes already made stay, and drafts created so far keep
    /// their new keys.
    pub async fn save(&mut self) -> Result<SaveReport, AppError> {
        let now = self.clock.now();
        let collection = Course::collection(self.semester);

        let dropped: Vec<String> = self
            .persisted
            .iter()
            .filter(|key| !self.courses.iter().any(|c| c.id.persisted_key() == Some(key.as_str())))
            .cloned()
            .collect();

        let total = 1 + self.courses.len() + dropped.len();
        let mut written = 0;
        let mut report = SaveReport::default();
        let abort = |written: usize, source: StoreError| AppError::PartialSave { written, total, source };

        self.store
            .merge_update(&Course::root_collection(), COURSES_ROOT_KEY, root_marker(now))
            .await
            .map_err(|e| abort(written, e))?;
        written += 1;

        for course in self.courses.iter_mut() {
            match course.id.persisted_key().map(str::to_string) {
                Some(key) => {
                    self.store
                        .merge_update(&collection, &key, course.update_fields(now))
                        .await
                        .map_err(|e| abort(written, e))?;
                    report.updated += 1;
                }
                None => {
                    let key = self
                        .store
                        .create(&collection, course.create_fields(now))
                        .await
                        .map_err(|e| abort(written, e))?;
                    course.id = Identity::Persisted(key.clone());
                    course.created_at = now;
                    self.persisted.insert(key);
                    report.created += 1;
                }
            }
            written += 1;
        }

        for key in dropped {
            self.store
                .delete(&collection, &key)
                .await
                .map_err(|e| abort(written, e))?;
            self.persisted.remove(&key);
            report.deleted += 1;
            written += 1;
        }

        info!(
            "Saved {} semester courses - updated: {}, created: {}, deleted: {}",
            self.semester, report.updated, report.created, report.deleted
        );
        Ok(report)
    }
}
