use std::sync::Arc;

use rand::Rng;
use rand::rngs::ThreadRng;
use tracing::{error, info};

use crate::error::AppError;
use crate::models::routine::SLOTS_PER_DAY;
use crate::models::{RoutineGrid, Semester, Slot, Weekday};
use crate::store::DocumentStore;

pub const DEFAULT_SEMESTER: Semester = Semester::Sixth;

const DEPARTMENTS: [&str; 3] = ["CIT", "CCE", "EEE"];

const SUBJECTS: [&str; 12] = [
    "Programming",
    "Database",
    "Networks",
    "Software Engineering",
    "Data Structures",
    "Algorithms",
    "Computer Graphics",
    "AI",
    "System Analysis",
    "Web Technology",
    "Mobile Computing",
    "Security",
];

/// Source of uniform choices for generated routines.
pub trait Picker {
    /// Returns an index in `0..len`. `len` is never zero.
    fn pick(&mut self, len: usize) -> usize;
}

/// Uniform picks from any `rand` generator.
#[derive(Debug, Clone)]
pub struct RngPicker<R>(R);

impl RngPicker<ThreadRng> {
    pub fn thread() -> Self {
        Self(rand::rng())
    }
}

impl<R: Rng> RngPicker<R> {
    pub fn new(rng: R) -> Self {
        Self(rng)
    }
}

impl<R: Rng> Picker for RngPicker<R> {
    fn pick(&mut self, len: usize) -> usize {
        self.0.random_range(0..len)
    }
}

/// Builds a label like `CIT-3201 Programming` for the given semester.
pub fn random_course_label(semester: Semester, picker: &mut impl Picker) -> String {
    let n = semester.ordinal();
    let level = n.div_ceil(2);
    let term = if n % 2 == 0 { 2 } else { 1 };

    let department = DEPARTMENTS[picker.pick(DEPARTMENTS.len())];
    let number = picker.pick(9) + 1;
    let subject = SUBJECTS[picker.pick(SUBJECTS.len())];

    format!("{}-{}{}{:02} {}", department, level, term, number, subject)
}

/// Weekly timetable of one semester, staged until saved.
pub struct RoutineEditor {
    store: Arc<dyn DocumentStore>,
    semester: Semester,
    grid: RoutineGrid,
}

impl RoutineEditor {
    pub fn new(store: Arc<dyn DocumentStore>, semester: Semester) -> Self {
        Self {
            store,
            semester,
            grid: RoutineGrid::default(),
        }
    }

    pub fn grid(&self) -> &RoutineGrid {
        &self.grid
    }

    pub fn into_grid(self) -> RoutineGrid {
        self.grid
    }

    /// Loads the stored routine. A missing document or failed read leaves
    /// the default grid.
    pub async fn load(&mut self) {
        let key = RoutineGrid::document_key(self.semester);
        self.grid = match self.store.get_one(&RoutineGrid::collection(), key).await {
            Ok(Some(fields)) => RoutineGrid::from_fields(&fields),
            Ok(None) => RoutineGrid::default(),
            Err(e) => {
                error!("Error fetching routine for {} semester: {}", self.semester, e);
                RoutineGrid::default()
            }
        };
    }

    pub fn set_time(&mut self, day: Weekday, index: usize, time: impl Into<String>) -> Result<(), AppError> {
        self.slot_mut(day, index)?.time = time.into();
        Ok(())
    }

    pub fn set_course(&mut self, day: Weekday, index: usize, course: impl Into<String>) -> Result<(), AppError> {
        self.slot_mut(day, index)?.course = course.into();
        Ok(())
    }

    fn slot_mut(&mut self, day: Weekday, index: usize) -> Result<&mut Slot, AppError> {
        self.grid
            .slot_mut(day, index)
            .ok_or_else(|| AppError::Validation(format!("No slot {} on {}", index, day)))
    }

    pub fn replace_grid(&mut self, grid: RoutineGrid) {
        self.grid = grid;
    }

    /// Starts over from the default times and fills every slot with a
    /// generated label.
    pub fn generate_random(&mut self, picker: &mut impl Picker) {
        self.grid = RoutineGrid::default();
        for day in Weekday::ALL {
            for index in 0..SLOTS_PER_DAY {
                let label = random_course_label(self.semester, picker);
                if let Some(slot) = self.grid.slot_mut(day, index) {
                    slot.course = label;
                }
            }
        }
    }

    /// Replaces the stored routine with the current grid.
    pub async fn save(&self) -> Result<(), AppError> {
        let key = RoutineGrid::document_key(self.semester);
        self.store
            .overwrite(&RoutineGrid::collection(), key, self.grid.to_fields())
            .await?;
        info!("Saved routine for {} semester", self.semester);
        Ok(())
    }
}
