use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Value, json};

use crate::clock::{format_timestamp, parse_timestamp};
use crate::models::{Identity, Semester};
use crate::store::{CollectionPath, Document, Fields};

pub const COURSES_COLLECTION: &str = "courses";
pub const COURSES_ROOT_KEY: &str = "main";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    /// Rows submitted without an id are new drafts.
    #[serde(default = "Identity::draft")]
    pub id: Identity,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub name: String,
    /// Primary and secondary teacher; an empty secondary means none.
    #[serde(default, deserialize_with = "lenient_teachers")]
    pub teachers: [String; 2],
    #[serde(default)]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CourseField {
    Code,
    Name,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TeacherSlot {
    Primary,
    Secondary,
}

impl TeacherSlot {
    fn index(self) -> usize {
        match self {
            TeacherSlot::Primary => 0,
            TeacherSlot::Secondary => 1,
        }
    }
}

impl Course {
    pub fn blank(created_at: DateTime<Utc>) -> Self {
        Self {
            id: Identity::draft(),
            code: String::new(),
            name: String::new(),
            teachers: [String::new(), String::new()],
            created_at,
        }
    }

    pub fn draft(code: &str, name: &str, teachers: [&str; 2], created_at: DateTime<Utc>) -> Self {
        Self {
            id: Identity::draft(),
            code: code.to_string(),
            name: name.to_string(),
            teachers: teachers.map(str::to_string),
            created_at,
        }
    }

    /// The singleton document whose sub-collections hold each semester.
    pub fn root_collection() -> CollectionPath {
        CollectionPath::root(COURSES_COLLECTION)
    }

    pub fn collection(semester: Semester) -> CollectionPath {
        Self::root_collection().child(COURSES_ROOT_KEY, semester.as_str())
    }

    pub fn set_field(&mut self, field: CourseField, value: String) {
        match field {
            CourseField::Code => self.code = value,
            CourseField::Name => self.name = value,
        }
    }

    pub fn set_teacher(&mut self, slot: TeacherSlot, value: String) {
        self.teachers[slot.index()] = value;
    }

    /// Reads a stored course, filling gaps with empty values.
    pub fn from_document(doc: &Document) -> Self {
        let text = |name: &str| {
            doc.fields
                .get(name)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };

        let created_at = doc
            .fields
            .get("createdAt")
            .and_then(Value::as_str)
            .and_then(parse_timestamp)
            .unwrap_or_default();

        Self {
            id: Identity::Persisted(doc.key.clone()),
            code: text("code"),
            name: text("name"),
            teachers: teachers_from(doc.fields.get("teachers")),
            created_at,
        }
    }

    /// Fields written on every save of this course.
    pub fn update_fields(&self, now: DateTime<Utc>) -> Fields {
        let mut fields = Fields::new();
        fields.insert("code".to_string(), json!(self.code));
        fields.insert("name".to_string(), json!(self.name));
        fields.insert("teachers".to_string(), json!(self.teachers));
        fields.insert("updatedAt".to_string(), json!(format_timestamp(now)));
        fields
    }

    /// Fields written when the course is first stored.
    pub fn create_fields(&self, now: DateTime<Utc>) -> Fields {
        let mut fields = self.update_fields(now);
        fields.insert("createdAt".to_string(), json!(format_timestamp(now)));
        fields
    }
}

/// First two entries of a teachers array. Missing or non-string entries
/// read as empty names; extras are ignored.
fn teachers_from(value: Option<&Value>) -> [String; 2] {
    let mut teachers = [String::new(), String::new()];
    if let Some(stored) = value.and_then(Value::as_array) {
        for (slot, name) in teachers.iter_mut().zip(stored) {
            *slot = name.as_str().unwrap_or_default().to_string();
        }
    }
    teachers
}

fn lenient_teachers<'de, D: Deserializer<'de>>(deserializer: D) -> Result<[String; 2], D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(teachers_from(value.as_ref()))
}

pub fn root_marker(now: DateTime<Utc>) -> Fields {
    let mut fields = Fields::new();
    fields.insert("updatedAt".to_string(), json!(format_timestamp(now)));
    fields
}
