use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::clock::{format_timestamp, parse_timestamp};
use crate::store::{CollectionPath, Document, Fields};

pub const NOTICES_COLLECTION: &str = "notices";
pub const CREATED_AT_FIELD: &str = "created_at";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notice {
    pub id: String,
    pub title: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewNoticeRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
}

impl Notice {
    pub fn collection() -> CollectionPath {
        CollectionPath::root(NOTICES_COLLECTION)
    }

    pub fn from_document(doc: &Document) -> Self {
        let text = |name: &str| {
            doc.fields
                .get(name)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };
        let stamp = |name: &str| {
            doc.fields
                .get(name)
                .and_then(Value::as_str)
                .and_then(parse_timestamp)
                .unwrap_or_default()
        };

        Self {
            id: doc.key.clone(),
            title: text("title"),
            content: text("content"),
            created_at: stamp(CREATED_AT_FIELD),
            updated_at: stamp("updated_at"),
        }
    }

    pub fn to_fields(&self) -> Fields {
        let mut fields = Fields::new();
        fields.insert("title".to_string(), json!(self.title));
        fields.insert("content".to_string(), json!(self.content));
        fields.insert(CREATED_AT_FIELD.to_string(), json!(format_timestamp(self.created_at)));
        fields.insert("updated_at".to_string(), json!(format_timestamp(self.updated_at)));
        fields
    }
}
