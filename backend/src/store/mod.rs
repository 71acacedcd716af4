pub mod memory;
pub mod sqlite;

use std::cmp::Ordering;
use std::fmt;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

pub use memory::MemoryDocumentStore;
pub use sqlite::SqliteDocumentStore;

/// Top-level fields of a stored document.
pub type Fields = serde_json::Map<String, Value>;

#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub key: String,
    pub fields: Fields,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("document store returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("malformed document: {0}")]
    Malformed(String),

    #[error("invalid collection path: {0}")]
    InvalidPath(String),

    #[error("store configuration error: {0}")]
    Config(String),
}

/// Slash separated path of a collection, e.g. `notices` or
/// `courses/main/1st`. Always has an odd number of segments.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CollectionPath(String);

impl CollectionPath {
    /// A top level collection. Callers pass constant names.
    pub fn root(name: &str) -> Self {
        Self(name.to_string())
    }

    /// Sub-collection `name` under document `key` of this collection.
    pub fn child(&self, key: &str, name: &str) -> Self {
        Self(format!("{}/{}/{}", self.0, key, name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CollectionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub field: String,
    pub direction: Direction,
}

impl OrderBy {
    pub fn descending(field: &str) -> Self {
        Self {
            field: field.to_string(),
            direction: Direction::Descending,
        }
    }

    pub fn ascending(field: &str) -> Self {
        Self {
            field: field.to_string(),
            direction: Direction::Ascending,
        }
    }
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn list_all(
        &self,
        collection: &CollectionPath,
        order: Option<&OrderBy>,
    ) -> Result<Vec<Document>, StoreError>;

    async fn get_one(&self, collection: &CollectionPath, key: &str) -> Result<Option<Fields>, StoreError>;

    /// Stores a new document and returns the key the store assigned to it.
    async fn create(&self, collection: &CollectionPath, fields: Fields) -> Result<String, StoreError>;

    /// Writes only the given top-level fields, creating the document if needed.
    async fn merge_update(&self, collection: &CollectionPath, key: &str, fields: Fields) -> Result<(), StoreError>;

    /// Replaces the whole document.
    async fn overwrite(&self, collection: &CollectionPath, key: &str, fields: Fields) -> Result<(), StoreError>;

    /// Deleting a document that does not exist is not an error.
    async fn delete(&self, collection: &CollectionPath, key: &str) -> Result<(), StoreError>;

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

/// Applies `order` the way the hosted store does: documents without the
/// field are dropped, the rest sorted by the field value.
pub(crate) fn apply_order(mut docs: Vec<Document>, order: &OrderBy) -> Vec<Document> {
    docs.retain(|d| d.fields.get(&order.field).is_some_and(|v| !v.is_null()));
    docs.sort_by(|a, b| {
        let ord = compare_values(&a.fields[&order.field], &b.fields[&order.field]);
        match order.direction {
            Direction::Ascending => ord,
            Direction::Descending => ord.reverse(),
        }
    });
    docs
}

fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            let x = x.as_f64().unwrap_or(0.0);
            let y = y.as_f64().unwrap_or(0.0);
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}

// Cross-type ordering: booleans, numbers, strings, then composites.
fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}
