use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Whether a record has been given a key by the document store yet.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "key", rename_all = "snake_case")]
pub enum Identity {
    Persisted(String),
    Draft(Uuid),
}

impl Identity {
    pub fn draft() -> Self {
        Identity::Draft(Uuid::new_v4())
    }

    pub fn persisted_key(&self) -> Option<&str> {
        match self {
            Identity::Persisted(key) => Some(key),
            Identity::Draft(_) => None,
        }
    }

    pub fn is_draft(&self) -> bool {
        matches!(self, Identity::Draft(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn serializes_as_tagged_value() {
        let persisted = serde_json::to_value(Identity::Persisted("abc123".to_string())).unwrap();
        assert_eq!(persisted, json!({ "kind": "persisted", "key": "abc123" }));

        let draft: Identity = serde_json::from_value(json!({
            "kind": "draft",
            "key": "67e55044-10b1-426f-9247-bb680e5fe0c8"
        }))
        .unwrap();
        assert!(draft.is_draft());
        assert_eq!(draft.persisted_key(), None);
    }

    #[test]
    fn fresh_drafts_are_distinct() {
        assert_ne!(Identity::draft(), Identity::draft());
    }
}
