use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{CollectionPath, Document, DocumentStore, Fields, OrderBy, StoreError, apply_order};

#[derive(Debug)]
struct Entry {
    seq: u64,
    fields: Fields,
}

/// Process-local store. Listing without an order returns documents in
/// insertion order.
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    collections: RwLock<HashMap<CollectionPath, BTreeMap<String, Entry>>>,
    next_seq: AtomicU64,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_seq(&self) -> u64 {
        self.next_seq.fetch_add(1, Ordering::Relaxed)
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn list_all(
        &self,
        collection: &CollectionPath,
        order: Option<&OrderBy>,
    ) -> Result<Vec<Document>, StoreError> {
        let collections = self.collections.read().await;
        let mut entries: Vec<(&String, &Entry)> = collections
            .get(collection)
            .map(|docs| docs.iter().collect())
            .unwrap_or_default();
        entries.sort_by_key(|(_, entry)| entry.seq);

        let docs = entries
            .into_iter()
            .map(|(key, entry)| Document {
                key: key.clone(),
                fields: entry.fields.clone(),
            })
            .collect();

        Ok(match order {
            Some(order) => apply_order(docs, order),
            None => docs,
        })
    }

    async fn get_one(&self, collection: &CollectionPath, key: &str) -> Result<Option<Fields>, StoreError> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .and_then(|docs| docs.get(key))
            .map(|entry| entry.fields.clone()))
    }

    async fn create(&self, collection: &CollectionPath, fields: Fields) -> Result<String, StoreError> {
        let key = Uuid::new_v4().simple().to_string();
        let seq = self.next_seq();
        let mut collections = self.collections.write().await;
        collections
            .entry(collection.clone())
            .or_default()
            .insert(key.clone(), Entry { seq, fields });
        Ok(key)
    }

    async fn merge_update(&self, collection: &CollectionPath, key: &str, fields: Fields) -> Result<(), StoreError> {
        let seq = self.next_seq();
        let mut collections = self.collections.write().await;
        let entry = collections
            .entry(collection.clone())
            .or_default()
            .entry(key.to_string())
            .or_insert_with(|| Entry {
                seq,
                fields: Fields::new(),
            });
        entry.fields.extend(fields);
        Ok(())
    }

    async fn overwrite(&self, collection: &CollectionPath, key: &str, fields: Fields) -> Result<(), StoreError> {
        let seq = self.next_seq();
        let mut collections = self.collections.write().await;
        let docs = collections.entry(collection.clone()).or_default();
        match docs.get_mut(key) {
            Some(entry) => entry.fields = fields,
            None => {
                docs.insert(key.to_string(), Entry { seq, fields });
            }
        }
        Ok(())
    }

    async fn delete(&self, collection: &CollectionPath, key: &str) -> Result<(), StoreError> {
        let mut collections = self.collections.write().await;
        if let Some(docs) = collections.get_mut(collection) {
            docs.remove(key);
        }
        Ok(())
    }
}
