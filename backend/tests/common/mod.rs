#![allow(dead_code)]

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use campus_admin::store::{CollectionPath, Document, DocumentStore, Fields, MemoryDocumentStore, OrderBy, StoreError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    List(String),
    Get(String, String),
    Create(String),
    Merge(String, String),
    Overwrite(String, String),
    Delete(String, String),
}

impl Call {
    pub fn is_write(&self) -> bool {
        !matches!(self, Call::List(_) | Call::Get(..))
    }
}

/// Wraps the in-memory store, logging every call and failing on demand.
#[derive(Default)]
pub struct RecordingStore {
    inner: MemoryDocumentStore,
    calls: Mutex<Vec<Call>>,
    writes: AtomicUsize,
    fail_writes_from: Mutex<Option<usize>>,
    fail_reads: AtomicBool,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The wrapped store, for seeding data without logging it.
    pub fn inner(&self) -> &MemoryDocumentStore {
        &self.inner
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn writes(&self) -> Vec<Call> {
        self.calls().into_iter().filter(Call::is_write).collect()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    /// Lets `n` more writes through, then fails every write after them.
    pub fn fail_writes_after(&self, n: usize) {
        let seen = self.writes.load(Ordering::SeqCst);
        *self.fail_writes_from.lock().unwrap() = Some(seen + n);
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    fn record(&self, call: Call) -> Result<(), StoreError> {
        let is_write = call.is_write();
        self.calls.lock().unwrap().push(call);

        if is_write {
            let index = self.writes.fetch_add(1, Ordering::SeqCst);
            if self.fail_writes_from.lock().unwrap().is_some_and(|from| index >= from) {
                return Err(injected());
            }
        } else if self.fail_reads.load(Ordering::SeqCst) {
            return Err(injected());
        }
        Ok(())
    }
}

fn injected() -> StoreError {
    StoreError::Api {
        status: 503,
        body: "injected failure".to_string(),
    }
}

#[async_trait]
impl DocumentStore for RecordingStore {
    async fn list_all(
        &self,
        collection: &CollectionPath,
        order: Option<&OrderBy>,
    ) -> Result<Vec<Document>, StoreError> {
        self.record(Call::List(collection.to_string()))?;
        self.inner.list_all(collection, order).await
    }

    async fn get_one(&self, collection: &CollectionPath, key: &str) -> Result<Option<Fields>, StoreError> {
        self.record(Call::Get(collection.to_string(), key.to_string()))?;
        self.inner.get_one(collection, key).await
    }

    async fn create(&self, collection: &CollectionPath, fields: Fields) -> Result<String, StoreError> {
        self.record(Call::Create(collection.to_string()))?;
        self.inner.create(collection, fields).await
    }

    async fn merge_update(&self, collection: &CollectionPath, key: &str, fields: Fields) -> Result<(), StoreError> {
        self.record(Call::Merge(collection.to_string(), key.to_string()))?;
        self.inner.merge_update(collection, key, fields).await
    }

    async fn overwrite(&self, collection: &CollectionPath, key: &str, fields: Fields) -> Result<(), StoreError> {
        self.record(Call::Overwrite(collection.to_string(), key.to_string()))?;
        self.inner.overwrite(collection, key, fields).await
    }

    async fn delete(&self, collection: &CollectionPath, key: &str) -> Result<(), StoreError> {
        self.record(Call::Delete(collection.to_string(), key.to_string()))?;
        self.inner.delete(collection, key).await
    }
}

pub fn fields(value: serde_json::Value) -> Fields {
    value.as_object().cloned().unwrap_or_default()
}
