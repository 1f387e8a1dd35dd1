//! In-memory Document Store for testing.
//!
//! HashMap-backed implementation of the `DocumentStore` port with monotonic
//! version tokens, so unit and integration tests can exercise the
//! optimistic-concurrency path without a network.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::ports::{Document, DocumentStore, DocumentVersion, StoreError};

#[derive(Debug, Clone)]
struct StoredEntry {
    value: serde_json::Value,
    version: u64,
}

/// In-memory store for tests. Versions count up per document.
#[derive(Debug, Default)]
pub struct InMemoryDocumentStore {
    documents: Mutex<HashMap<String, StoredEntry>>,
    failing_writes: Mutex<HashSet<String>>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a document, assigning it version 1.
    pub fn with_document(self, name: &str, value: serde_json::Value) -> Self {
        self.documents
            .lock()
            .unwrap()
            .insert(name.to_string(), StoredEntry { value, version: 1 });
        self
    }

    /// Scripts every write to `name` to fail with a network error, so tests
    /// can exercise the persistence-failure path.
    pub fn with_write_failure(self, name: &str) -> Self {
        self.failing_writes.lock().unwrap().insert(name.to_string());
        self
    }

    /// Direct snapshot of a stored value, for assertions.
    pub fn value_of(&self, name: &str) -> Option<serde_json::Value> {
        self.documents
            .lock()
            .unwrap()
            .get(name)
            .map(|entry| entry.value.clone())
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn read(&self, name: &str) -> Result<Document, StoreError> {
        let documents = self.documents.lock().unwrap();
        Ok(match documents.get(name) {
            None => Document::missing(),
            Some(entry) => Document {
                value: Some(entry.value.clone()),
                version: Some(DocumentVersion::new(entry.version.to_string())),
            },
        })
    }

    async fn write(
        &self,
        name: &str,
        value: serde_json::Value,
        expected_version: Option<&DocumentVersion>,
    ) -> Result<DocumentVersion, StoreError> {
        if self.failing_writes.lock().unwrap().contains(name) {
            return Err(StoreError::network(format!(
                "scripted write failure for '{name}'"
            )));
        }

        let mut documents = self.documents.lock().unwrap();

        let current = documents.get(name).map(|entry| entry.version);
        let expected = expected_version
            .map(|v| {
                v.as_str()
                    .parse::<u64>()
                    .map_err(|_| StoreError::malformed(format!("bad version token '{}'", v.as_str())))
            })
            .transpose()?;

        if current != expected {
            return Err(StoreError::version_conflict(name));
        }

        let next = current.unwrap_or(0) + 1;
        documents.insert(name.to_string(), StoredEntry { value, version: next });
        Ok(DocumentVersion::new(next.to_string()))
    }
}
