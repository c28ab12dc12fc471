//! In-process implementation of RecordStore

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::errors::DomainResult;

use super::r#trait::{RecordStore, Revision, Stored};

struct Inner<R> {
    records: HashMap<String, Stored<R>>,
    next_revision: Revision,
}

impl<R> Inner<R> {
    fn bump(&mut self) -> Revision {
        self.next_revision += 1;
        self.next_revision
    }
}

/// Record store backed by a map behind an async `RwLock`
///
/// Suitable for tests and single-process deployments. Clones share the
/// same underlying map.
pub struct InMemoryRecordStore<R> {
    inner: Arc<RwLock<Inner<R>>>,
}

impl<R> InMemoryRecordStore<R> {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(Inner {
                records: HashMap::new(),
                next_revision: 0,
            })),
        }
    }

    /// Number of records currently held
    pub async fn len(&self) -> usize {
        self.inner.read().await.records.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Stored keys, sorted
    pub async fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.inner.read().await.records.keys().cloned().collect();
        keys.sort();
        keys
    }
}

impl<R> Default for InMemoryRecordStore<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> Clone for InMemoryRecordStore<R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

#[async_trait]
impl<R> RecordStore<R> for InMemoryRecordStore<R>
where
    R: Clone + Send + Sync + 'static,
{
    async fn get(&self, key: &str) -> DomainResult<Option<Stored<R>>> {
        let inner = self.inner.read().await;
        Ok(inner.records.get(key).cloned())
    }

    async fn put(&self, key: &str, record: &R) -> DomainResult<Revision> {
        let mut inner = self.inner.write().await;
        let revision = inner.bump();
        inner.records.insert(
            key.to_string(),
            Stored {
                value: record.clone(),
                revision,
            },
        );
        Ok(revision)
    }

    async fn delete(&self, key: &str) -> DomainResult<bool> {
        let mut inner = self.inner.write().await;
        Ok(inner.records.remove(key).is_some())
    }

    async fn compare_and_swap(
        &self,
        key: &str,
        expected: Option<Revision>,
        next: Option<&R>,
    ) -> DomainResult<bool> {
        let mut inner = self.inner.write().await;

        let current = inner.records.get(key).map(|stored| stored.revision);
        if current != expected {
            return Ok(false);
        }

        match next {
            Some(record) => {
                let revision = inner.bump();
                inner.records.insert(
                    key.to_string(),
                    Stored {
                        value: record.clone(),
                        revision,
                    },
                );
            }
            None => {
                inner.records.remove(key);
            }
        }
        Ok(true)
    }
}
