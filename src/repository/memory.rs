//! In-process collection with the same key scheme as MongoDB.
//!
//! Used by tests and local runs. It counts every call that reaches it and can
//! be told to fail or stall, which makes validation precedence, error mapping,
//! and cancellation observable.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;
use thiserror::Error;

use super::identifier::ObjectIdCodec;
use super::store::{DocumentCollection, DocumentStoreRepository};
use crate::errors::BoxError;

#[derive(Debug, Error)]
#[error("memory store unavailable: {0}")]
pub struct MemoryStoreError(pub String);

#[derive(Debug, Default)]
pub struct MemoryCollection {
    records: Mutex<HashMap<ObjectId, String>>,
    calls: AtomicUsize,
    failure: Mutex<Option<String>>,
    latency: Mutex<Option<Duration>>,
}

pub type MemoryTextRepository = DocumentStoreRepository<Arc<MemoryCollection>, ObjectIdCodec>;

impl MemoryTextRepository {
    #[must_use]
    pub fn in_memory(collection: Arc<MemoryCollection>) -> Self {
        DocumentStoreRepository::new(collection, ObjectIdCodec)
    }
}

impl MemoryCollection {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of calls that reached the collection.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every subsequent call fails with `message` until [`Self::recover`].
    pub fn fail_with(&self, message: impl Into<String>) {
        *self.failure.lock().unwrap_or_else(PoisonError::into_inner) = Some(message.into());
    }

    pub fn recover(&self) {
        *self.failure.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// Delays every subsequent call by `latency`.
    pub fn set_latency(&self, latency: Option<Duration>) {
        *self.latency.lock().unwrap_or_else(PoisonError::into_inner) = latency;
    }

    async fn enter(&self) -> Result<(), BoxError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let latency = *self.latency.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }

        let failure = self
            .failure
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        match failure {
            Some(message) => Err(MemoryStoreError(message).into()),
            None => Ok(()),
        }
    }

    fn records(&self) -> std::sync::MutexGuard<'_, HashMap<ObjectId, String>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl DocumentCollection for MemoryCollection {
    type Key = ObjectId;

    async fn insert_text(&self, text: &str) -> Result<ObjectId, BoxError> {
        self.enter().await?;
        let key = ObjectId::new();
        self.records().insert(key, text.to_string());
        Ok(key)
    }

    async fn find_text(&self, key: &ObjectId) -> Result<Option<String>, BoxError> {
        self.enter().await?;
        Ok(self.records().get(key).cloned())
    }

    async fn update_text(&self, key: &ObjectId, text: &str) -> Result<u64, BoxError> {
        self.enter().await?;
        match self.records().get_mut(key) {
            Some(existing) => {
                *existing = text.to_string();
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn delete_key(&self, key: &ObjectId) -> Result<u64, BoxError> {
        self.enter().await?;
        Ok(u64::from(self.records().remove(key).is_some()))
    }
}
