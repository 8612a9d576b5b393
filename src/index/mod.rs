// src/index/mod.rs
pub mod elastic;
pub mod mapping;

use async_trait::async_trait;
use std::sync::Mutex;

use crate::document::StorageDocument;
use crate::error::{Error, Result};
use crate::identity::DocumentId;

pub use elastic::{ElasticSink, IndexTarget};

/// Persists one document under one id. A failed `put` is final: callers
/// abort instead of retrying.
#[async_trait]
pub trait IndexSink: Send + Sync {
    async fn put(&self, id: DocumentId, doc: &StorageDocument) -> Result<()>;
    fn name(&self) -> &'static str;
}

/// In-memory sink that records every call; can be told to fail at one id.
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub stored: Mutex<Vec<(DocumentId, StorageDocument)>>,
    pub attempts: Mutex<Vec<DocumentId>>,
    fail_at: Option<DocumentId>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_at(id: DocumentId) -> Self {
        Self {
            fail_at: Some(id),
            ..Self::default()
        }
    }

    pub fn stored(&self) -> Vec<(DocumentId, StorageDocument)> {
        self.stored.lock().unwrap().clone()
    }

    pub fn attempts(&self) -> Vec<DocumentId> {
        self.attempts.lock().unwrap().clone()
    }
}

#[async_trait]
impl IndexSink for RecordingSink {
    async fn put(&self, id: DocumentId, doc: &StorageDocument) -> Result<()> {
        self.attempts.lock().unwrap().push(id);
        if self.fail_at == Some(id) {
            return Err(Error::index_write(id, "injected write failure"));
        }
        self.stored.lock().unwrap().push((id, doc.clone()));
        Ok(())
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}
