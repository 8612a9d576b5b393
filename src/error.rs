// src/error.rs
//! Error taxonomy for the ingestion pipeline.
//!
//! No component recovers locally: every variant either aborts the run or,
//! for [`Error::StreamEnded`], reports that no more events will arrive.

use crate::identity::DocumentId;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Credentials or settings missing/malformed.
    #[error("configuration error: {0}")]
    Config(String),

    /// Connection or authentication failure before the consume loop starts.
    #[error("startup failed: {0}")]
    Startup(String),

    /// The event sequence ended without a stop request.
    #[error("event stream ended unexpectedly")]
    StreamEnded,

    /// The document store refused or never received a write.
    #[error("index write failed for document {id}: {source}")]
    IndexWrite {
        id: DocumentId,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The consumer task panicked or was cancelled.
    #[error("pipeline task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl Error {
    pub fn index_write<E>(id: DocumentId, source: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Self::IndexWrite {
            id,
            source: source.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
