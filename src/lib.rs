// src/lib.rs
//! Sample-stream ingestion: posts arrive over one long-lived streaming
//! connection, become storage documents, and are written to the index under
//! per-run sequential ids.
//!
//! Flow: [`stream`] -> [`demux`] -> [`document`] -> [`identity`] -> [`index`],
//! with [`shutdown`] stopping the stream on SIGINT/SIGTERM.

pub mod config;
pub mod demux;
pub mod document;
pub mod error;
pub mod identity;
pub mod index;
pub mod metrics;
pub mod pipeline;
pub mod shutdown;
pub mod stream;

// ---- Re-exports for stable public API ----
pub use crate::error::{Error, Result};
pub use crate::pipeline::{run_until_shutdown, RunSummary, StreamEnd};
