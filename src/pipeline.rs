// src/pipeline.rs
//! Consume -> transform -> index loop, and its pairing with the shutdown
//! coordinator.

use async_trait::async_trait;
use metrics::{counter, gauge};
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;

use crate::demux::{self, StreamHandler};
use crate::document;
use crate::error::{Error, Result};
use crate::identity::IdentityAllocator;
use crate::index::IndexSink;
use crate::shutdown::ShutdownCoordinator;
use crate::stream::{EventKind, Events, Post, StreamHandle};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamEnd {
    /// `stop()` was called.
    Stopped,
    /// The sequence ran dry on its own: the connection is gone.
    Disconnected,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub indexed: u64,
    pub ignored: u64,
    pub ended: StreamEnd,
}

struct Indexer<S: ?Sized> {
    sink: Arc<S>,
    ids: IdentityAllocator,
    ignored: u64,
}

#[async_trait]
impl<S> StreamHandler for Indexer<S>
where
    S: IndexSink + ?Sized,
{
    async fn on_post(&mut self, post: Post) -> Result<()> {
        counter!("stream_posts_total").increment(1);
        let doc = document::build(&post);
        let id = self.ids.next();
        self.sink.put(id, &doc).await?;
        gauge!("pipeline_last_document_id").set(id.get() as f64);
        tracing::debug!(target: "pipeline", %id, user = %doc.user, "post indexed");
        Ok(())
    }

    fn on_other(&mut self, kind: EventKind, payload: &Value) {
        counter!("stream_other_events_total", "kind" => kind.as_str()).increment(1);
        self.ignored += 1;
        if kind == EventKind::StreamDisconnect {
            tracing::warn!(target: "pipeline", %payload, "remote announced disconnect");
        }
    }
}

/// Drain `events` into `sink`, one post at a time. The first failed write
/// ends the run; that document is not sent again.
pub async fn run<S>(mut events: Events, sink: Arc<S>) -> Result<RunSummary>
where
    S: IndexSink + ?Sized,
{
    crate::metrics::ensure_described();
    let mut indexer = Indexer {
        sink,
        ids: IdentityAllocator::new(),
        ignored: 0,
    };

    while let Some(event) = events.next().await {
        if let Err(e) = demux::dispatch(event, &mut indexer).await {
            tracing::error!(
                target: "pipeline",
                error = %e,
                sink = indexer.sink.name(),
                indexed = indexer.ids.allocated().saturating_sub(1),
                "index write failed, aborting"
            );
            return Err(e);
        }
    }

    let ended = if events.is_stopped() {
        StreamEnd::Stopped
    } else {
        StreamEnd::Disconnected
    };
    let summary = RunSummary {
        indexed: indexer.ids.allocated(),
        ignored: indexer.ignored,
        ended,
    };
    tracing::info!(
        target: "pipeline",
        indexed = summary.indexed,
        ignored = summary.ignored,
        ended = ?summary.ended,
        "event stream finished"
    );
    Ok(summary)
}

/// Run the consumer on its own task while waiting for `signal`. On signal the
/// stream is stopped once and the consumer is awaited with no timeout. If the
/// consumer finishes first, the stream handle is dropped with the coordinator.
pub async fn run_until_shutdown<S, F>(
    mut handle: StreamHandle,
    sink: Arc<S>,
    signal: F,
) -> Result<RunSummary>
where
    S: IndexSink + ?Sized + 'static,
    F: Future<Output = ()>,
{
    let events = handle
        .events()
        .ok_or_else(|| Error::Startup("event sequence already taken".into()))?;
    let mut consumer = tokio::spawn(run(events, sink));
    let mut coordinator = ShutdownCoordinator::new(handle);

    let finished_first = tokio::select! {
        _ = coordinator.run(signal) => None,
        joined = &mut consumer => Some(joined),
    };
    let joined = match finished_first {
        Some(joined) => {
            drop(coordinator);
            joined
        }
        None => consumer.await,
    };
    joined?
}
