// src/metrics.rs
use metrics::{describe_counter, describe_gauge};
use metrics_exporter_prometheus::PrometheusBuilder;
use once_cell::sync::OnceCell;
use std::net::SocketAddr;

use crate::error::{Error, Result};

/// One-time metrics registration (so series show up on the scrape endpoint).
pub fn ensure_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("stream_events_total", "Frames decoded from the stream.");
        describe_counter!("stream_posts_total", "Post events handed to the indexer.");
        describe_counter!(
            "stream_other_events_total",
            "Non-post events ignored by the demultiplexer, by kind."
        );
        describe_counter!("index_writes_total", "Documents accepted by the store.");
        describe_counter!("index_write_errors_total", "Failed document writes.");
        describe_gauge!(
            "pipeline_last_document_id",
            "Id of the most recently indexed document."
        );
    });
}

/// Install the Prometheus recorder with its own scrape listener on `addr`.
/// Must run inside the tokio runtime.
pub fn install_exporter(addr: SocketAddr) -> Result<()> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| Error::Startup(format!("metrics exporter on {addr}: {e}")))?;
    ensure_described();
    tracing::info!(%addr, "metrics exporter listening");
    Ok(())
}
