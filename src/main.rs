//! firehose-indexer: binary entrypoint.
//! Loads credentials, waits for the document store, makes sure the index
//! exists, opens the sample stream and indexes posts until SIGINT/SIGTERM.

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use firehose_indexer::config::{Credentials, Settings};
use firehose_indexer::index::ElasticSink;
use firehose_indexer::shutdown::shutdown_signal;
use firehose_indexer::stream::{self, oauth::OAuthSigner, StreamParams};
use firehose_indexer::{Error, StreamEnd};

/// Compact text logs by default, JSON lines with `LOG_FORMAT=json`.
fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer().compact()).init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();

    let settings =
        Settings::from_env_and_args(std::env::args().skip(1)).context("resolving settings")?;
    init_tracing(settings.log_json);

    if let Some(addr) = settings.metrics_addr {
        firehose_indexer::metrics::install_exporter(addr)?;
    }

    let credentials = Credentials::load_from_file(&settings.credentials_path)
        .context("loading stream credentials")?;
    tracing::info!(path = %settings.credentials_path.display(), "credentials loaded");

    // --- Document store ---
    let sink = ElasticSink::new(&settings.es_url, settings.index_target.clone())?;
    sink.wait_until_ready(settings.ready_attempts, settings.ready_delay)
        .await
        .context("waiting for document store")?;
    sink.ensure_index().await.context("preparing index")?;

    // --- Stream ---
    let client = reqwest::Client::new();
    let signer = OAuthSigner::from(&credentials);
    let params = StreamParams {
        url: settings.stream_url.clone(),
        ..StreamParams::default()
    };
    let handle = stream::open(&client, &signer, &params)
        .await
        .context("opening sample stream")?;

    let summary =
        firehose_indexer::run_until_shutdown(handle, Arc::new(sink), shutdown_signal()).await?;
    tracing::info!(indexed = summary.indexed, ignored = summary.ignored, "shut down");

    if summary.ended == StreamEnd::Disconnected {
        return Err(Error::StreamEnded.into());
    }
    Ok(())
}
