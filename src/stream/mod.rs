// src/stream/mod.rs
//! Event source: one long-lived streaming connection to the sample endpoint.
//!
//! `open` authenticates and starts a reader task that frames the HTTP body
//! into [`RawEvent`]s. The consumer pulls them through [`Events`]; the
//! shutdown path calls [`StreamHandle::stop`] once. After `stop` returns the
//! sequence is inert: nothing more is yielded, buffered events included.

pub mod frame;
pub mod oauth;
pub mod types;

use futures_util::StreamExt;
use metrics::counter;
use reqwest::Url;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::error::{Error, Result};
use crate::stream::frame::FrameDecoder;
use crate::stream::oauth::OAuthSigner;
pub use crate::stream::types::{Coordinates, EventKind, Post, RawEvent};

pub const DEFAULT_STREAM_URL: &str = "https://stream.twitter.com/1.1/statuses/sample.json";
const DEFAULT_BUFFER: usize = 1024;

#[derive(Debug, Clone)]
pub struct StreamParams {
    pub url: String,
    /// Ask the remote side for keep-alive stall warnings.
    pub stall_warnings: bool,
    /// Events buffered between the reader task and the consumer.
    pub buffer: usize,
}

impl Default for StreamParams {
    fn default() -> Self {
        Self {
            url: DEFAULT_STREAM_URL.to_string(),
            stall_warnings: true,
            buffer: DEFAULT_BUFFER,
        }
    }
}

/// Owns the connection (via the reader task) and its stop signal.
#[derive(Debug)]
pub struct StreamHandle {
    stop_tx: watch::Sender<bool>,
    reader: Option<JoinHandle<()>>,
    events: Option<Events>,
}

/// Consumer side of the stream. Lazy, unbounded, non-restartable.
#[derive(Debug)]
pub struct Events {
    rx: mpsc::Receiver<RawEvent>,
    stopped: watch::Receiver<bool>,
}

/// Open the stream. Network, auth or non-2xx failures are fatal here.
pub async fn open(
    client: &reqwest::Client,
    signer: &OAuthSigner,
    params: &StreamParams,
) -> Result<StreamHandle> {
    let mut url = Url::parse(&params.url)
        .map_err(|e| Error::Config(format!("invalid stream url {}: {e}", params.url)))?;
    if params.stall_warnings {
        url.query_pairs_mut().append_pair("stall_warnings", "true");
    }

    let auth = signer.authorization("GET", &url);
    let resp = client
        .get(url.clone())
        .header(reqwest::header::AUTHORIZATION, auth)
        .send()
        .await
        .map_err(|e| Error::Startup(format!("connecting to {url}: {e}")))?;

    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(Error::Startup(format!(
            "stream endpoint answered {status}: {}",
            body.trim()
        )));
    }
    tracing::info!(target: "stream", %url, "stream connected");

    let (tx, rx) = mpsc::channel(params.buffer.max(1));
    let (stop_tx, stop_rx) = watch::channel(false);
    let reader = tokio::spawn(read_body(resp.bytes_stream(), tx, stop_rx.clone()));

    Ok(StreamHandle {
        stop_tx,
        reader: Some(reader),
        events: Some(Events {
            rx,
            stopped: stop_rx,
        }),
    })
}

impl StreamHandle {
    /// Handle without a network connection, fed through the returned sender.
    /// Dropping the sender ends the sequence like a remote close.
    pub fn from_channel(capacity: usize) -> (Self, mpsc::Sender<RawEvent>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let (stop_tx, stop_rx) = watch::channel(false);
        let handle = Self {
            stop_tx,
            reader: None,
            events: Some(Events {
                rx,
                stopped: stop_rx,
            }),
        };
        (handle, tx)
    }

    /// Take the event sequence. Returns `None` once it has been taken.
    pub fn events(&mut self) -> Option<Events> {
        self.events.take()
    }

    /// Close the connection and end the sequence. Consumes the handle, so it
    /// can only happen once.
    pub async fn stop(mut self) {
        let _ = self.stop_tx.send(true);
        if let Some(reader) = self.reader.take() {
            reader.abort();
            let _ = reader.await;
        }
        tracing::info!(target: "stream", "stream stopped");
    }
}

impl Drop for StreamHandle {
    fn drop(&mut self) {
        let _ = self.stop_tx.send(true);
        if let Some(reader) = self.reader.take() {
            reader.abort();
        }
    }
}

impl Events {
    /// Next event, waiting while none is available. `None` means the
    /// sequence is over: stopped, or the connection went away.
    pub async fn next(&mut self) -> Option<RawEvent> {
        if *self.stopped.borrow() {
            return None;
        }
        tokio::select! {
            biased;
            _ = self.stopped.changed() => None,
            ev = self.rx.recv() => ev,
        }
    }

    /// Whether the sequence ended because of a stop request.
    pub fn is_stopped(&self) -> bool {
        *self.stopped.borrow()
    }
}

async fn read_body<S, B>(body: S, tx: mpsc::Sender<RawEvent>, mut stop: watch::Receiver<bool>)
where
    S: futures_util::Stream<Item = reqwest::Result<B>>,
    B: AsRef<[u8]>,
{
    let mut body = std::pin::pin!(body);
    let mut decoder = FrameDecoder::default();
    loop {
        let chunk = tokio::select! {
            _ = stop.changed() => return,
            chunk = body.next() => chunk,
        };
        match chunk {
            Some(Ok(bytes)) => {
                decoder.extend(bytes.as_ref());
                while let Some(frame) = decoder.next_frame() {
                    let ev = RawEvent::decode(&frame);
                    counter!("stream_events_total").increment(1);
                    tokio::select! {
                        _ = stop.changed() => return,
                        sent = tx.send(ev) => if sent.is_err() { return },
                    }
                }
            }
            Some(Err(e)) => {
                tracing::warn!(target: "stream", error = %e, "stream delivery failed");
                return;
            }
            None => {
                tracing::warn!(target: "stream", pending = decoder.pending(), "stream closed by remote");
                return;
            }
        }
    }
}
