// tests/pipeline_e2e.rs
use std::sync::Arc;
use std::time::Duration;

use firehose_indexer::document::StorageDocument;
use firehose_indexer::identity::DocumentId;
use firehose_indexer::index::RecordingSink;
use firehose_indexer::pipeline::{self, StreamEnd};
use firehose_indexer::stream::{Coordinates, EventKind, Post, RawEvent, StreamHandle};
use firehose_indexer::Error;
use serde_json::json;
use tokio::sync::oneshot;

fn post(author: &str, text: &str, retweets: u64, coords: Option<(f64, f64)>) -> RawEvent {
    RawEvent::Post(Post {
        author: author.to_string(),
        text: text.to_string(),
        retweet_count: retweets,
        lang: None,
        coordinates: coords.map(|(lat, lon)| Coordinates { lat, lon }),
    })
}

fn other(kind: EventKind) -> RawEvent {
    RawEvent::Other {
        kind,
        payload: json!({}),
    }
}

async fn wait_for_stored(sink: &RecordingSink, n: usize) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while sink.stored().len() < n {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("sink never caught up");
}

#[tokio::test]
async fn three_posts_become_three_puts_with_ids_0_1_2() {
    let (mut handle, tx) = StreamHandle::from_channel(8);
    let events = handle.events().unwrap();

    tx.send(post("alice", "at city hall", 0, Some((40.7128, -74.006))))
        .await
        .unwrap();
    tx.send(post("bob", "just words", 0, None)).await.unwrap();
    tx.send(post("carol", "popular", 500, None)).await.unwrap();
    drop(tx);

    let sink = Arc::new(RecordingSink::new());
    let summary = pipeline::run(events, sink.clone()).await.unwrap();

    assert_eq!(summary.indexed, 3);
    assert_eq!(summary.ended, StreamEnd::Disconnected);

    let stored = sink.stored();
    let ids: Vec<u64> = stored.iter().map(|(id, _)| id.get()).collect();
    assert_eq!(ids, vec![0, 1, 2]);

    assert_eq!(
        stored[0].1,
        StorageDocument {
            user: "alice".into(),
            message: "at city hall".into(),
            retweets: 0,
            location: Some("-74.006000, 40.712800".into()),
            ..StorageDocument::default()
        }
    );
    assert_eq!(
        stored[1].1,
        StorageDocument {
            user: "bob".into(),
            message: "just words".into(),
            ..StorageDocument::default()
        }
    );
    assert_eq!(stored[2].1.retweets, 500);
    assert_eq!(stored[2].1.user, "carol");
    drop(handle);
}

#[tokio::test]
async fn other_events_never_reach_the_sink_or_consume_ids() {
    let (mut handle, tx) = StreamHandle::from_channel(16);
    let events = handle.events().unwrap();

    tx.send(other(EventKind::StallWarning)).await.unwrap();
    tx.send(post("a", "first", 0, None)).await.unwrap();
    tx.send(other(EventKind::StatusDeletion)).await.unwrap();
    tx.send(other(EventKind::StreamLimit)).await.unwrap();
    tx.send(post("b", "second", 0, None)).await.unwrap();
    tx.send(other(EventKind::Unknown)).await.unwrap();
    drop(tx);

    let sink = Arc::new(RecordingSink::new());
    let summary = pipeline::run(events, sink.clone()).await.unwrap();

    assert_eq!(summary.indexed, 2);
    assert_eq!(summary.ignored, 4);
    assert_eq!(sink.attempts(), vec![DocumentId::new(0), DocumentId::new(1)]);
    drop(handle);
}

#[tokio::test]
async fn failed_write_aborts_without_resending() {
    let (mut handle, tx) = StreamHandle::from_channel(8);
    let events = handle.events().unwrap();
    for t in ["one", "two", "three"] {
        tx.send(post("a", t, 0, None)).await.unwrap();
    }
    drop(tx);

    let sink = Arc::new(RecordingSink::failing_at(DocumentId::new(1)));
    let err = pipeline::run(events, sink.clone()).await.unwrap_err();

    match err {
        Error::IndexWrite { id, .. } => assert_eq!(id, DocumentId::new(1)),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(sink.attempts(), vec![DocumentId::new(0), DocumentId::new(1)]);
    assert_eq!(sink.stored().len(), 1);
    drop(handle);
}

#[tokio::test]
async fn signal_stops_stream_and_drains_consumer() {
    let (handle, tx) = StreamHandle::from_channel(8);
    let sink = Arc::new(RecordingSink::new());
    let (fire, signal) = oneshot::channel::<()>();

    let run = tokio::spawn(firehose_indexer::run_until_shutdown(
        handle,
        sink.clone(),
        async move {
            let _ = signal.await;
        },
    ));

    tx.send(post("a", "x", 0, None)).await.unwrap();
    tx.send(post("a", "y", 0, None)).await.unwrap();
    wait_for_stored(&sink, 2).await;

    fire.send(()).unwrap();
    let summary = run.await.unwrap().unwrap();
    assert_eq!(summary.ended, StreamEnd::Stopped);
    assert_eq!(summary.indexed, 2);

    // consumer is gone: nothing more can be fed in
    assert!(tx.send(post("a", "late", 0, None)).await.is_err());
    assert_eq!(sink.stored().len(), 2);
}

#[tokio::test]
async fn disconnection_finishes_without_a_signal() {
    let (handle, tx) = StreamHandle::from_channel(8);
    let sink = Arc::new(RecordingSink::new());
    tx.send(post("a", "only", 0, None)).await.unwrap();
    drop(tx);

    let summary = firehose_indexer::run_until_shutdown(handle, sink, std::future::pending())
        .await
        .unwrap();
    assert_eq!(summary.ended, StreamEnd::Disconnected);
    assert_eq!(summary.indexed, 1);
}

#[tokio::test]
async fn write_failure_surfaces_from_the_supervised_run() {
    let (handle, tx) = StreamHandle::from_channel(8);
    let sink = Arc::new(RecordingSink::failing_at(DocumentId::new(0)));
    tx.send(post("a", "doomed", 0, None)).await.unwrap();
    tx.send(post("a", "never", 0, None)).await.unwrap();

    let res =
        firehose_indexer::run_until_shutdown(handle, sink.clone(), std::future::pending()).await;
    assert!(matches!(res, Err(Error::IndexWrite { .. })));
    assert_eq!(sink.attempts(), vec![DocumentId::new(0)]);
    drop(tx);
}
