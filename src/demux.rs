// src/demux.rs
//! Routes each raw event to the handler for its kind.
//!
//! A [`StreamHandler`] is the handler table: one method per kind, with the
//! non-post kinds defaulting to no-ops.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;
use crate::stream::types::{EventKind, Post, RawEvent};

#[async_trait]
pub trait StreamHandler: Send {
    async fn on_post(&mut self, post: Post) -> Result<()>;

    /// Every non-post kind lands here. Ignored unless overridden.
    fn on_other(&mut self, _kind: EventKind, _payload: &Value) {}
}

/// Invoke the matching handler on the caller's task. Exactly one `on_post`
/// per post event, in arrival order.
pub async fn dispatch<H>(event: RawEvent, handler: &mut H) -> Result<()>
where
    H: StreamHandler + ?Sized,
{
    match event {
        RawEvent::Post(post) => handler.on_post(post).await,
        RawEvent::Other { kind, payload } => {
            handler.on_other(kind, &payload);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Tally {
        posts: Vec<String>,
        others: Vec<EventKind>,
    }

    #[async_trait]
    impl StreamHandler for Tally {
        async fn on_post(&mut self, post: Post) -> Result<()> {
            self.posts.push(post.text);
            Ok(())
        }

        fn on_other(&mut self, kind: EventKind, _payload: &Value) {
            self.others.push(kind);
        }
    }

    struct PostsOnly(usize);

    #[async_trait]
    impl StreamHandler for PostsOnly {
        async fn on_post(&mut self, _post: Post) -> Result<()> {
            self.0 += 1;
            Ok(())
        }
    }

    fn post(text: &str) -> RawEvent {
        RawEvent::Post(Post {
            author: "a".into(),
            text: text.into(),
            retweet_count: 0,
            lang: None,
            coordinates: None,
        })
    }

    #[tokio::test]
    async fn posts_keep_order_and_others_route_separately() {
        let mut h = Tally::default();
        let events = vec![
            post("1"),
            RawEvent::Other {
                kind: EventKind::StallWarning,
                payload: Value::Null,
            },
            post("2"),
            post("3"),
        ];
        for ev in events {
            dispatch(ev, &mut h).await.unwrap();
        }
        assert_eq!(h.posts, vec!["1", "2", "3"]);
        assert_eq!(h.others, vec![EventKind::StallWarning]);
    }

    #[tokio::test]
    async fn default_other_handler_is_a_noop() {
        let mut h = PostsOnly(0);
        dispatch(
            RawEvent::Other {
                kind: EventKind::StatusDeletion,
                payload: serde_json::json!({"delete": {}}),
            },
            &mut h,
        )
        .await
        .unwrap();
        assert_eq!(h.0, 0);
    }
}
