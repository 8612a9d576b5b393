// src/stream/types.rs
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// A geo-tagged position as carried by the post, in source order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Post {
    pub author: String,
    pub text: String,
    pub retweet_count: u64,
    pub lang: Option<String>,
    pub coordinates: Option<Coordinates>,
}

/// Message kinds the remote stream can emit. Only `Post` is indexed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Post,
    DirectMessage,
    StatusDeletion,
    LocationDeletion,
    StreamLimit,
    StatusWithheld,
    UserWithheld,
    StreamDisconnect,
    StallWarning,
    FriendsList,
    Event,
    Unknown,
}

impl EventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::Post => "post",
            EventKind::DirectMessage => "direct_message",
            EventKind::StatusDeletion => "status_deletion",
            EventKind::LocationDeletion => "location_deletion",
            EventKind::StreamLimit => "limit",
            EventKind::StatusWithheld => "status_withheld",
            EventKind::UserWithheld => "user_withheld",
            EventKind::StreamDisconnect => "disconnect",
            EventKind::StallWarning => "stall_warning",
            EventKind::FriendsList => "friends",
            EventKind::Event => "event",
            EventKind::Unknown => "unknown",
        }
    }
}

// First matching key wins; order matters because posts can embed other keys.
const KIND_KEYS: &[(&str, EventKind)] = &[
    ("retweet_count", EventKind::Post),
    ("direct_message", EventKind::DirectMessage),
    ("delete", EventKind::StatusDeletion),
    ("scrub_geo", EventKind::LocationDeletion),
    ("limit", EventKind::StreamLimit),
    ("status_withheld", EventKind::StatusWithheld),
    ("user_withheld", EventKind::UserWithheld),
    ("disconnect", EventKind::StreamDisconnect),
    ("warning", EventKind::StallWarning),
    ("friends", EventKind::FriendsList),
    ("event", EventKind::Event),
];

#[derive(Debug, Clone, PartialEq)]
pub enum RawEvent {
    Post(Post),
    Other { kind: EventKind, payload: Value },
}

impl RawEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            RawEvent::Post(_) => EventKind::Post,
            RawEvent::Other { kind, .. } => *kind,
        }
    }

    /// Decode one stream frame. Never fails: undecodable frames come back as
    /// `Other(Unknown)` carrying the raw text.
    pub fn decode(frame: &[u8]) -> Self {
        let value: Value = match serde_json::from_slice(frame) {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(target: "stream", error = %e, "undecodable frame");
                return RawEvent::Other {
                    kind: EventKind::Unknown,
                    payload: Value::String(String::from_utf8_lossy(frame).into_owned()),
                };
            }
        };

        let kind = value
            .as_object()
            .and_then(|obj| {
                KIND_KEYS
                    .iter()
                    .find(|(key, _)| obj.contains_key(*key))
                    .map(|(_, kind)| *kind)
            })
            .unwrap_or(EventKind::Unknown);

        if kind != EventKind::Post {
            return RawEvent::Other {
                kind,
                payload: value,
            };
        }

        match serde_json::from_value::<WirePost>(value.clone()) {
            Ok(wire) => RawEvent::Post(wire.into()),
            Err(e) => {
                tracing::warn!(target: "stream", error = %e, "post frame with unexpected shape");
                RawEvent::Other {
                    kind: EventKind::Unknown,
                    payload: value,
                }
            }
        }
    }
}

// Post fields routinely arrive as `null`; those read as their defaults.
fn null_as_default<'de, D, T>(de: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(de)?.unwrap_or_default())
}

#[derive(Debug, Deserialize)]
struct WirePost {
    #[serde(default, deserialize_with = "null_as_default")]
    text: String,
    #[serde(default, deserialize_with = "null_as_default")]
    retweet_count: u64,
    #[serde(default)]
    lang: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    user: WireUser,
    /// Kept loose: a malformed point drops the position, not the post.
    #[serde(default)]
    coordinates: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
struct WireUser {
    #[serde(default, deserialize_with = "null_as_default")]
    screen_name: String,
}

#[derive(Debug, Deserialize)]
struct WireCoordinates {
    coordinates: [f64; 2],
}

impl From<WirePost> for Post {
    fn from(w: WirePost) -> Self {
        let point = w
            .coordinates
            .and_then(|v| serde_json::from_value::<WireCoordinates>(v).ok());
        Post {
            author: w.user.screen_name,
            text: w.text,
            retweet_count: w.retweet_count,
            lang: w.lang.filter(|l| !l.is_empty()),
            // Positional pair read as (lat, lon); the document builder swaps it back.
            coordinates: point.map(|c| Coordinates {
                lat: c.coordinates[0],
                lon: c.coordinates[1],
            }),
        }
    }
}
