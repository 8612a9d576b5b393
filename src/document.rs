// src/document.rs
//! Storage documents and the post -> document transform.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::stream::types::{Coordinates, Post};

/// Completion-suggester input.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SuggestField {
    pub input: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<i32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StorageDocument {
    pub user: String,
    pub message: String,
    pub retweets: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// Serialized as "lon, lat", the geo_point string order of the index.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggest_field: Option<SuggestField>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

/// Pure transform. Text is stored as received; image/created/tags/country
/// and the suggest field stay empty.
pub fn build(post: &Post) -> StorageDocument {
    StorageDocument {
        user: post.author.clone(),
        message: post.text.clone(),
        retweets: post.retweet_count,
        language: post.lang.clone(),
        location: post.coordinates.map(format_location),
        ..StorageDocument::default()
    }
}

/// Swap to longitude-first, six decimals each.
pub fn format_location(c: Coordinates) -> String {
    format!("{:.6}, {:.6}", c.lon, c.lat)
}
