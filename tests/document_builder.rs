// tests/document_builder.rs
use firehose_indexer::document::{build, StorageDocument};
use firehose_indexer::stream::{Coordinates, Post};

fn post(coordinates: Option<Coordinates>) -> Post {
    Post {
        author: "reporter".to_string(),
        text: "Live from downtown".to_string(),
        retweet_count: 12,
        lang: Some("en".to_string()),
        coordinates,
    }
}

#[test]
fn coordinates_are_swapped_and_fixed_to_six_places() {
    let doc = build(&post(Some(Coordinates {
        lat: 40.712800,
        lon: -74.006000,
    })));
    assert_eq!(doc.location.as_deref(), Some("-74.006000, 40.712800"));
}

#[test]
fn missing_coordinates_leave_location_out() {
    let doc = build(&post(None));
    assert_eq!(doc.location, None);

    let json = serde_json::to_value(&doc).unwrap();
    assert!(json.get("location").is_none());
}

#[test]
fn field_by_field_transform() {
    let doc = build(&post(None));
    assert_eq!(
        doc,
        StorageDocument {
            user: "reporter".into(),
            message: "Live from downtown".into(),
            retweets: 12,
            language: Some("en".into()),
            ..StorageDocument::default()
        }
    );
    // reserved fields stay empty
    assert!(doc.image.is_none());
    assert!(doc.created.is_none());
    assert!(doc.tags.is_empty());
    assert!(doc.country.is_none());
    assert!(doc.suggest_field.is_none());
}

#[test]
fn serialized_shape_matches_index_fields() {
    let doc = build(&post(Some(Coordinates { lat: 1.5, lon: 2.25 })));
    let json = serde_json::to_value(&doc).unwrap();
    assert_eq!(json["user"], "reporter");
    assert_eq!(json["message"], "Live from downtown");
    assert_eq!(json["retweets"], 12);
    assert_eq!(json["language"], "en");
    assert_eq!(json["location"], "2.250000, 1.500000");
}
