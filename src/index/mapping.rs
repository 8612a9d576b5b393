// src/index/mapping.rs
use serde_json::{json, Value};

/// Field types of the post index.
pub fn properties() -> Value {
    json!({
        "user": { "type": "keyword" },
        "message": { "type": "text", "store": true, "fielddata": true },
        "image": { "type": "keyword" },
        "created": { "type": "date" },
        "tags": { "type": "keyword" },
        "location": { "type": "geo_point" },
        "suggest_field": { "type": "completion" },
        "country": { "type": "text" },
        "language": { "type": "text" }
    })
}

/// Create-index body. `_doc` selects the typeless layout of newer servers.
pub fn index_body(doc_type: &str) -> Value {
    let mappings = if doc_type == "_doc" {
        json!({ "properties": properties() })
    } else {
        let mut typed = serde_json::Map::new();
        typed.insert(doc_type.to_string(), json!({ "properties": properties() }));
        Value::Object(typed)
    };
    json!({
        "settings": {
            "number_of_shards": 1,
            "number_of_replicas": 0
        },
        "mappings": mappings
    })
}
