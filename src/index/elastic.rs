// src/index/elastic.rs
//! Elasticsearch-compatible REST sink plus the startup helpers
//! (readiness probe, index creation).

use async_trait::async_trait;
use metrics::counter;
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;
use std::time::Duration;

use super::{mapping, IndexSink};
use crate::document::StorageDocument;
use crate::error::{Error, Result};
use crate::identity::DocumentId;

pub const DEFAULT_INDEX: &str = "twitter";
pub const DEFAULT_DOC_TYPE: &str = "tweet";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexTarget {
    pub index: String,
    pub doc_type: String,
}

impl Default for IndexTarget {
    fn default() -> Self {
        Self {
            index: DEFAULT_INDEX.to_string(),
            doc_type: DEFAULT_DOC_TYPE.to_string(),
        }
    }
}

#[derive(Clone)]
pub struct ElasticSink {
    client: Client,
    base: Url,
    target: IndexTarget,
}

#[derive(Deserialize)]
struct PingResponse {
    version: PingVersion,
}

#[derive(Deserialize)]
struct PingVersion {
    number: String,
}

#[derive(Deserialize)]
struct Acknowledged {
    #[serde(default)]
    acknowledged: bool,
}

fn startup(what: &'static str) -> impl FnOnce(reqwest::Error) -> Error {
    move |e| Error::Startup(format!("{what}: {e}"))
}

impl ElasticSink {
    pub fn new(base_url: &str, target: IndexTarget) -> Result<Self> {
        Self::with_client(Client::new(), base_url, target)
    }

    pub fn with_client(client: Client, base_url: &str, target: IndexTarget) -> Result<Self> {
        let base = Url::parse(base_url)
            .map_err(|e| Error::Config(format!("invalid document store url {base_url}: {e}")))?;
        if base.cannot_be_a_base() {
            return Err(Error::Config(format!(
                "document store url {base_url} cannot carry a path"
            )));
        }
        Ok(Self {
            client,
            base,
            target,
        })
    }

    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// Server version as reported by the root endpoint.
    pub async fn ping(&self) -> Result<String> {
        let resp = self
            .client
            .get(self.base.clone())
            .send()
            .await
            .map_err(startup("ping"))?
            .error_for_status()
            .map_err(startup("ping"))?;
        let body: PingResponse = resp.json().await.map_err(startup("ping body"))?;
        Ok(body.version.number)
    }

    /// Ping until the store answers, at most `attempts` times.
    pub async fn wait_until_ready(&self, attempts: u32, delay: Duration) -> Result<String> {
        let attempts = attempts.max(1);
        let mut last_err = None;
        for attempt in 1..=attempts {
            match self.ping().await {
                Ok(version) => {
                    tracing::info!(target: "index", url = %self.base, %version, attempt, "document store ready");
                    return Ok(version);
                }
                Err(e) => {
                    tracing::warn!(target: "index", url = %self.base, attempt, error = %e, "document store not ready");
                    last_err = Some(e);
                }
            }
            if attempt < attempts {
                tokio::time::sleep(delay).await;
            }
        }
        Err(Error::Startup(format!(
            "document store at {} not ready after {attempts} attempts: {}",
            self.base,
            last_err.map(|e| e.to_string()).unwrap_or_default()
        )))
    }

    pub async fn index_exists(&self) -> Result<bool> {
        let resp = self
            .client
            .head(self.url(&[self.target.index.as_str()]))
            .send()
            .await
            .map_err(startup("index exists"))?;
        match resp.status() {
            StatusCode::OK => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            other => Err(Error::Startup(format!(
                "index exists check for {} answered {other}",
                self.target.index
            ))),
        }
    }

    /// Create the index with the post mapping. Returns the acknowledged flag.
    pub async fn create_index(&self) -> Result<bool> {
        let body = mapping::index_body(&self.target.doc_type);
        let resp = self
            .client
            .put(self.url(&[self.target.index.as_str()]))
            .json(&body)
            .send()
            .await
            .map_err(startup("create index"))?
            .error_for_status()
            .map_err(startup("create index"))?;
        let ack: Acknowledged = resp.json().await.map_err(startup("create index body"))?;
        if !ack.acknowledged {
            tracing::warn!(target: "index", index = %self.target.index, "index creation not acknowledged");
        }
        Ok(ack.acknowledged)
    }

    /// Create the index if it is missing. Returns whether it was created.
    pub async fn ensure_index(&self) -> Result<bool> {
        if self.index_exists().await? {
            tracing::info!(target: "index", index = %self.target.index, "index already present");
            return Ok(false);
        }
        let acknowledged = self.create_index().await?;
        tracing::info!(target: "index", index = %self.target.index, acknowledged, "index create requested");
        Ok(true)
    }
}

#[async_trait]
impl IndexSink for ElasticSink {
    async fn put(&self, id: DocumentId, doc: &StorageDocument) -> Result<()> {
        let id_str = id.to_string();
        let url = self.url(&[
            self.target.index.as_str(),
            self.target.doc_type.as_str(),
            id_str.as_str(),
        ]);
        let res = self
            .client
            .put(url)
            .json(doc)
            .send()
            .await
            .and_then(|resp| resp.error_for_status());
        match res {
            Ok(_) => {
                counter!("index_writes_total").increment(1);
                Ok(())
            }
            Err(e) => {
                counter!("index_write_errors_total").increment(1);
                Err(Error::index_write(id, e))
            }
        }
    }

    fn name(&self) -> &'static str {
        "elasticsearch"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_url_joins_target_and_id() {
        let sink = ElasticSink::new("http://es.local:9200/", IndexTarget::default()).unwrap();
        let url = sink.url(&["twitter", "tweet", "12"]);
        assert_eq!(url.as_str(), "http://es.local:9200/twitter/tweet/12");
    }

    #[test]
    fn base_path_prefix_is_kept() {
        let sink = ElasticSink::new("http://proxy.local/es", IndexTarget::default()).unwrap();
        assert_eq!(sink.url(&["twitter"]).as_str(), "http://proxy.local/es/twitter");
    }

    #[test]
    fn rejects_unparseable_url() {
        assert!(matches!(
            ElasticSink::new("not a url", IndexTarget::default()),
            Err(Error::Config(_))
        ));
    }
}
