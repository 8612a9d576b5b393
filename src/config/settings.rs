// src/config/settings.rs
//! Runtime settings: one CLI flag (`--url`) plus environment overrides.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use super::credentials::Credentials;
use crate::error::{Error, Result};
use crate::index::elastic::{DEFAULT_DOC_TYPE, DEFAULT_INDEX};
use crate::index::IndexTarget;
use crate::stream::DEFAULT_STREAM_URL;

pub const DEFAULT_ES_URL: &str = "http://elasticsearch:9200";

pub const ENV_ES_URL: &str = "FIREHOSE_ES_URL";
pub const ENV_ES_INDEX: &str = "FIREHOSE_ES_INDEX";
pub const ENV_ES_DOC_TYPE: &str = "FIREHOSE_ES_DOC_TYPE";
pub const ENV_STREAM_URL: &str = "FIREHOSE_STREAM_URL";
pub const ENV_READY_ATTEMPTS: &str = "FIREHOSE_READY_ATTEMPTS";
pub const ENV_READY_DELAY_MS: &str = "FIREHOSE_READY_DELAY_MS";
pub const ENV_METRICS_ADDR: &str = "FIREHOSE_METRICS_ADDR";
pub const ENV_LOG_FORMAT: &str = "LOG_FORMAT";

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub es_url: String,
    /// `_doc` selects the typeless index layout.
    pub index_target: IndexTarget,
    pub credentials_path: PathBuf,
    pub stream_url: String,
    pub ready_attempts: u32,
    pub ready_delay: Duration,
    pub metrics_addr: Option<SocketAddr>,
    pub log_json: bool,
}

impl Settings {
    pub fn from_env_and_args<I>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = String>,
    {
        let mut s = Self::resolve(args, |k| std::env::var(k).ok())?;
        s.credentials_path = Credentials::default_path();
        Ok(s)
    }

    /// Flag beats env, env beats defaults. `env` is injected for tests.
    pub fn resolve<I, F>(args: I, env: F) -> Result<Self>
    where
        I: IntoIterator<Item = String>,
        F: Fn(&str) -> Option<String>,
    {
        let env = |k: &str| env(k).filter(|v| !v.trim().is_empty());
        let flag_url = parse_url_flag(args)?;

        let es_url = flag_url
            .or_else(|| env(ENV_ES_URL))
            .unwrap_or_else(|| DEFAULT_ES_URL.to_string());
        let index_target = IndexTarget {
            index: env(ENV_ES_INDEX).unwrap_or_else(|| DEFAULT_INDEX.to_string()),
            doc_type: env(ENV_ES_DOC_TYPE).unwrap_or_else(|| DEFAULT_DOC_TYPE.to_string()),
        };
        let stream_url = env(ENV_STREAM_URL).unwrap_or_else(|| DEFAULT_STREAM_URL.to_string());

        let ready_attempts = match env(ENV_READY_ATTEMPTS) {
            Some(v) => parse_env(ENV_READY_ATTEMPTS, &v)?,
            None => 10,
        };
        let ready_delay = match env(ENV_READY_DELAY_MS) {
            Some(v) => Duration::from_millis(parse_env(ENV_READY_DELAY_MS, &v)?),
            None => Duration::from_secs(2),
        };
        let metrics_addr = env(ENV_METRICS_ADDR)
            .map(|v| parse_env(ENV_METRICS_ADDR, &v))
            .transpose()?;
        let log_json = env(ENV_LOG_FORMAT).is_some_and(|v| v.eq_ignore_ascii_case("json"));

        Ok(Self {
            es_url,
            index_target,
            credentials_path: PathBuf::from(super::credentials::DEFAULT_CREDENTIALS_PATH),
            stream_url,
            ready_attempts,
            ready_delay,
            metrics_addr,
            log_json,
        })
    }
}

fn parse_env<T>(name: &str, raw: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e| Error::Config(format!("{name}={raw}: {e}")))
}

/// Accepts `--url X`, `--url=X`, `-url X`, `-url=X`. Anything else is rejected.
fn parse_url_flag<I>(args: I) -> Result<Option<String>>
where
    I: IntoIterator<Item = String>,
{
    let mut url = None;
    let mut it = args.into_iter();
    while let Some(arg) = it.next() {
        let flag = arg.trim_start_matches('-');
        if arg.starts_with('-') && flag == "url" {
            let v = it
                .next()
                .ok_or_else(|| Error::Config("--url expects a value".into()))?;
            url = Some(v);
        } else if let Some(v) = flag.strip_prefix("url=").filter(|_| arg.starts_with('-')) {
            url = Some(v.to_string());
        } else {
            return Err(Error::Config(format!("unknown argument: {arg}")));
        }
    }
    Ok(url.filter(|u| !u.trim().is_empty()))
}
