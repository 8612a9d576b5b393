// src/config/credentials.rs
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

pub const DEFAULT_CREDENTIALS_PATH: &str = "conf.json";
pub const ENV_CREDENTIALS_PATH: &str = "FIREHOSE_CONFIG_PATH";

/// Stream API keys, read once at startup.
#[derive(Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    pub api_key: String,
    pub api_secret: String,
    pub access_token_key: String,
    pub access_token_secret: String,
}

// Secrets never reach the logs.
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &self.api_key)
            .field("api_secret", &"<redacted>")
            .field("access_token_key", &self.access_token_key)
            .field("access_token_secret", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    /// Missing file, bad JSON or an empty field is a configuration error.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("reading {}: {e}", path.display())))?;
        let creds: Credentials = serde_json::from_str(&data)
            .map_err(|e| Error::Config(format!("parsing {}: {e}", path.display())))?;
        creds.validate()?;
        Ok(creds)
    }

    /// `$FIREHOSE_CONFIG_PATH`, falling back to `conf.json` in the working dir.
    pub fn default_path() -> PathBuf {
        std::env::var(ENV_CREDENTIALS_PATH)
            .ok()
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CREDENTIALS_PATH))
    }

    fn validate(&self) -> Result<()> {
        let missing: Vec<&str> = [
            ("apiKey", &self.api_key),
            ("apiSecret", &self.api_secret),
            ("accessTokenKey", &self.access_token_key),
            ("accessTokenSecret", &self.access_token_secret),
        ]
        .iter()
        .filter(|(_, v)| v.trim().is_empty())
        .map(|(k, _)| *k)
        .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(Error::Config(format!(
                "credentials missing: {}",
                missing.join(", ")
            )))
        }
    }
}
