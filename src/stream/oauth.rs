// src/stream/oauth.rs
//! OAuth 1.0a (HMAC-SHA1) request signing for the streaming endpoint.

use base64::Engine;
use hmac::{Hmac, Mac};
use rand::{distr::Alphanumeric, Rng};
use reqwest::Url;
use sha1::Sha1;

use crate::config::Credentials;

#[derive(Clone)]
pub struct OAuthSigner {
    consumer_key: String,
    consumer_secret: String,
    token: String,
    token_secret: String,
}

impl std::fmt::Debug for OAuthSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthSigner")
            .field("consumer_key", &self.consumer_key)
            .finish_non_exhaustive()
    }
}

impl From<&Credentials> for OAuthSigner {
    fn from(c: &Credentials) -> Self {
        Self {
            consumer_key: c.api_key.clone(),
            consumer_secret: c.api_secret.clone(),
            token: c.access_token_key.clone(),
            token_secret: c.access_token_secret.clone(),
        }
    }
}

impl OAuthSigner {
    /// `Authorization` header value for a request with a fresh nonce/timestamp.
    pub fn authorization(&self, method: &str, url: &Url) -> String {
        let nonce: String = rand::rng()
            .sample_iter(&Alphanumeric)
            .take(32)
            .map(char::from)
            .collect();
        let timestamp = chrono::Utc::now().timestamp().max(0).to_string();
        self.authorization_with(method, url, &[], &nonce, &timestamp)
    }

    /// Deterministic variant; `extra` carries form-body parameters, if any.
    pub fn authorization_with(
        &self,
        method: &str,
        url: &Url,
        extra: &[(&str, &str)],
        nonce: &str,
        timestamp: &str,
    ) -> String {
        let oauth = [
            ("oauth_consumer_key", self.consumer_key.as_str()),
            ("oauth_nonce", nonce),
            ("oauth_signature_method", "HMAC-SHA1"),
            ("oauth_timestamp", timestamp),
            ("oauth_token", self.token.as_str()),
            ("oauth_version", "1.0"),
        ];

        let mut params: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (percent_encode(&k), percent_encode(&v)))
            .chain(
                extra
                    .iter()
                    .chain(oauth.iter())
                    .map(|(k, v)| (percent_encode(k), percent_encode(v))),
            )
            .collect();
        params.sort();

        let param_string = params
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&");

        let base = format!(
            "{}&{}&{}",
            method.to_ascii_uppercase(),
            percent_encode(&base_url(url)),
            percent_encode(&param_string)
        );
        let key = format!(
            "{}&{}",
            percent_encode(&self.consumer_secret),
            percent_encode(&self.token_secret)
        );

        let mut mac =
            Hmac::<Sha1>::new_from_slice(key.as_bytes()).expect("HMAC accepts keys of any length");
        mac.update(base.as_bytes());
        let signature =
            base64::engine::general_purpose::STANDARD.encode(mac.finalize().into_bytes());

        let mut header: Vec<(&str, String)> = oauth
            .iter()
            .map(|(k, v)| (*k, percent_encode(v)))
            .collect();
        header.push(("oauth_signature", percent_encode(&signature)));
        header.sort();

        let fields = header
            .iter()
            .map(|(k, v)| format!("{k}=\"{v}\""))
            .collect::<Vec<_>>()
            .join(", ");
        format!("OAuth {fields}")
    }
}

fn base_url(url: &Url) -> String {
    let host = url.host_str().unwrap_or_default();
    match url.port() {
        Some(port) => format!("{}://{}:{}{}", url.scheme(), host, port, url.path()),
        None => format!("{}://{}{}", url.scheme(), host, url.path()),
    }
}

/// RFC 3986 encoding: everything but unreserved characters is escaped.
pub(crate) fn percent_encode(s: &str) -> String {
    urlencoding::encode(s).into_owned()
}
