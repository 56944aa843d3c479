use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use url::Url;

pub type Headers = BTreeMap<String, String>;

/// Methods that carry a request payload.
pub const BODY_METHODS: &[&str] = &["POST", "PUT", "PATCH"];

/// A request extracted from a CURL command. Immutable once parsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    pub method: String,
    pub url: String,
    pub headers: Headers,
    pub payload: String,
}

impl Default for Request {
    fn default() -> Self {
        Self {
            method: "GET".to_string(),
            url: String::new(),
            headers: Headers::new(),
            payload: String::new(),
        }
    }
}

impl Request {
    pub fn carries_payload(&self) -> bool {
        BODY_METHODS.contains(&self.method.as_str()) && !self.payload.is_empty()
    }

    pub fn has_http_url(&self) -> bool {
        Url::parse(&self.url)
            .map(|url| matches!(url.scheme(), "http" | "https") && url.has_host())
            .unwrap_or(false)
    }
}
