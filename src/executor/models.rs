use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::curl::Headers;

/// Response payload: the parsed JSON document when the text parses, the raw
/// text otherwise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ResponseBody {
    Raw(String),
    Json(Value),
}

impl ResponseBody {
    pub fn from_text(text: String) -> Self {
        match serde_json::from_str::<Value>(&text) {
            Ok(value) => ResponseBody::Json(value),
            Err(_) => ResponseBody::Raw(text),
        }
    }

    pub fn to_text(&self) -> String {
        match self {
            ResponseBody::Raw(text) => text.clone(),
            ResponseBody::Json(Value::String(text)) => text.clone(),
            ResponseBody::Json(value) => value.to_string(),
        }
    }

    pub fn to_pretty_text(&self) -> String {
        match self {
            ResponseBody::Json(value @ (Value::Object(_) | Value::Array(_))) => {
                serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
            }
            other => other.to_text(),
        }
    }
}

impl Default for ResponseBody {
    fn default() -> Self {
        ResponseBody::Raw(String::new())
    }
}

/// Normalised outcome of one HTTP call, successful or not.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseEnvelope {
    pub status: u16,
    pub status_text: String,
    pub headers: Headers,
    pub body: ResponseBody,
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default)]
    pub duration_ms: f64,
}

impl ResponseEnvelope {
    pub fn from_raw(raw: RawResponse, duration_ms: f64) -> Self {
        Self {
            ok: (200..300).contains(&raw.status),
            status: raw.status,
            status_text: raw.status_text,
            headers: raw.headers,
            body: ResponseBody::from_text(raw.body),
            error: None,
            duration_ms,
        }
    }

    pub fn transport_failure(message: impl Into<String>, duration_ms: f64) -> Self {
        Self {
            status: 0,
            status_text: "Error".to_string(),
            headers: Headers::new(),
            body: ResponseBody::default(),
            ok: false,
            error: Some(message.into()),
            duration_ms,
        }
    }
}

/// What the executor hands to the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpCall {
    pub method: String,
    pub url: String,
    pub headers: Headers,
    pub body: Option<String>,
}

/// What the transport hands back once a status line has been received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub status_text: String,
    pub headers: Headers,
    pub body: String,
}
