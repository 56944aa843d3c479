use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;
use tracing::debug;

use super::model::{Headers, Request};

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("unable to parse CURL command: {0}")]
    Pattern(#[from] regex::Error),
}

struct CurlPatterns {
    method: Regex,
    url: Regex,
    header: Regex,
    payload: Regex,
}

impl CurlPatterns {
    fn compile() -> Result<Self, regex::Error> {
        Ok(Self {
            method: Regex::new(r"(?i)--request\s+(\w+)")?,
            url: Regex::new(
                r#"(?i)(?:--url|--location(?:\s+--request\s+\w+)?)\s*['"]?(https?://[^\s'"]+)['"]?"#,
            )?,
            header: Regex::new(r"--header\s+'([^:]+):\s*(.+?)'")?,
            payload: Regex::new(r"--data(?:-raw)?\s+'((?s:.+?))'")?,
        })
    }
}

static PATTERNS: Lazy<Result<CurlPatterns, regex::Error>> = Lazy::new(CurlPatterns::compile);

/// Extracts a [`Request`] from a CURL command.
///
/// This is pattern extraction, not a shell parser: only `--request`,
/// `--url`/`--location`, `--header` and `--data`/`--data-raw` are recognised.
/// Nested quotes, `\` continuations inside quoted values and repeated `--data`
/// flags are not handled. Missing flags fall back to the [`Request`] defaults.
pub fn parse(command: &str) -> Result<Request, ParseError> {
    let patterns = PATTERNS.as_ref().map_err(|err| ParseError::Pattern(err.clone()))?;
    let mut request = Request::default();

    if let Some(caps) = patterns.method.captures(command) {
        request.method = caps[1].to_uppercase();
    }

    if let Some(caps) = patterns.url.captures(command) {
        request.url = caps[1].to_string();
    }

    let mut headers = Headers::new();
    for caps in patterns.header.captures_iter(command) {
        headers.insert(caps[1].trim().to_string(), caps[2].trim().to_string());
    }
    request.headers = headers;

    if let Some(caps) = patterns.payload.captures(command) {
        request.payload = caps[1].to_string();
    }

    debug!(
        method = %request.method,
        url = %request.url,
        headers = request.headers.len(),
        payload_bytes = request.payload.len(),
        "parsed curl command"
    );

    Ok(request)
}
