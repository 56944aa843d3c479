use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::compare::{compare, CompareMode, ComparisonReport};
use crate::curl::{self, ParseError};
use crate::diff::{diff, DiffReport};
use crate::executor::ResponseBody;
use crate::workbench::TestRecord;

#[derive(Debug, Error)]
pub enum WebError {
    #[error("{0}")]
    Message(String),
    #[error(transparent)]
    Parse(#[from] ParseError),
}

pub type WebResult<T> = Result<T, WebError>;

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct WebHeader {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WebRequest {
    pub method: String,
    pub url: String,
    pub headers: Vec<WebHeader>,
    pub body: Option<String>,
    /// Whether the URL is an absolute http(s) URL the workbench would accept.
    pub valid_url: bool,
}

#[derive(Debug, Serialize)]
pub struct WebDiff {
    pub summary: String,
    pub identical: bool,
    pub report: DiffReport,
}

pub fn parse_curl(command: &str) -> WebResult<WebRequest> {
    if command.trim().is_empty() {
        return Err(WebError::Message("CURL command is empty".to_string()));
    }
    let request = curl::parse(command)?;
    let valid_url = request.has_http_url();
    let body = request
        .carries_payload()
        .then(|| request.payload.clone());

    Ok(WebRequest {
        method: request.method,
        url: request.url,
        headers: request
            .headers
            .into_iter()
            .map(|(name, value)| WebHeader { name, value })
            .collect(),
        body,
        valid_url,
    })
}

/// Diffs two response texts; each side is treated as JSON when it parses.
pub fn diff_bodies(previous: &str, current: &str) -> WebDiff {
    let report = diff(
        &ResponseBody::from_text(previous.to_string()),
        &ResponseBody::from_text(current.to_string()),
    );
    WebDiff {
        summary: report.summary(),
        identical: report.is_identical(),
        report,
    }
}

pub fn compare_records(records: &[TestRecord], mode: Option<&str>) -> WebResult<ComparisonReport> {
    let mode = match mode.map(str::trim) {
        None | Some("") | Some("base") => CompareMode::Base,
        Some("adjacent") => CompareMode::Adjacent,
        Some(other) => return Err(WebError::Message(format!("Unknown compare mode: {other}"))),
    };
    Ok(compare(records, mode))
}
