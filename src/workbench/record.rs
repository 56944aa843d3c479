use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::curl::Request;
use crate::diff::DiffReport;
use crate::executor::ResponseEnvelope;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RecordError {
    #[error("cannot move test {id} from {from} to {to}")]
    InvalidTransition {
        id: String,
        from: RecordStatus,
        to: RecordStatus,
    },
    #[error("unknown test id: {0}")]
    NotFound(String),
}

/// `Pending -> Processing -> {Success, Error}`; terminal states never change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordStatus {
    Pending,
    Processing,
    Success,
    Error,
}

impl RecordStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, RecordStatus::Success | RecordStatus::Error)
    }

    pub fn can_advance_to(self, next: RecordStatus) -> bool {
        matches!(
            (self, next),
            (RecordStatus::Pending, RecordStatus::Processing)
                | (RecordStatus::Processing, RecordStatus::Success)
                | (RecordStatus::Processing, RecordStatus::Error)
        )
    }
}

impl fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RecordStatus::Pending => "pending",
            RecordStatus::Processing => "processing",
            RecordStatus::Success => "success",
            RecordStatus::Error => "error",
        };
        f.write_str(label)
    }
}

/// The unit of work. Updates never mutate a record in place; every
/// transition returns a new value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestRecord {
    pub id: String,
    pub group: String,
    pub key: String,
    pub curl_raw: String,
    pub request: Request,
    #[serde(default)]
    pub response: Option<ResponseEnvelope>,
    pub status: RecordStatus,
    #[serde(default)]
    pub diff: Option<DiffReport>,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub selected: bool,
}

impl TestRecord {
    fn advanced(&self, next: RecordStatus) -> Result<TestRecord, RecordError> {
        if !self.status.can_advance_to(next) {
            return Err(RecordError::InvalidTransition {
                id: self.id.clone(),
                from: self.status,
                to: next,
            });
        }
        Ok(TestRecord {
            status: next,
            ..self.clone()
        })
    }

    /// `Pending -> Processing`.
    pub fn started(&self) -> Result<TestRecord, RecordError> {
        self.advanced(RecordStatus::Processing)
    }

    /// `Processing -> Success | Error`, depending on `envelope.ok`.
    pub fn completed(&self, envelope: ResponseEnvelope) -> Result<TestRecord, RecordError> {
        let next = if envelope.ok {
            RecordStatus::Success
        } else {
            RecordStatus::Error
        };
        let mut record = self.advanced(next)?;
        record.response = Some(envelope);
        Ok(record)
    }

    pub fn with_diff(&self, diff: DiffReport) -> TestRecord {
        TestRecord {
            diff: Some(diff),
            ..self.clone()
        }
    }

    pub fn failure_reason(&self) -> Option<&str> {
        self.response.as_ref().and_then(|response| response.error.as_deref())
    }
}
