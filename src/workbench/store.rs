use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::curl::{self, ParseError};
use crate::diff::{diff, DiffReport};
use crate::executor::ResponseEnvelope;

use super::{
    ids::IdGenerator,
    record::{RecordError, RecordStatus, TestRecord},
};

pub const DEFAULT_GROUP: &str = "Default";

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("CURL command is empty")]
    EmptyCommand,
    #[error("comparison key is empty")]
    EmptyKey,
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("no http(s) URL found in command (got {0:?})")]
    InvalidUrl(String),
    #[error(transparent)]
    Record(#[from] RecordError),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    pub total: usize,
    pub success: usize,
    pub error: usize,
    pub pending: usize,
    #[serde(default)]
    pub processing: usize,
}

impl Stats {
    pub fn of(records: &[TestRecord]) -> Self {
        let count = |status: RecordStatus| {
            records
                .iter()
                .filter(|record| record.status == status)
                .count()
        };
        Self {
            total: records.len(),
            success: count(RecordStatus::Success),
            error: count(RecordStatus::Error),
            pending: count(RecordStatus::Pending),
            processing: count(RecordStatus::Processing),
        }
    }
}

/// The active record set plus the operations allowed on it.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Workbench {
    records: Vec<TestRecord>,
    #[serde(skip)]
    ids: IdGenerator,
}

impl Workbench {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[TestRecord] {
        &self.records
    }

    pub fn get(&self, id: &str) -> Option<&TestRecord> {
        self.records.iter().find(|record| record.id == id)
    }

    pub fn stats(&self) -> Stats {
        Stats::of(&self.records)
    }

    pub fn pending_ids(&self) -> Vec<String> {
        self.ids_with_status(RecordStatus::Pending)
    }

    pub fn ids_with_status(&self, status: RecordStatus) -> Vec<String> {
        self.records
            .iter()
            .filter(|record| record.status == status)
            .map(|record| record.id.clone())
            .collect()
    }

    /// Parses `command` and stores it as a new pending record. Nothing is
    /// stored when the command is rejected.
    pub fn submit(
        &mut self,
        command: &str,
        key: &str,
        group: Option<&str>,
    ) -> Result<&TestRecord, SubmitError> {
        if command.trim().is_empty() {
            return Err(SubmitError::EmptyCommand);
        }
        if key.trim().is_empty() {
            return Err(SubmitError::EmptyKey);
        }

        let request = curl::parse(command)?;
        if !request.has_http_url() {
            return Err(SubmitError::InvalidUrl(request.url));
        }

        let group = group
            .map(str::trim)
            .filter(|group| !group.is_empty())
            .unwrap_or(DEFAULT_GROUP);

        let record = TestRecord {
            id: self.ids.next_id(),
            group: group.to_string(),
            key: key.trim().to_string(),
            curl_raw: command.to_string(),
            request,
            response: None,
            status: RecordStatus::Pending,
            diff: None,
            timestamp: self.next_timestamp(),
            selected: false,
        };
        debug!(id = %record.id, key = %record.key, "test submitted");
        Ok(self.push(record))
    }

    /// Queues the request of an existing record again as a new pending record.
    pub fn resubmit(&mut self, id: &str) -> Result<&TestRecord, SubmitError> {
        let source = self
            .get(id)
            .cloned()
            .ok_or_else(|| RecordError::NotFound(id.to_string()))?;

        let record = TestRecord {
            id: self.ids.next_id(),
            response: None,
            status: RecordStatus::Pending,
            diff: None,
            timestamp: self.next_timestamp(),
            selected: false,
            ..source
        };
        Ok(self.push(record))
    }

    fn push(&mut self, record: TestRecord) -> &TestRecord {
        self.records.push(record);
        &self.records[self.records.len() - 1]
    }

    fn next_timestamp(&self) -> DateTime<Utc> {
        let now = Utc::now();
        match self.records.iter().map(|record| record.timestamp).max() {
            Some(last) if now <= last => last + Duration::microseconds(1),
            _ => now,
        }
    }

    fn position(&self, id: &str) -> Result<usize, RecordError> {
        self.records
            .iter()
            .position(|record| record.id == id)
            .ok_or_else(|| RecordError::NotFound(id.to_string()))
    }

    /// Marks a pending record as processing and returns the new value.
    pub fn begin(&mut self, id: &str) -> Result<TestRecord, RecordError> {
        let index = self.position(id)?;
        let started = self.records[index].started()?;
        self.records[index] = started.clone();
        Ok(started)
    }

    /// Attaches the execution outcome to a processing record.
    pub fn complete(&mut self, id: &str, envelope: ResponseEnvelope) -> Result<&TestRecord, RecordError> {
        let index = self.position(id)?;
        self.records[index] = self.records[index].completed(envelope)?;
        Ok(&self.records[index])
    }

    /// The most recent earlier record with the same key that holds a response.
    pub fn previous_with_response(&self, record: &TestRecord) -> Option<&TestRecord> {
        self.records
            .iter()
            .filter(|other| {
                other.key == record.key
                    && other.timestamp < record.timestamp
                    && other.response.is_some()
            })
            .max_by_key(|other| other.timestamp)
    }

    /// Diffs the record's response against the previous same-key response.
    /// Leaves the record untouched when either side is missing.
    pub fn attach_diff(&mut self, id: &str) -> Result<Option<&DiffReport>, RecordError> {
        let index = self.position(id)?;
        let record = &self.records[index];
        let Some(current) = record.response.as_ref() else {
            return Ok(None);
        };
        let Some(previous) = self
            .previous_with_response(record)
            .and_then(|previous| previous.response.as_ref())
        else {
            return Ok(None);
        };

        let report = diff(&previous.body, &current.body);
        self.records[index] = self.records[index].with_diff(report);
        Ok(self.records[index].diff.as_ref())
    }

    /// Recomputes diffs for `ids` in timestamp order.
    pub fn refresh_diffs(&mut self, ids: &[String]) -> Result<(), RecordError> {
        let mut ordered = Vec::with_capacity(ids.len());
        for id in ids {
            let record = self
                .get(id)
                .ok_or_else(|| RecordError::NotFound(id.clone()))?;
            ordered.push((record.timestamp, id.clone()));
        }
        ordered.sort();

        for (_, id) in ordered {
            self.attach_diff(&id)?;
        }
        Ok(())
    }

    pub fn remove(&mut self, id: &str) -> Result<TestRecord, RecordError> {
        let index = self.position(id)?;
        Ok(self.records.remove(index))
    }

    pub fn clear(&mut self) -> usize {
        let removed = self.records.len();
        self.records.clear();
        removed
    }

    /// Swaps the active set for `records`, e.g. when restoring a snapshot.
    pub fn replace_all(&mut self, records: Vec<TestRecord>) {
        self.records = records;
    }
}
