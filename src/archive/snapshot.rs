use std::{fs, path::PathBuf};

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::workbench::{Stats, TestRecord};

pub const SNAPSHOT_PREFIX: &str = "test_";

/// A saved copy of the whole record set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub timestamp: DateTime<Utc>,
    pub data: Vec<TestRecord>,
    pub stats: Stats,
}

impl Snapshot {
    pub fn capture(records: &[TestRecord], timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            data: records.to_vec(),
            stats: Stats::of(records),
        }
    }
}

/// Listing row; the records themselves stay on disk until loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotEntry {
    pub key: String,
    pub timestamp: DateTime<Utc>,
    pub stats: Stats,
}

pub trait SnapshotStore {
    /// Stores the record set and returns the key it was saved under.
    fn save(&self, records: &[TestRecord]) -> Result<String>;
    /// Newest first. Unreadable entries are skipped.
    fn list(&self) -> Result<Vec<SnapshotEntry>>;
    fn load(&self, key: &str) -> Result<Snapshot>;
    /// Returns false when nothing was stored under `key`.
    fn delete(&self, key: &str) -> Result<bool>;
    /// Deletes every snapshot and returns how many were removed.
    fn clear(&self) -> Result<usize>;
}

/// One JSON file per snapshot, named after its key.
#[derive(Debug, Clone)]
pub struct FsSnapshotStore {
    dir: PathBuf,
}

impl FsSnapshotStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn save_at(&self, records: &[TestRecord], now: DateTime<Utc>) -> Result<String> {
        if records.is_empty() {
            bail!("no test records to save");
        }
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("creating archive directory {}", self.dir.display()))?;

        let stem = format!("{SNAPSHOT_PREFIX}{}", now.format("%Y-%m-%dT%H-%M-%S"));
        let mut key = stem.clone();
        let mut suffix = 1;
        while self.path_for(&key).exists() {
            key = format!("{stem}-{suffix}");
            suffix += 1;
        }

        let snapshot = Snapshot::capture(records, now);
        let encoded = serde_json::to_string_pretty(&snapshot).context("encoding snapshot")?;
        let path = self.path_for(&key);
        fs::write(&path, encoded)
            .with_context(|| format!("writing snapshot {}", path.display()))?;
        debug!(key = %key, records = records.len(), "saved snapshot");
        Ok(key)
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    fn checked_path(&self, key: &str) -> Result<PathBuf> {
        let valid = key.starts_with(SNAPSHOT_PREFIX)
            && key
                .chars()
                .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_'));
        if !valid {
            bail!("invalid snapshot key: {key}");
        }
        Ok(self.path_for(key))
    }

    fn keys(&self) -> Result<Vec<String>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }
        let mut keys = Vec::new();
        for entry in fs::read_dir(&self.dir)
            .with_context(|| format!("reading directory {}", self.dir.display()))?
        {
            let entry = entry?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            if let Some(key) = name.strip_suffix(".json") {
                if key.starts_with(SNAPSHOT_PREFIX) {
                    keys.push(key.to_string());
                }
            }
        }
        keys.sort_by(|a, b| order_key(b).cmp(&order_key(a)));
        Ok(keys)
    }
}

/// `(stem, collision suffix)`, so `-10` sorts after `-9` within one second.
fn order_key(key: &str) -> (&str, u32) {
    const STEM_LEN: usize = SNAPSHOT_PREFIX.len() + "YYYY-MM-DDTHH-MM-SS".len();
    let suffix = key
        .get(STEM_LEN..)
        .and_then(|rest| rest.strip_prefix('-'))
        .and_then(|digits| digits.parse().ok());
    match suffix {
        Some(suffix) => (&key[..STEM_LEN], suffix),
        None => (key, 0),
    }
}

impl SnapshotStore for FsSnapshotStore {
    fn save(&self, records: &[TestRecord]) -> Result<String> {
        self.save_at(records, Utc::now())
    }

    fn list(&self) -> Result<Vec<SnapshotEntry>> {
        let mut entries = Vec::new();
        for key in self.keys()? {
            match self.load(&key) {
                Ok(snapshot) => entries.push(SnapshotEntry {
                    key,
                    timestamp: snapshot.timestamp,
                    stats: snapshot.stats,
                }),
                Err(err) => warn!(key = %key, error = %err, "skipping unreadable snapshot"),
            }
        }
        Ok(entries)
    }

    fn load(&self, key: &str) -> Result<Snapshot> {
        let path = self.checked_path(key)?;
        let contents = fs::read_to_string(&path)
            .with_context(|| format!("reading snapshot {}", path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("parsing snapshot {}", path.display()))
    }

    fn delete(&self, key: &str) -> Result<bool> {
        let path = self.checked_path(key)?;
        if !path.exists() {
            return Ok(false);
        }
        fs::remove_file(&path).with_context(|| format!("deleting snapshot {}", path.display()))?;
        Ok(true)
    }

    fn clear(&self) -> Result<usize> {
        let keys = self.keys()?;
        for key in &keys {
            let path = self.path_for(key);
            fs::remove_file(&path)
                .with_context(|| format!("deleting snapshot {}", path.display()))?;
        }
        Ok(keys.len())
    }
}
