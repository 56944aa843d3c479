//! Persistence adapters for the record set: named snapshots and CSV reports.

mod csv;
mod snapshot;

pub use csv::{export_csv, report_file_name};
pub use snapshot::{FsSnapshotStore, Snapshot, SnapshotEntry, SnapshotStore, SNAPSHOT_PREFIX};
