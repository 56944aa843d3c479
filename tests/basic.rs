use std::collections::HashMap;
use std::fs;
use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;
use curldiff::archive::{FsSnapshotStore, SnapshotStore};
use curldiff::compare::{compare, CompareMode};
use curldiff::config::{load_config, SettingsBuilder};
use curldiff::curl::{parse, Headers};
use curldiff::diff::{DiffKind, DiffReport, TextDiff};
use curldiff::executor::{
    HttpCall, HttpTransport, RawResponse, RequestExecutor, TransportError,
};
use curldiff::workbench::{run_batch, BatchOptions, RecordStatus, Workbench};
use tempfile::tempdir;

/// Serves a fixed sequence of bodies per URL and records every call.
#[derive(Default)]
struct SequenceTransport {
    bodies: Mutex<HashMap<String, Vec<&'static str>>>,
    calls: Mutex<Vec<HttpCall>>,
}

impl SequenceTransport {
    fn with(url: &str, bodies: Vec<&'static str>) -> Self {
        let transport = Self::default();
        transport
            .bodies
            .lock()
            .unwrap()
            .insert(url.to_string(), bodies);
        transport
    }
}

#[async_trait]
impl HttpTransport for SequenceTransport {
    async fn send(&self, call: HttpCall) -> Result<RawResponse, TransportError> {
        self.calls.lock().unwrap().push(call.clone());
        let mut bodies = self.bodies.lock().unwrap();
        let queue = bodies
            .get_mut(&call.url)
            .filter(|queue| !queue.is_empty())
            .ok_or_else(|| TransportError::Network(format!("connection refused: {}", call.url)))?;
        Ok(RawResponse {
            status: 200,
            status_text: "OK".to_string(),
            headers: Headers::new(),
            body: queue.remove(0).to_string(),
        })
    }
}

#[test]
fn parse_reads_every_supported_flag() -> Result<()> {
    let request = parse(
        "curl --location --request put 'https://api.example.com/items/7' \\\n  --header 'Content-Type: text/plain' \\\n  --data-raw 'line one\nline two'",
    )?;

    assert_eq!(request.method, "PUT");
    assert_eq!(request.url, "https://api.example.com/items/7");
    assert_eq!(request.headers.get("Content-Type").map(String::as_str), Some("text/plain"));
    assert_eq!(request.payload, "line one\nline two");
    Ok(())
}

#[tokio::test]
async fn batch_run_diffs_same_key_responses_in_order() -> Result<()> {
    let url = "https://api.example.com/profile";
    let transport = Arc::new(SequenceTransport::with(
        url,
        vec![
            r#"{"data":{"id":1,"tags":["a"]}}"#,
            r#"{"data":{"id":1,"tags":["a"]}}"#,
            r#"{"data":{"id":"1","tags":["a","b"]},"meta":{}}"#,
        ],
    ));
    let executor = RequestExecutor::new(transport.clone());

    let mut bench = Workbench::new();
    let command = format!("curl --url '{url}' --header 'Authorization: Basic old'");
    for _ in 0..3 {
        bench.submit(&command, "profile", None)?;
    }
    bench.submit("curl --url 'https://down.example.com'", "down", None)?;

    let ids: Vec<String> = bench.pending_ids();
    let outcome = run_batch(
        &mut bench,
        &executor,
        &ids,
        BatchOptions {
            override_token: Some("fresh"),
            concurrency: Some(1),
        },
        |_, _| {},
    )
    .await?;

    assert_eq!(outcome.succeeded, 3);
    assert_eq!(outcome.failed, 1);
    assert!(transport
        .calls
        .lock()
        .unwrap()
        .iter()
        .filter(|call| call.url == url)
        .all(|call| call.headers.get("Authorization").map(String::as_str) == Some("Bearer fresh")));

    let records = bench.records();
    assert!(records[0].diff.is_none());
    assert!(records[1].diff.as_ref().is_some_and(DiffReport::is_identical));

    let third = records[2].diff.as_ref().expect("third record is diffed");
    assert_eq!(
        third.paths_of(DiffKind::TypeChanged),
        ["data.id".to_string()].into_iter().collect()
    );
    assert_eq!(
        third.paths_of(DiffKind::Added),
        ["data.tags[1]".to_string(), "meta".to_string()].into_iter().collect()
    );

    assert_eq!(records[3].status, RecordStatus::Error);
    assert_eq!(records[3].response.as_ref().map(|r| r.status), Some(0));
    assert!(records[3]
        .failure_reason()
        .is_some_and(|reason| reason.contains("connection refused")));

    let report = compare(records, CompareMode::Base);
    let profile = report.groups[0].section.as_ref().expect("profile group compared");
    assert_eq!(profile.diffs.len(), 2);
    assert!(profile.key_summary.added.contains("meta"));
    assert!(report.groups[1].section.is_none());
    Ok(())
}

#[tokio::test]
async fn text_bodies_fall_back_to_line_diff() -> Result<()> {
    let url = "https://api.example.com/health";
    let executor = RequestExecutor::new(Arc::new(SequenceTransport::with(
        url,
        vec!["status: up\nversion: 1", "status: up\nversion: 2"],
    )));

    let mut bench = Workbench::new();
    let command = format!("curl --url '{url}'");
    bench.submit(&command, "health", None)?;
    bench.submit(&command, "health", None)?;
    let ids = bench.pending_ids();
    run_batch(&mut bench, &executor, &ids, BatchOptions::default(), |_, _| {}).await?;

    let diff = bench.records()[1].diff.clone().expect("diffed");
    assert_eq!(
        diff,
        DiffReport::Text {
            outcome: TextDiff::LineChanged {
                line: 2,
                previous: "version: 1".to_string(),
                current: "version: 2".to_string(),
            }
        }
    );
    assert_eq!(diff.summary(), "Line 2 differs");
    Ok(())
}

#[test]
fn session_survives_archive_round_trip() -> Result<()> {
    let temp = tempdir()?;
    fs::write(
        temp.path().join("curldiff.json"),
        r#"{"archiveDir": "snapshots", "defaultGroup": "Nightly"}"#,
    )?;
    let settings = SettingsBuilder::new(temp.path().to_path_buf(), load_config(temp.path())?).build()?;
    assert_eq!(settings.archive_dir, temp.path().join("snapshots"));

    let mut bench = Workbench::new();
    bench.submit(
        "curl --url 'https://api.example.com/a'",
        "a",
        Some(settings.default_group.as_str()),
    )?;
    bench.save(&settings.session_file)?;

    let store = FsSnapshotStore::new(settings.archive_dir.clone());
    let key = store.save(bench.records())?;

    let mut restored = Workbench::load(&settings.session_file)?;
    restored.clear();
    restored.replace_all(store.load(&key)?.data);

    assert_eq!(restored.records(), bench.records());
    assert_eq!(restored.records()[0].group, "Nightly");
    Ok(())
}
