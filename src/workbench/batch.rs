use futures_util::{stream, StreamExt};
use tracing::info;

use crate::executor::RequestExecutor;

use super::{
    record::{RecordError, RecordStatus},
    store::Workbench,
};

#[derive(Debug, Clone, Default)]
pub struct BatchOptions<'a> {
    pub override_token: Option<&'a str>,
    /// Maximum number of requests in flight; `None` runs the whole batch at once.
    pub concurrency: Option<usize>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
}

/// Executes the pending records named by `ids` concurrently.
///
/// Every record is moved to `Processing` before the first request goes out.
/// Responses are attached in completion order, `on_progress(completed, total)`
/// fires after each one, and a failing request never stops the batch. Diffs
/// are computed only after the whole batch has settled, in timestamp order, so
/// completion order cannot change which response a record is compared with.
pub async fn run_batch<F>(
    workbench: &mut Workbench,
    executor: &RequestExecutor,
    ids: &[String],
    options: BatchOptions<'_>,
    mut on_progress: F,
) -> Result<BatchOutcome, RecordError>
where
    F: FnMut(usize, usize),
{
    let mut unique: Vec<String> = Vec::with_capacity(ids.len());
    for id in ids {
        if !unique.contains(id) {
            unique.push(id.clone());
        }
    }

    for id in &unique {
        let record = workbench
            .get(id)
            .ok_or_else(|| RecordError::NotFound(id.clone()))?;
        if record.status != RecordStatus::Pending {
            return Err(RecordError::InvalidTransition {
                id: id.clone(),
                from: record.status,
                to: RecordStatus::Processing,
            });
        }
    }

    let mut started = Vec::with_capacity(unique.len());
    for id in &unique {
        started.push(workbench.begin(id)?);
    }

    let total = started.len();
    let mut outcome = BatchOutcome {
        total,
        ..BatchOutcome::default()
    };
    if total == 0 {
        return Ok(outcome);
    }

    let limit = options.concurrency.unwrap_or(total).max(1);
    let override_token = options.override_token;
    info!(total, limit, "running batch");

    let mut in_flight = stream::iter(started.into_iter().map(|record| {
        let executor = executor.clone();
        async move {
            let envelope = executor.execute(&record.request, override_token).await;
            (record.id, envelope)
        }
    }))
    .buffer_unordered(limit);

    let mut completed = 0;
    while let Some((id, envelope)) = in_flight.next().await {
        let record = workbench.complete(&id, envelope)?;
        if record.status == RecordStatus::Success {
            outcome.succeeded += 1;
        } else {
            outcome.failed += 1;
        }
        completed += 1;
        on_progress(completed, total);
    }

    workbench.refresh_diffs(&unique)?;
    info!(
        succeeded = outcome.succeeded,
        failed = outcome.failed,
        "batch finished"
    );
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::executor::testing::ScriptedTransport;
    use crate::executor::ResponseBody;
    use serde_json::json;

    fn executor(transport: ScriptedTransport) -> RequestExecutor {
        RequestExecutor::new(Arc::new(transport))
    }

    fn submit(bench: &mut Workbench, url: &str, key: &str) -> String {
        bench
            .submit(&format!("curl --url '{url}'"), key, None)
            .unwrap()
            .id
            .clone()
    }

    #[tokio::test]
    async fn batch_reaches_terminal_states_and_reports_progress() {
        let mut bench = Workbench::new();
        let ok = submit(&mut bench, "https://api.example.com/ok", "k");
        let down = submit(&mut bench, "https://api.example.com/down", "k");
        let missing = submit(&mut bench, "https://api.example.com/missing", "other");

        let executor = executor(
            ScriptedTransport::default()
                .respond("https://api.example.com/ok", 200, "{\"a\":1}")
                .fail("https://api.example.com/down", "connection refused")
                .respond("https://api.example.com/missing", 404, "not found"),
        );

        let mut progress = Vec::new();
        let outcome = run_batch(
            &mut bench,
            &executor,
            &[ok.clone(), down.clone(), missing.clone()],
            BatchOptions::default(),
            |done, total| progress.push((done, total)),
        )
        .await
        .unwrap();

        assert_eq!(
            outcome,
            BatchOutcome {
                total: 3,
                succeeded: 1,
                failed: 2
            }
        );
        assert_eq!(progress, vec![(1, 3), (2, 3), (3, 3)]);
        assert_eq!(bench.get(&ok).unwrap().status, RecordStatus::Success);
        assert_eq!(bench.get(&down).unwrap().status, RecordStatus::Error);
        assert_eq!(
            bench.get(&down).unwrap().failure_reason(),
            Some("connection refused")
        );
        assert_eq!(
            bench.get(&missing).unwrap().response.as_ref().unwrap().body,
            ResponseBody::Raw("not found".to_string())
        );
        assert!(bench.records().iter().all(|r| r.status.is_terminal()));
    }

    #[tokio::test]
    async fn batch_diffs_against_earlier_same_key_records() {
        let mut bench = Workbench::new();
        let first = submit(&mut bench, "https://api.example.com/v1", "users");
        let second = submit(&mut bench, "https://api.example.com/v2", "users");

        let executor = executor(
            ScriptedTransport::default()
                .respond("https://api.example.com/v1", 200, "{\"name\":\"a\"}")
                .respond("https://api.example.com/v2", 200, "{\"name\":\"a\",\"extra\":true}"),
        );

        run_batch(
            &mut bench,
            &executor,
            &[second.clone(), first.clone()],
            BatchOptions {
                override_token: Some("token"),
                concurrency: Some(1),
            },
            |_, _| {},
        )
        .await
        .unwrap();

        assert!(bench.get(&first).unwrap().diff.is_none());
        let diff = bench.get(&second).unwrap().diff.clone().unwrap();
        assert_eq!(diff.entries().len(), 1);
        assert_eq!(diff.entries()[0].path, "extra");
        assert_eq!(diff.entries()[0].new, Some(json!(true)));
    }

    #[tokio::test]
    async fn batch_refuses_records_that_are_not_pending() {
        let mut bench = Workbench::new();
        let id = submit(&mut bench, "https://api.example.com/ok", "k");
        let executor = executor(
            ScriptedTransport::default().respond("https://api.example.com/ok", 200, "{}"),
        );

        run_batch(&mut bench, &executor, &[id.clone()], BatchOptions::default(), |_, _| {})
            .await
            .unwrap();
        let err = run_batch(&mut bench, &executor, &[id.clone()], BatchOptions::default(), |_, _| {})
            .await
            .unwrap_err();

        assert!(matches!(err, RecordError::InvalidTransition { .. }));
        assert_eq!(bench.get(&id).unwrap().status, RecordStatus::Success);
    }
}
