//! Load-test command implementation.
//!
//! Replicates one single-document call `times` times with bounded
//! concurrency. Each call gets a fresh key, so the calls spread over the
//! runner's shards. Soft results count as successes.

use super::analyze::{analyze_once, single_document_policy};
use crate::cli::LoadTestArgs;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use archivist_domain::{AnalyzeDocumentRequest, DocumentDispatcher, Resolution};
use archivist_ingest::CallPolicy;
use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::time::{Duration, Instant};
use tracing::{info, warn};
use uuid::Uuid;

/// What to send and how hard
#[derive(Debug, Clone)]
pub struct LoadTestSettings {
    /// Number of calls
    pub times: usize,
    /// Calls in flight at once
    pub concurrency: usize,
    /// Document text sent with every call
    pub document: String,
    /// Timeout and retry budget per call
    pub policy: CallPolicy,
}

/// Outcome counts of a load test
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoadTestReport {
    /// Calls that completed, soft results included
    pub successes: usize,
    /// Subset of `successes` that were degraded domain failures
    pub soft_results: usize,
    /// Calls that escalated
    pub failures: usize,
    /// Wall-clock time of the whole run
    #[serde(rename = "elapsed_ms", serialize_with = "as_millis")]
    pub elapsed: Duration,
}

fn as_millis<S>(elapsed: &Duration, serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_u64(elapsed.as_millis() as u64)
}

impl LoadTestReport {
    /// Total calls made
    pub fn total(&self) -> usize {
        self.successes + self.failures
    }
}

/// Run the load test against `client`
pub async fn run_load_test<C>(client: &C, settings: &LoadTestSettings) -> LoadTestReport
where
    C: DocumentDispatcher + ?Sized,
{
    let started = Instant::now();
    let mut report = LoadTestReport::default();

    let mut outcomes = stream::iter(0..settings.times)
        .map(move |i| async move {
            let key = format!("node-{}", Uuid::now_v7());
            let request =
                AnalyzeDocumentRequest::new(format!("document-{}", i), settings.document.clone());
            info!("Analyze document {}: '{}'", key, request.name);
            analyze_once(client, &key, &request, &settings.policy).await
        })
        .buffer_unordered(settings.concurrency.max(1));

    while let Some(outcome) = outcomes.next().await {
        match outcome {
            Ok(Resolution::Success(_)) => report.successes += 1,
            Ok(Resolution::Soft(soft)) => {
                info!("{}: {}", soft.message, soft.detail);
                report.successes += 1;
                report.soft_results += 1;
            }
            Err(problem) => {
                warn!("Result failed: {}", problem);
                report.failures += 1;
            }
        }
    }

    report.elapsed = started.elapsed();
    report
}

/// Execute the load-test command.
pub async fn execute_load_test<C>(args: LoadTestArgs, client: &C, formatter: &Formatter) -> Result<()>
where
    C: DocumentDispatcher + ?Sized,
{
    if args.concurrency == 0 {
        return Err(CliError::InvalidInput(
            "Concurrency must be greater than 0".to_string(),
        ));
    }
    if args.timeout_ms == 0 {
        return Err(CliError::InvalidInput(
            "Timeout must be greater than 0".to_string(),
        ));
    }

    let settings = LoadTestSettings {
        times: args.times,
        concurrency: args.concurrency,
        document: args.document,
        policy: single_document_policy(args.timeout_ms, args.retries),
    };
    let report = run_load_test(client, &settings).await;

    println!("{}", formatter.format_load_test(&report)?);
    Ok(())
}
