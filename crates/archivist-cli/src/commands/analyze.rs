//! Analyze command implementation.

use crate::cli::AnalyzeArgs;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use archivist_domain::{
    AnalyzeDocumentRequest, AnalyzeDocumentResponse, ClusterProblem, DocumentDispatcher,
    Resolution,
};
use archivist_ingest::{invoke, CallPolicy, IngestConfig};
use tracing::info;

/// Call `AnalyzeDocument` once under `policy` and classify the outcome
pub async fn analyze_once<C>(
    client: &C,
    key: &str,
    request: &AnalyzeDocumentRequest,
    policy: &CallPolicy,
) -> std::result::Result<Resolution<AnalyzeDocumentResponse>, ClusterProblem>
where
    C: DocumentDispatcher + ?Sized,
{
    invoke(policy, move |_| client.analyze_document(key, request.clone())).await
}

/// Policy for `timeout_ms` per attempt and `retries` extra attempts
///
/// Retries back off exponentially from 1s.
pub fn single_document_policy(timeout_ms: u64, retries: u32) -> CallPolicy {
    IngestConfig {
        single_call_timeout_ms: timeout_ms,
        single_call_retries: retries,
        ..IngestConfig::default()
    }
    .single_document_policy()
}

/// Execute the analyze command.
pub async fn execute_analyze<C>(args: AnalyzeArgs, client: &C, formatter: &Formatter) -> Result<()>
where
    C: DocumentDispatcher + ?Sized,
{
    if args.timeout_ms == 0 {
        return Err(CliError::InvalidInput(
            "Timeout must be greater than 0".to_string(),
        ));
    }

    let content = match (&args.content, &args.file) {
        (Some(content), _) => content.clone(),
        (None, Some(path)) => tokio::fs::read_to_string(path).await?,
        (None, None) => {
            return Err(CliError::InvalidInput(
                "Provide the document with --content or --file".to_string(),
            ))
        }
    };

    let key = args.key.clone().unwrap_or_else(|| args.name.clone());
    let request = AnalyzeDocumentRequest::new(args.name.clone(), content);
    info!("Analyze document {}: '{}'", key, args.name);

    let policy = single_document_policy(args.timeout_ms, args.retries);
    let outcome = analyze_once(client, &key, &request, &policy).await?;

    println!("{}", formatter.format_analysis(&args.name, &outcome)?);
    Ok(())
}
