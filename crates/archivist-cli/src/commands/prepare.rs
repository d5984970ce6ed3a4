//! Prepare command implementation.

use crate::cli::PrepareArgs;
use crate::error::Result;
use crate::output::Formatter;
use archivist_domain::{
    ArchiveRequest, ArchivistClient, ClusterProblem, PrepareDocumentsResponse, Resolution,
    RetryPolicy,
};
use archivist_ingest::{invoke, CallPolicy};
use tracing::info;

/// Call `PrepareDocuments` under `policy` and classify the outcome
///
/// An archive failure is a soft result; an escalation reported by the runner
/// is returned as the error.
pub async fn prepare_once<C>(
    client: &C,
    key: &str,
    request: &ArchiveRequest,
    policy: &CallPolicy,
) -> std::result::Result<Resolution<PrepareDocumentsResponse>, ClusterProblem>
where
    C: ArchivistClient + ?Sized,
{
    invoke(policy, move |_| client.prepare_documents(key, request.clone())).await
}

/// Execute the prepare command.
pub async fn execute_prepare<C>(args: PrepareArgs, client: &C, formatter: &Formatter) -> Result<()>
where
    C: ArchivistClient + ?Sized,
{
    let request = ArchiveRequest::new(args.archive_url.clone());
    info!("Prepare documents {}: '{}'", args.key, args.archive_url);

    // Ingestion can take minutes; only the transport timeout applies
    let policy = CallPolicy::new(
        None,
        RetryPolicy::new(args.retries, RetryPolicy::default().base_delay()),
    );
    let outcome = prepare_once(client, &args.key, &request, &policy).await?;

    println!("{}", formatter.format_prepare(&args.archive_url, &outcome)?);
    Ok(())
}
