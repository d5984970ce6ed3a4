//! Classified invocation of a single entity call
//!
//! Wraps one call through the substrate with an optional per-attempt timeout
//! and a retry budget, then applies the classification policy: success,
//! soft result for a domain failure, or a `ClusterProblem`.

use archivist_domain::{
    resolve, Classify, ClusterProblem, InvokeError, Resolution, RetryPolicy, SubstrateError,
};
use crate::config::DEFAULT_SINGLE_CALL_TIMEOUT_MS;
use std::future::Future;
use std::time::Duration;
use tokio::time::timeout;

/// Timeout and retry budget of one logical call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallPolicy {
    /// Limit per attempt; `None` waits indefinitely
    pub timeout: Option<Duration>,
    /// Retries after transient failures
    pub retry: RetryPolicy,
}

impl CallPolicy {
    /// Policy with the given limits
    pub fn new(timeout: Option<Duration>, retry: RetryPolicy) -> Self {
        Self { timeout, retry }
    }

    /// Single-document default: 3 seconds, no extra attempts
    pub fn single_document() -> Self {
        Self::new(
            Some(Duration::from_millis(DEFAULT_SINGLE_CALL_TIMEOUT_MS)),
            RetryPolicy::none(),
        )
    }
}

/// Run `op` under `policy` and classify the outcome
///
/// `op` receives the 0-based attempt number. A timed-out attempt counts as a
/// transient `SubstrateError::Timeout`.
pub async fn invoke<T, E, F, Fut>(
    policy: &CallPolicy,
    mut op: F,
) -> Result<Resolution<T>, ClusterProblem>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, InvokeError<E>>>,
    InvokeError<E>: Classify,
{
    let limit = policy.timeout;
    let result = policy
        .retry
        .run_if(
            move |attempt| {
                let call = op(attempt);
                async move {
                    match limit {
                        Some(limit) => timeout(limit, call)
                            .await
                            .unwrap_or_else(|_| Err(SubstrateError::Timeout(limit).into())),
                        None => call.await,
                    }
                }
            },
            InvokeError::is_retryable,
        )
        .await;

    resolve(result)
}
