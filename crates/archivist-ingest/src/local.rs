//! In-process dispatch to a local worker

use crate::worker::DocumentWorker;
use archivist_domain::{
    AnalyzeDocumentRequest, AnalyzeDocumentResponse, AnalyzeError, CompletionProvider,
    DocumentDispatcher, GraphClient, InvokeError, SubstrateError,
};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::error;

/// Aborts the task when the awaiting call is dropped
struct AbortOnDrop<T>(JoinHandle<T>);

impl<T> Drop for AbortOnDrop<T> {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Runs `AnalyzeDocument` calls on a worker in this process
///
/// Each call runs on its own task, so a panicking handler surfaces as a
/// substrate failure instead of unwinding into the caller. Dropping the call
/// aborts the task.
pub struct LocalDispatcher<P, G>
where
    P: CompletionProvider,
    G: GraphClient,
{
    worker: Arc<DocumentWorker<P, G>>,
}

impl<P, G> LocalDispatcher<P, G>
where
    P: CompletionProvider,
    G: GraphClient,
{
    /// Dispatch to `worker`
    pub fn new(worker: Arc<DocumentWorker<P, G>>) -> Self {
        Self { worker }
    }

    /// The worker calls are sent to
    pub fn worker(&self) -> &Arc<DocumentWorker<P, G>> {
        &self.worker
    }
}

#[async_trait]
impl<P, G> DocumentDispatcher for LocalDispatcher<P, G>
where
    P: CompletionProvider + 'static,
    G: GraphClient + 'static,
{
    async fn analyze_document(
        &self,
        _key: &str,
        request: AnalyzeDocumentRequest,
    ) -> Result<AnalyzeDocumentResponse, InvokeError<AnalyzeError>> {
        let worker = Arc::clone(&self.worker);
        let mut task = AbortOnDrop(tokio::spawn(async move {
            worker.analyze_document(request).await
        }));

        match (&mut task.0).await {
            Ok(result) => result.map_err(InvokeError::Rpc),
            Err(e) => {
                error!("Document handler did not complete: {}", e);
                Err(SubstrateError::Remote(format!("Handler did not complete: {}", e)).into())
            }
        }
    }
}
