//! In-process task queue for batch ingestion.
//!
//! Tasks are sent over an unbounded channel to a worker on the runtime. The
//! worker gives each task its own timer, so a task runs `delay` after it was
//! received regardless of how long earlier tasks take, and then runs the
//! ingestion on the blocking pool. Failures are logged; nothing is retried and
//! pending tasks are lost when the process exits.

use std::sync::Arc;

use tokio::sync::mpsc;
use umlhub_indexer::Indexer;
use umlhub_indexer::batch::{IngestTask, QueueError, TaskQueue};
use umlhub_model::RequestContext;

/// [`TaskQueue`] backed by a tokio channel.
pub struct LocalTaskQueue {
    sender: mpsc::UnboundedSender<IngestTask>,
}

impl LocalTaskQueue {
    /// Start the worker. Must be called from within a tokio runtime.
    pub fn start(indexer: Arc<Indexer>) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        tokio::spawn(run_worker(receiver, indexer));
        Self { sender }
    }
}

impl TaskQueue for LocalTaskQueue {
    fn enqueue(&self, task: IngestTask) -> Result<(), QueueError> {
        self.sender.send(task).map_err(|_| QueueError::Closed)
    }
}

async fn run_worker(mut receiver: mpsc::UnboundedReceiver<IngestTask>, indexer: Arc<Indexer>) {
    while let Some(task) = receiver.recv().await {
        let indexer = Arc::clone(&indexer);
        tokio::spawn(async move {
            tokio::time::sleep(task.delay).await;
            run_task(indexer, task.url).await;
        });
    }
    tracing::debug!("Task queue closed");
}

async fn run_task(indexer: Arc<Indexer>, url: String) {
    let ctx = RequestContext::new();
    let request_id = ctx.request_id().to_owned();
    let origin = url.clone();

    let result = tokio::task::spawn_blocking(move || indexer.ingest_url(&ctx, &url)).await;

    match result {
        Ok(Ok(report)) => tracing::info!(
            request_id = %request_id,
            origin = %origin,
            indexed = report.indexed.len(),
            "Batch task finished"
        ),
        Ok(Err(e)) => tracing::error!(
            request_id = %request_id,
            origin = %origin,
            error = %e,
            "Batch task failed"
        ),
        Err(e) => tracing::error!(
            request_id = %request_id,
            origin = %origin,
            error = %e,
            "Batch task panicked"
        ),
    }
}
