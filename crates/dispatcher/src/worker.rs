//! Worker - executes one work item and publishes its outcome

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tokio::sync::{mpsc, Semaphore};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, trace};

use contracts::{Operation, Outcome, WorkFailure, WorkItem};

use crate::metrics::DispatcherMetrics;

/// Everything a worker shares with its dispatch
pub(crate) struct WorkerContext<O: Operation> {
    pub operation: Arc<O>,
    /// Completion channel, sized to the item count so a publish never waits
    pub tx: mpsc::Sender<Outcome<O::Output>>,
    /// Fired by the collector at the deadline (cancel policy only)
    pub cancel: CancellationToken,
    /// Concurrency bound, if configured
    pub permits: Option<Arc<Semaphore>>,
    pub metrics: Arc<DispatcherMetrics>,
    /// Dispatch start, used for outcome elapsed times
    pub started: Instant,
}

/// Keeps the live-worker gauge correct on every exit path
struct ActiveWorker<'a> {
    metrics: &'a DispatcherMetrics,
    operation: &'a str,
}

impl<'a> ActiveWorker<'a> {
    fn enter(metrics: &'a DispatcherMetrics, operation: &'a str) -> Self {
        let active = metrics.worker_started();
        observability::record_active_workers(operation, active);
        Self { metrics, operation }
    }
}

impl Drop for ActiveWorker<'_> {
    fn drop(&mut self) {
        let active = self.metrics.worker_exited();
        observability::record_active_workers(self.operation, active);
    }
}

/// Worker task body
///
/// Runs the operation for one item, racing it against deadline cancellation,
/// then publishes exactly one outcome. A cancelled worker publishes nothing;
/// dropping the in-flight operation releases whatever it had open.
#[instrument(
    name = "fanout_worker",
    skip(ctx, item),
    fields(operation = %ctx.operation.name(), item = %item)
)]
pub(crate) async fn run_worker<O>(ctx: WorkerContext<O>, item: WorkItem, position: usize)
where
    O: Operation + Sync + 'static,
    O::Output: Send + 'static,
{
    let operation = Arc::clone(&ctx.operation);
    let _active = ActiveWorker::enter(&ctx.metrics, operation.name());

    let outcome = tokio::select! {
        outcome = execute(&ctx, item, position) => outcome,
        _ = ctx.cancel.cancelled() => {
            ctx.metrics.inc_cancelled_count();
            observability::record_worker_cancelled(operation.name());
            debug!("Deadline reached, worker cancelled");
            return;
        }
    };

    publish(&ctx, outcome).await;
}

/// Validate and execute, turning every failure mode into an outcome
async fn execute<O>(ctx: &WorkerContext<O>, item: WorkItem, position: usize) -> Outcome<O::Output>
where
    O: Operation + Sync,
{
    // Never closed; a closed semaphore would just mean no bound.
    let _permit = match &ctx.permits {
        Some(permits) => permits.acquire().await.ok(),
        None => None,
    };

    if item.is_blank() {
        let reason = WorkFailure::invalid_item(&item, "descriptor is blank");
        return Outcome::failure(item, position, reason, ctx.started.elapsed());
    }

    match std::panic::catch_unwind(AssertUnwindSafe(|| ctx.operation.validate(&item))) {
        Ok(Ok(())) => {}
        Ok(Err(reason)) => {
            let reason = WorkFailure::invalid_item(&item, reason);
            return Outcome::failure(item, position, reason, ctx.started.elapsed());
        }
        Err(payload) => {
            let reason = WorkFailure::panicked(panic_message(payload.as_ref()));
            return Outcome::failure(item, position, reason, ctx.started.elapsed());
        }
    }

    trace!("Executing operation");
    let result = AssertUnwindSafe(ctx.operation.execute(&item))
        .catch_unwind()
        .await;

    let elapsed = ctx.started.elapsed();
    match result {
        Ok(Ok(value)) => Outcome::success(item, position, value, elapsed),
        Ok(Err(e)) => Outcome::failure(item, position, WorkFailure::Operation(e), elapsed),
        Err(payload) => {
            let reason = WorkFailure::panicked(panic_message(payload.as_ref()));
            Outcome::failure(item, position, reason, elapsed)
        }
    }
}

/// Publish the outcome; never blocks because the channel has a slot per item
async fn publish<O: Operation>(ctx: &WorkerContext<O>, outcome: Outcome<O::Output>) {
    let success = outcome.is_success();
    ctx.metrics.inc_published(success);
    observability::record_outcome(
        ctx.operation.name(),
        success,
        outcome.elapsed.as_secs_f64() * 1000.0,
    );

    if let Some(reason) = outcome.failure_reason() {
        debug!(error = %reason, "Worker finished with failure");
    } else {
        debug!("Worker finished");
    }

    if ctx.tx.send(outcome).await.is_err() {
        debug!("Collector already returned, outcome discarded");
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockBehavior, MockOperation};
    use std::time::Duration;

    fn context(
        operation: MockOperation,
        capacity: usize,
    ) -> (WorkerContext<MockOperation>, mpsc::Receiver<Outcome<String>>) {
        let (tx, rx) = mpsc::channel(capacity);
        let ctx = WorkerContext {
            operation: Arc::new(operation),
            tx,
            cancel: CancellationToken::new(),
            permits: None,
            metrics: Arc::new(DispatcherMetrics::new()),
            started: Instant::now(),
        };
        (ctx, rx)
    }

    #[tokio::test]
    async fn test_blank_item_is_failure_outcome() {
        let op = MockOperation::new("mock");
        let stats = op.stats();
        let (ctx, mut rx) = context(op, 1);

        run_worker(ctx, WorkItem::new("   "), 0).await;

        let outcome = rx.recv().await.unwrap();
        assert!(matches!(
            outcome.failure_reason(),
            Some(WorkFailure::InvalidWorkItem { .. })
        ));
        // Operation never ran
        assert_eq!(stats.started(), 0);
    }

    #[tokio::test]
    async fn test_validate_rejection_is_failure_outcome() {
        let op = MockOperation::new("mock").reject("bad");
        let (ctx, mut rx) = context(op, 1);

        run_worker(ctx, WorkItem::new("bad"), 3).await;

        let outcome = rx.recv().await.unwrap();
        assert_eq!(outcome.position, 3);
        assert!(matches!(
            outcome.failure_reason(),
            Some(WorkFailure::InvalidWorkItem { reason, .. }) if reason.contains("rejected")
        ));
    }

    #[tokio::test]
    async fn test_panic_is_contained() {
        let op = MockOperation::new("mock").on("boom", MockBehavior::Panic);
        let (ctx, mut rx) = context(op, 1);
        let metrics = Arc::clone(&ctx.metrics);

        run_worker(ctx, WorkItem::new("boom"), 0).await;

        let outcome = rx.recv().await.unwrap();
        assert!(matches!(
            outcome.failure_reason(),
            Some(WorkFailure::Panicked { message }) if message.contains("boom")
        ));
        assert_eq!(metrics.active_workers(), 0);
    }

    #[tokio::test]
    async fn test_validate_panic_is_contained() {
        let op = MockOperation::new("mock").panic_on_validate("bad");
        let stats = op.stats();
        let (ctx, mut rx) = context(op, 1);
        let metrics = Arc::clone(&ctx.metrics);

        run_worker(ctx, WorkItem::new("bad"), 2).await;

        let outcome = rx.recv().await.unwrap();
        assert_eq!(outcome.position, 2);
        assert!(matches!(
            outcome.failure_reason(),
            Some(WorkFailure::Panicked { message }) if message.contains("validate")
        ));
        assert_eq!(stats.started(), 0);
        assert_eq!(metrics.published_count(), 1);
        assert_eq!(metrics.active_workers(), 0);
    }

    #[tokio::test]
    async fn test_publish_after_collector_gone_does_not_block() {
        let op = MockOperation::new("mock");
        let (ctx, rx) = context(op, 1);
        let metrics = Arc::clone(&ctx.metrics);
        drop(rx);

        tokio::time::timeout(
            Duration::from_secs(1),
            run_worker(ctx, WorkItem::new("a"), 0),
        )
        .await
        .expect("worker must exit even with no collector");

        assert_eq!(metrics.published_count(), 1);
        assert_eq!(metrics.active_workers(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation_drops_operation_and_resources() {
        let op = MockOperation::new("mock").with_default(MockBehavior::Hang);
        let stats = op.stats();
        let (ctx, mut rx) = context(op, 1);
        let cancel = ctx.cancel.clone();
        let metrics = Arc::clone(&ctx.metrics);

        let handle = tokio::spawn(run_worker(ctx, WorkItem::new("slow"), 0));
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(stats.open_resources(), 1);

        cancel.cancel();
        handle.await.unwrap();

        assert_eq!(stats.open_resources(), 0);
        assert_eq!(metrics.cancelled_count(), 1);
        assert_eq!(metrics.active_workers(), 0);
        assert!(rx.recv().await.is_none());
    }
}
