//! Dispatcher - fan-out to workers and collect until complete or deadline

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, Semaphore};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use contracts::{Completion, DeadlinePolicy, DispatcherConfig, Operation, ResultSet, WorkItem};

use crate::error::DispatchError;
use crate::metrics::{DispatcherMetrics, MetricsSnapshot};
use crate::worker::{run_worker, WorkerContext};

/// Builder for creating a Dispatcher
pub struct DispatcherBuilder<O> {
    operation: O,
    config: DispatcherConfig,
}

impl<O> DispatcherBuilder<O>
where
    O: Operation + Sync + 'static,
    O::Output: Send + 'static,
{
    /// Create a new DispatcherBuilder with default configuration
    pub fn new(operation: O) -> Self {
        Self {
            operation,
            config: DispatcherConfig::default(),
        }
    }

    /// Replace the whole configuration
    pub fn config(mut self, config: DispatcherConfig) -> Self {
        self.config = config;
        self
    }

    /// Default timeout used by [`Dispatcher::dispatch_default`]
    ///
    /// Rounded up to whole milliseconds, so any positive duration stays positive.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout_ms =
            u64::try_from(timeout.as_nanos().div_ceil(1_000_000)).unwrap_or(u64::MAX);
        self
    }

    pub fn max_concurrency(mut self, max: usize) -> Self {
        self.config.max_concurrency = Some(max);
        self
    }

    pub fn deadline_policy(mut self, policy: DeadlinePolicy) -> Self {
        self.config.deadline_policy = policy;
        self
    }

    pub fn max_items(mut self, max: usize) -> Self {
        self.config.max_items = Some(max);
        self
    }

    /// Validate the configuration and build the dispatcher
    pub fn build(self) -> Result<Dispatcher<O>, DispatchError> {
        if self.config.timeout_ms == 0 {
            return Err(DispatchError::invalid_config(
                "timeout_ms",
                "must be > 0",
            ));
        }
        if self.config.max_concurrency == Some(0) {
            return Err(DispatchError::invalid_config(
                "max_concurrency",
                "must be >= 1 when set",
            ));
        }
        if self.config.max_items == Some(0) {
            return Err(DispatchError::invalid_config(
                "max_items",
                "must be >= 1 when set",
            ));
        }

        Ok(Dispatcher {
            operation: Arc::new(self.operation),
            config: self.config,
            metrics: Arc::new(DispatcherMetrics::new()),
        })
    }
}

/// Fans work items out to one worker each and collects outcomes until every
/// item has reported or the deadline fires
///
/// Every call to [`dispatch`](Self::dispatch) owns its own channel, deadline
/// and cancellation token, so concurrent dispatches are independent.
pub struct Dispatcher<O> {
    operation: Arc<O>,
    config: DispatcherConfig,
    metrics: Arc<DispatcherMetrics>,
}

impl<O> Clone for Dispatcher<O> {
    fn clone(&self) -> Self {
        Self {
            operation: Arc::clone(&self.operation),
            config: self.config.clone(),
            metrics: Arc::clone(&self.metrics),
        }
    }
}

impl<O> Dispatcher<O>
where
    O: Operation + Sync + 'static,
    O::Output: Send + 'static,
{
    /// Create a dispatcher with default configuration
    pub fn new(operation: O) -> Self {
        Self {
            operation: Arc::new(operation),
            config: DispatcherConfig::default(),
            metrics: Arc::new(DispatcherMetrics::new()),
        }
    }

    /// Start building a dispatcher
    pub fn builder(operation: O) -> DispatcherBuilder<O> {
        DispatcherBuilder::new(operation)
    }

    pub fn operation(&self) -> &O {
        &self.operation
    }

    pub fn config(&self) -> &DispatcherConfig {
        &self.config
    }

    /// Shared counters, updated by every dispatch and worker
    pub fn metrics(&self) -> &Arc<DispatcherMetrics> {
        &self.metrics
    }

    /// Get snapshot of metrics
    pub fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Dispatch with the configured default timeout
    pub async fn dispatch_default(
        &self,
        items: Vec<WorkItem>,
    ) -> Result<ResultSet<O::Output>, DispatchError> {
        self.dispatch(items, self.config.timeout()).await
    }

    /// Run every item concurrently and collect outcomes for at most `timeout`
    ///
    /// Returns the outcomes observed before every item reported or the
    /// deadline fired, in arrival order. A short result set is a normal
    /// deadline result.
    ///
    /// # Errors
    /// Only precondition violations (zero timeout, too many items). They are
    /// reported before any worker is spawned.
    #[instrument(
        name = "dispatch",
        skip(self, items),
        fields(
            operation = %self.operation.name(),
            items = items.len(),
            timeout_ms = timeout.as_millis() as u64
        )
    )]
    pub async fn dispatch(
        &self,
        items: Vec<WorkItem>,
        timeout: Duration,
    ) -> Result<ResultSet<O::Output>, DispatchError> {
        if let Err(e) = self.check_preconditions(items.len(), timeout) {
            self.metrics.inc_rejected_count();
            observability::record_precondition_rejected(self.operation.name(), e.reason());
            warn!(error = %e, "Dispatch rejected");
            return Err(e);
        }

        self.metrics.inc_dispatch_count();
        let started = Instant::now();
        let expected = items.len();

        if expected == 0 {
            debug!("Empty item list, nothing to dispatch");
            return Ok(ResultSet::new(0).finish(Completion::Complete, Duration::ZERO));
        }

        let deadline = started.checked_add(timeout).unwrap_or_else(|| far_future(started));
        let (tx, mut rx) = mpsc::channel(expected);
        let cancel = CancellationToken::new();
        // Fires if the caller drops this future before the loop ends
        let _cancel_on_drop = (self.config.deadline_policy == DeadlinePolicy::Cancel)
            .then(|| cancel.clone().drop_guard());
        let permits = self
            .config
            .max_concurrency
            .map(|n| Arc::new(Semaphore::new(n)));

        for (position, item) in items.into_iter().enumerate() {
            let ctx = WorkerContext {
                operation: Arc::clone(&self.operation),
                tx: tx.clone(),
                cancel: cancel.clone(),
                permits: permits.clone(),
                metrics: Arc::clone(&self.metrics),
                started,
            };
            tokio::spawn(run_worker(ctx, item, position));
        }
        // Only workers hold senders now
        drop(tx);

        info!(
            workers = expected,
            max_concurrency = ?self.config.max_concurrency,
            "Workers spawned"
        );

        let mut results = ResultSet::new(expected);
        let expiry = tokio::time::sleep_until(deadline);
        tokio::pin!(expiry);

        let completion = loop {
            if results.len() == expected {
                break Completion::Complete;
            }

            tokio::select! {
                received = rx.recv() => match received {
                    Some(outcome) => {
                        debug!(
                            item = %outcome.item,
                            position = outcome.position,
                            success = outcome.is_success(),
                            "Outcome collected"
                        );
                        results.push(outcome);
                    }
                    None => {
                        warn!(
                            collected = results.len(),
                            expected,
                            "All workers exited before reporting"
                        );
                        break Completion::WorkersExited;
                    }
                },
                _ = &mut expiry => break Completion::DeadlineExpired,
            }
        };

        // Later publishes fail fast instead of queueing
        drop(rx);

        if completion == Completion::DeadlineExpired {
            self.metrics.inc_timeout_count();
            if self.config.deadline_policy == DeadlinePolicy::Cancel {
                cancel.cancel();
            }
        }

        let results = results.finish(completion, started.elapsed());
        self.metrics.add_collected(results.len());
        observability::record_dispatch(self.operation.name(), &results.summary());

        info!(
            collected = results.len(),
            expected,
            successes = results.success_count(),
            failures = results.failure_count(),
            completion = ?completion,
            elapsed_ms = results.elapsed().as_millis() as u64,
            "Dispatch finished"
        );

        Ok(results)
    }

    fn check_preconditions(&self, count: usize, timeout: Duration) -> Result<(), DispatchError> {
        if timeout.is_zero() {
            return Err(DispatchError::InvalidTimeout {
                timeout_ms: timeout.as_millis(),
            });
        }
        if let Some(max) = self.config.max_items {
            if count > max {
                return Err(DispatchError::TooManyItems { count, max });
            }
        }
        Ok(())
    }
}

/// Stand-in deadline for timeouts too large to add to an `Instant`
fn far_future(started: Instant) -> Instant {
    started + Duration::from_secs(86_400 * 365 * 30)
}

/// Convenience function to create a dispatcher from configuration
pub fn create_dispatcher<O>(
    operation: O,
    config: DispatcherConfig,
) -> Result<Dispatcher<O>, DispatchError>
where
    O: Operation + Sync + 'static,
    O::Output: Send + 'static,
{
    DispatcherBuilder::new(operation).config(config).build()
}

/// One-shot dispatch with default configuration and the given timeout
pub async fn dispatch<O>(
    operation: O,
    items: Vec<WorkItem>,
    timeout: Duration,
) -> Result<ResultSet<O::Output>, DispatchError>
where
    O: Operation + Sync + 'static,
    O::Output: Send + 'static,
{
    Dispatcher::new(operation).dispatch(items, timeout).await
}
