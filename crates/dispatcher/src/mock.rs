//! Mock operation
//!
//! Scripted latencies and failures for tests and demos without a network.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use contracts::{Operation, OperationError, WorkItem};
use tracing::trace;

/// What the mock does for one item
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockBehavior {
    /// Sleep, then return the descriptor as the value
    Succeed { delay: Duration },
    /// Sleep, then fail with the given message
    Fail { delay: Duration, message: String },
    /// Panic inside `execute`
    Panic,
    /// Never complete
    Hang,
}

impl MockBehavior {
    pub fn succeed_after(delay: Duration) -> Self {
        Self::Succeed { delay }
    }

    pub fn fail_after(delay: Duration, message: impl Into<String>) -> Self {
        Self::Fail {
            delay,
            message: message.into(),
        }
    }
}

impl Default for MockBehavior {
    fn default() -> Self {
        Self::Succeed {
            delay: Duration::ZERO,
        }
    }
}

/// Counters observed from outside the mock
#[derive(Debug, Default)]
pub struct MockStats {
    started: AtomicU64,
    completed: AtomicU64,
    open_resources: AtomicUsize,
}

impl MockStats {
    /// Executions that began
    pub fn started(&self) -> u64 {
        self.started.load(Ordering::SeqCst)
    }

    /// Executions that returned (success or failure)
    pub fn completed(&self) -> u64 {
        self.completed.load(Ordering::SeqCst)
    }

    /// Resources currently held by in-flight executions
    pub fn open_resources(&self) -> usize {
        self.open_resources.load(Ordering::SeqCst)
    }
}

/// Stand-in for a response stream: held for the whole execution
struct MockResource {
    stats: Arc<MockStats>,
}

impl MockResource {
    fn open(stats: &Arc<MockStats>) -> Self {
        stats.open_resources.fetch_add(1, Ordering::SeqCst);
        Self {
            stats: Arc::clone(stats),
        }
    }
}

impl Drop for MockResource {
    fn drop(&mut self) {
        self.stats.open_resources.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Mock operation
///
/// Behaviour is chosen per descriptor, falling back to a default.
#[derive(Debug, Clone)]
pub struct MockOperation {
    name: String,
    behaviors: HashMap<String, MockBehavior>,
    default_behavior: MockBehavior,
    rejected: HashSet<String>,
    validate_panics: HashSet<String>,
    stats: Arc<MockStats>,
}

impl MockOperation {
    /// Create a mock that succeeds immediately for every item
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            behaviors: HashMap::new(),
            default_behavior: MockBehavior::default(),
            rejected: HashSet::new(),
            validate_panics: HashSet::new(),
            stats: Arc::new(MockStats::default()),
        }
    }

    /// Set the behaviour for items without a specific one
    pub fn with_default(mut self, behavior: MockBehavior) -> Self {
        self.default_behavior = behavior;
        self
    }

    /// Set the behaviour for one descriptor
    pub fn on(mut self, descriptor: impl Into<String>, behavior: MockBehavior) -> Self {
        self.behaviors.insert(descriptor.into(), behavior);
        self
    }

    /// Make `validate` reject a descriptor
    pub fn reject(mut self, descriptor: impl Into<String>) -> Self {
        self.rejected.insert(descriptor.into());
        self
    }

    /// Make `validate` panic for a descriptor
    pub fn panic_on_validate(mut self, descriptor: impl Into<String>) -> Self {
        self.validate_panics.insert(descriptor.into());
        self
    }

    /// Shared counters
    pub fn stats(&self) -> Arc<MockStats> {
        Arc::clone(&self.stats)
    }

    fn behavior_for(&self, item: &WorkItem) -> &MockBehavior {
        self.behaviors
            .get(item.as_str())
            .unwrap_or(&self.default_behavior)
    }
}

impl Operation for MockOperation {
    type Output = String;

    fn name(&self) -> &str {
        &self.name
    }

    fn validate(&self, item: &WorkItem) -> Result<(), String> {
        if self.validate_panics.contains(item.as_str()) {
            panic!("mock '{}' validate panicked on {item}", self.name);
        }
        if self.rejected.contains(item.as_str()) {
            return Err(format!("'{item}' rejected by mock"));
        }
        Ok(())
    }

    async fn execute(&self, item: &WorkItem) -> Result<String, OperationError> {
        self.stats.started.fetch_add(1, Ordering::SeqCst);
        let _resource = MockResource::open(&self.stats);

        let result = match self.behavior_for(item) {
            MockBehavior::Succeed { delay } => {
                tokio::time::sleep(*delay).await;
                Ok(item.as_str().to_string())
            }
            MockBehavior::Fail { delay, message } => {
                tokio::time::sleep(*delay).await;
                Err(OperationError::other(message.clone()))
            }
            MockBehavior::Panic => panic!("mock '{}' panicked on {item}", self.name),
            MockBehavior::Hang => std::future::pending().await,
        };

        trace!(item = %item, ok = result.is_ok(), "Mock execution finished");
        self.stats.completed.fetch_add(1, Ordering::SeqCst);
        result
    }
}
