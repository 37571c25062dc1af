//! Dispatcher configuration contracts that can be shared across crates.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// What happens to workers still running when the deadline fires
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeadlinePolicy {
    /// Signal cancellation; running operations are dropped at their next await point
    #[default]
    Cancel,
    /// Let workers finish; their outcomes go into the buffered channel unobserved
    Abandon,
}

/// Dispatcher configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatcherConfig {
    /// Dispatch deadline in milliseconds, measured from dispatch start
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Maximum number of operations running at once (None = one task per item, unbounded)
    #[serde(default)]
    pub max_concurrency: Option<usize>,

    /// Handling of workers still running at the deadline
    #[serde(default)]
    pub deadline_policy: DeadlinePolicy,

    /// Maximum number of items accepted by one dispatch
    #[serde(default)]
    pub max_items: Option<usize>,
}

fn default_timeout_ms() -> u64 {
    5000
}

impl DispatcherConfig {
    /// Default dispatch timeout as a `Duration`
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
            max_concurrency: None,
            deadline_policy: DeadlinePolicy::default(),
            max_items: None,
        }
    }
}
