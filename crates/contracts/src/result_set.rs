//! ResultSet - outcomes collected by one dispatch, in arrival order

use serde::Serialize;
use std::time::Duration;

use crate::{Outcome, WorkFailure, WorkItem};

/// Why the collection loop stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Completion {
    /// One outcome was collected for every submitted item
    #[default]
    Complete,
    /// The deadline fired before every outcome arrived
    DeadlineExpired,
    /// Every worker exited but some never reported (runtime shutting down)
    WorkersExited,
}

/// Outcomes of a dispatch in the order the collector observed them
///
/// Grows monotonically while the collector runs and is frozen once handed
/// to the caller. A set shorter than [`expected`](Self::expected) is the
/// normal result of a deadline, not an error.
#[derive(Debug, Clone, Serialize)]
pub struct ResultSet<T> {
    outcomes: Vec<Outcome<T>>,
    expected: usize,
    completion: Completion,
    elapsed: Duration,
}

impl<T> ResultSet<T> {
    /// Create an empty set expecting `expected` outcomes (collector only)
    pub fn new(expected: usize) -> Self {
        Self {
            outcomes: Vec::with_capacity(expected),
            expected,
            completion: Completion::Complete,
            elapsed: Duration::ZERO,
        }
    }

    /// Append an outcome in arrival order (collector only)
    pub fn push(&mut self, outcome: Outcome<T>) {
        debug_assert!(self.outcomes.len() < self.expected);
        self.outcomes.push(outcome);
    }

    /// Freeze the set (collector only)
    pub fn finish(mut self, completion: Completion, elapsed: Duration) -> Self {
        self.completion = completion;
        self.elapsed = elapsed;
        self
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// Number of items submitted to the dispatch
    pub fn expected(&self) -> usize {
        self.expected
    }

    /// Number of items whose outcome was not observed
    pub fn missing(&self) -> usize {
        self.expected - self.outcomes.len()
    }

    pub fn completion(&self) -> Completion {
        self.completion
    }

    /// Whether every submitted item produced an observed outcome
    pub fn is_complete(&self) -> bool {
        self.outcomes.len() == self.expected
    }

    /// Whether the collector stopped on the deadline
    pub fn timed_out(&self) -> bool {
        self.completion == Completion::DeadlineExpired
    }

    /// Wall-clock time the collector ran
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Outcome<T>> {
        self.outcomes.iter()
    }

    pub fn outcomes(&self) -> &[Outcome<T>] {
        &self.outcomes
    }

    pub fn into_outcomes(self) -> Vec<Outcome<T>> {
        self.outcomes
    }

    /// Successful outcomes in arrival order
    pub fn successes(&self) -> impl Iterator<Item = (&WorkItem, &T)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.value().map(|v| (&o.item, v)))
    }

    /// Failed outcomes in arrival order
    pub fn failures(&self) -> impl Iterator<Item = (&WorkItem, &WorkFailure)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.failure_reason().map(|f| (&o.item, f)))
    }

    pub fn success_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn failure_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_failure()).count()
    }

    /// Work items represented in the set, in arrival order
    pub fn items(&self) -> impl Iterator<Item = &WorkItem> {
        self.outcomes.iter().map(|o| &o.item)
    }

    /// Submission positions represented in the set, in arrival order
    pub fn positions(&self) -> impl Iterator<Item = usize> + '_ {
        self.outcomes.iter().map(|o| o.position)
    }

    /// Value-free summary for logging and metrics
    pub fn summary(&self) -> DispatchSummary {
        DispatchSummary {
            expected: self.expected,
            collected: self.outcomes.len(),
            successes: self.success_count(),
            failures: self.failure_count(),
            completion: self.completion,
            elapsed: self.elapsed,
        }
    }
}

/// Counts describing one finished dispatch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct DispatchSummary {
    pub expected: usize,
    pub collected: usize,
    pub successes: usize,
    pub failures: usize,
    pub completion: Completion,
    pub elapsed: Duration,
}

impl DispatchSummary {
    /// Outcomes that were not observed before the deadline
    pub fn missing(&self) -> usize {
        self.expected - self.collected
    }

    pub fn timed_out(&self) -> bool {
        self.completion == Completion::DeadlineExpired
    }
}

impl<T> IntoIterator for ResultSet<T> {
    type Item = Outcome<T>;
    type IntoIter = std::vec::IntoIter<Outcome<T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.outcomes.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a ResultSet<T> {
    type Item = &'a Outcome<T>;
    type IntoIter = std::slice::Iter<'a, Outcome<T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.outcomes.iter()
    }
}
