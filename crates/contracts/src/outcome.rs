//! Outcome - terminal result of one worker

use serde::Serialize;
use std::time::Duration;

use crate::{WorkFailure, WorkItem};

/// Success or failure of one worker
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus<T> {
    Success(T),
    Failure(WorkFailure),
}

/// Terminal, immutable result published by a worker
///
/// Exactly one `Outcome` exists per work item that started executing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Outcome<T> {
    /// The work item this outcome belongs to
    pub item: WorkItem,

    /// Index of the item in the submitted list (disambiguates duplicates)
    pub position: usize,

    /// Success value or failure reason
    pub status: OutcomeStatus<T>,

    /// Time from dispatch start until the outcome was published
    pub elapsed: Duration,
}

impl<T> Outcome<T> {
    /// Create a successful outcome
    pub fn success(item: WorkItem, position: usize, value: T, elapsed: Duration) -> Self {
        Self {
            item,
            position,
            status: OutcomeStatus::Success(value),
            elapsed,
        }
    }

    /// Create a failed outcome
    pub fn failure(item: WorkItem, position: usize, reason: WorkFailure, elapsed: Duration) -> Self {
        Self {
            item,
            position,
            status: OutcomeStatus::Failure(reason),
            elapsed,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.status, OutcomeStatus::Success(_))
    }

    pub fn is_failure(&self) -> bool {
        matches!(self.status, OutcomeStatus::Failure(_))
    }

    /// Success value, if any
    pub fn value(&self) -> Option<&T> {
        match &self.status {
            OutcomeStatus::Success(v) => Some(v),
            OutcomeStatus::Failure(_) => None,
        }
    }

    /// Failure reason, if any
    pub fn failure_reason(&self) -> Option<&WorkFailure> {
        match &self.status {
            OutcomeStatus::Success(_) => None,
            OutcomeStatus::Failure(f) => Some(f),
        }
    }

    /// Convert into a plain `Result`, discarding item metadata
    pub fn into_result(self) -> Result<T, WorkFailure> {
        match self.status {
            OutcomeStatus::Success(v) => Ok(v),
            OutcomeStatus::Failure(f) => Err(f),
        }
    }
}
