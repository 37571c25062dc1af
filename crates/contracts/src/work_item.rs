//! WorkItem - opaque descriptor of one unit of work

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque, immutable descriptor identifying one unit of work (e.g. a target URL)
///
/// The dispatcher never interprets the descriptor; only the
/// [`Operation`](crate::Operation) does.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkItem(String);

impl WorkItem {
    /// Create a new work item
    pub fn new(descriptor: impl Into<String>) -> Self {
        Self(descriptor.into())
    }

    /// Get the raw descriptor
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the descriptor is empty or whitespace only
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for WorkItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for WorkItem {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for WorkItem {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl AsRef<str> for WorkItem {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
