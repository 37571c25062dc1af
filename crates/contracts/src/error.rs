//! Layered error definitions
//!
//! Categorized by source: config / operation / worker

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::WorkItem;

/// Unified configuration and I/O error type
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl ContractError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Error returned by a single [`Operation::execute`](crate::Operation) call
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OperationError {
    /// Connection, DNS, TLS or timeout failure below the application layer
    #[error("transport error: {message}")]
    Transport { message: String },

    /// Remote side answered with a non-success status
    #[error("status {code} from {url}")]
    Status { code: u16, url: String },

    /// Response arrived but could not be read or decoded
    #[error("payload error: {message}")]
    Payload { message: String },

    #[error("{message}")]
    Other { message: String },
}

impl OperationError {
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    pub fn status(code: u16, url: impl Into<String>) -> Self {
        Self::Status {
            code,
            url: url.into(),
        }
    }

    pub fn payload(message: impl Into<String>) -> Self {
        Self::Payload {
            message: message.into(),
        }
    }

    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
        }
    }
}

/// Reason carried by a failed [`Outcome`](crate::Outcome)
///
/// Always scoped to a single work item; never escalated to the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkFailure {
    /// The descriptor failed validation before the operation ran
    #[error("invalid work item '{item}': {reason}")]
    InvalidWorkItem { item: WorkItem, reason: String },

    /// The operation ran and returned an error
    #[error("operation failed: {0}")]
    Operation(#[from] OperationError),

    /// The operation panicked; the panic was contained in its worker
    #[error("operation panicked: {message}")]
    Panicked { message: String },
}

impl WorkFailure {
    pub fn invalid_item(item: &WorkItem, reason: impl Into<String>) -> Self {
        Self::InvalidWorkItem {
            item: item.clone(),
            reason: reason.into(),
        }
    }

    pub fn panicked(message: impl Into<String>) -> Self {
        Self::Panicked {
            message: message.into(),
        }
    }
}
