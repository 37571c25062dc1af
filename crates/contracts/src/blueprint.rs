//! FanoutBlueprint - Config Loader output
//!
//! Describes a complete fan-out run: dispatcher settings, HTTP transport
//! settings and the list of targets.

use serde::{Deserialize, Serialize};

use crate::{DispatcherConfig, WorkItem};

/// Configuration version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// Complete fan-out configuration blueprint
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FanoutBlueprint {
    /// Configuration version
    #[serde(default)]
    pub version: ConfigVersion,

    /// Dispatcher settings
    #[serde(default)]
    pub dispatcher: DispatcherConfig,

    /// HTTP transport settings
    #[serde(default)]
    pub http: HttpConfig,

    /// Targets, in submission order
    #[serde(default)]
    pub targets: Vec<TargetConfig>,
}

impl FanoutBlueprint {
    /// Work items for every target, in submission order
    pub fn work_items(&self) -> Vec<WorkItem> {
        self.targets
            .iter()
            .map(|t| WorkItem::new(t.url.clone()))
            .collect()
    }
}

/// HTTP transport settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpConfig {
    /// User-Agent header
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Per-request timeout in milliseconds (None = rely on the dispatch deadline)
    #[serde(default)]
    pub request_timeout_ms: Option<u64>,

    /// Treat 4xx/5xx responses as successes instead of failures
    #[serde(default)]
    pub accept_error_status: bool,

    /// Skip TLS certificate verification (self-signed test targets)
    #[serde(default)]
    pub accept_invalid_certs: bool,
}

fn default_user_agent() -> String {
    concat!("fanout/", env!("CARGO_PKG_VERSION")).to_string()
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            request_timeout_ms: None,
            accept_error_status: false,
            accept_invalid_certs: false,
        }
    }
}

/// One target of the fan-out
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetConfig {
    /// Target URL
    pub url: String,

    /// Human-readable label (optional)
    #[serde(default)]
    pub label: Option<String>,
}

impl TargetConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            label: None,
        }
    }
}
