//! HttpOperation - one GET request per work item

use std::time::Duration;

use contracts::{HttpConfig, Operation, OperationError, WorkItem};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Url};
use serde::Serialize;
use tracing::{debug, instrument, warn};

use crate::error::DispatchError;

/// Summary of a completed HTTP exchange
///
/// The body is read to the end and dropped before the outcome is published,
/// so the connection goes back to the pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HttpResponse {
    /// Final URL after redirects
    pub url: String,
    pub status: u16,
    /// Content-Length header, if sent
    pub content_length: Option<u64>,
    pub content_type: Option<String>,
    /// Bytes actually read from the body
    pub body_bytes: usize,
}

/// Operation that GETs the URL named by each work item
#[derive(Debug, Clone)]
pub struct HttpOperation {
    name: String,
    client: Client,
    accept_error_status: bool,
}

impl HttpOperation {
    /// Create with default HTTP settings
    pub fn new(name: impl Into<String>) -> Result<Self, DispatchError> {
        Self::from_config(name, &HttpConfig::default())
    }

    /// Create from configuration
    pub fn from_config(name: impl Into<String>, config: &HttpConfig) -> Result<Self, DispatchError> {
        let name = name.into();
        let mut builder = Client::builder().user_agent(&config.user_agent);
        if config.accept_invalid_certs {
            warn!(operation = %name, "TLS certificate verification disabled");
            builder = builder.danger_accept_invalid_certs(true);
        }
        if let Some(ms) = config.request_timeout_ms {
            builder = builder.timeout(Duration::from_millis(ms));
        }
        let client = builder
            .build()
            .map_err(|e| DispatchError::operation_setup(&name, e.to_string()))?;

        Ok(Self::with_client(name, client, config.accept_error_status))
    }

    /// Create around an existing client
    pub fn with_client(name: impl Into<String>, client: Client, accept_error_status: bool) -> Self {
        Self {
            name: name.into(),
            client,
            accept_error_status,
        }
    }
}

fn transport_error(err: reqwest::Error) -> OperationError {
    if err.is_timeout() {
        OperationError::transport(format!("request timed out: {err}"))
    } else {
        OperationError::transport(err.to_string())
    }
}

impl Operation for HttpOperation {
    type Output = HttpResponse;

    fn name(&self) -> &str {
        &self.name
    }

    fn validate(&self, item: &WorkItem) -> Result<(), String> {
        let url = Url::parse(item.as_str()).map_err(|e| format!("not a URL: {e}"))?;
        match url.scheme() {
            "http" | "https" => Ok(()),
            other => Err(format!("unsupported scheme '{other}'")),
        }
    }

    #[instrument(
        name = "http_get",
        skip(self, item),
        fields(operation = %self.name, url = %item)
    )]
    async fn execute(&self, item: &WorkItem) -> Result<HttpResponse, OperationError> {
        let response = self
            .client
            .get(item.as_str())
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        let url = response.url().to_string();
        let content_length = response.content_length();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        if !status.is_success() && !self.accept_error_status {
            // Dropping the response releases the connection
            return Err(OperationError::status(status.as_u16(), url));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| OperationError::payload(e.to_string()))?;

        debug!(status = status.as_u16(), bytes = body.len(), "Response read");

        Ok(HttpResponse {
            url,
            status: status.as_u16(),
            content_length,
            content_type,
            body_bytes: body.len(),
        })
    }
}
