//! Best-effort re-forwarding of admitted payloads.
//!
//! Each category may have an outbound webhook URL. When a job is admitted, its
//! original payload is posted there on a spawned task. The ingestion path never
//! waits for the call, and a failed call only produces a log line.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use reqwest::{Client, StatusCode};
use serde_json::Value;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::types::Category;

/// Default timeout for an outbound forward.
pub const DEFAULT_FORWARD_TIMEOUT_SECS: u64 = 10;

/// Errors from a single forward attempt.
#[derive(Debug, Error)]
pub enum ForwardError {
    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    /// The request could not be sent or timed out.
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The receiver answered with a non-success status.
    #[error("receiver returned {0}")]
    Status(StatusCode),
}

/// Posts admitted payloads to per-category URLs.
#[derive(Clone)]
pub struct Forwarder {
    /// Absent when there are no targets.
    client: Option<Client>,
    targets: Arc<HashMap<Category, String>>,
}

impl Forwarder {
    /// Creates a forwarder for the given category → URL map.
    ///
    /// No client is built when `targets` is empty.
    pub fn new(targets: HashMap<Category, String>, timeout: Duration) -> Result<Self, ForwardError> {
        let client = if targets.is_empty() {
            None
        } else {
            let client = Client::builder()
                .user_agent(concat!("job-relay/", env!("CARGO_PKG_VERSION")))
                .timeout(timeout)
                .build()
                .map_err(ForwardError::Client)?;
            Some(client)
        };
        Ok(Forwarder {
            client,
            targets: Arc::new(targets),
        })
    }

    /// A forwarder with no targets; every call is a no-op.
    pub fn disabled() -> Self {
        Forwarder {
            client: None,
            targets: Arc::new(HashMap::new()),
        }
    }

    /// Returns true if at least one category has a target.
    pub fn is_enabled(&self) -> bool {
        self.client.is_some()
    }

    /// The URL configured for a category, if any.
    pub fn target(&self, category: &Category) -> Option<&str> {
        self.targets.get(category).map(String::as_str)
    }

    /// Spawns a post of `payload` to the category's URL.
    ///
    /// Returns the task handle, or `None` when the category has no target.
    /// Callers on the ingestion path drop the handle.
    pub fn forward(&self, category: &Category, payload: Value) -> Option<JoinHandle<()>> {
        let client = self.client.clone()?;
        let url = self.target(category)?.to_string();
        let category = category.clone();

        Some(tokio::spawn(async move {
            let started = Instant::now();
            match send(&client, &url, &payload).await {
                Ok(()) => debug!(
                    category = %category,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Payload forwarded"
                ),
                Err(error) => warn!(
                    category = %category,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    error = %error,
                    "Payload forward failed"
                ),
            }
        }))
    }
}

impl std::fmt::Debug for Forwarder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut categories: Vec<&str> = self.targets.keys().map(Category::as_str).collect();
        categories.sort_unstable();
        f.debug_struct("Forwarder")
            .field("categories", &categories)
            .finish_non_exhaustive()
    }
}

async fn send(client: &Client, url: &str, payload: &Value) -> Result<(), ForwardError> {
    let response = client.post(url).json(payload).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(ForwardError::Status(status));
    }
    Ok(())
}
