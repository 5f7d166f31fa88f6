//! HTTP server for the job relay.
//!
//! # Endpoints
//!
//! - `POST /webhook/{channel}` - Accepts a producer payload for a configured channel
//! - `POST /discord-webhook` - Accepts a producer payload under the `universal` category
//! - `GET /get-job` - Removes and returns the best live job
//! - `GET /status` - Returns counters and the live queue as JSON
//! - `GET /health` - Returns 200 if server is running

use std::collections::BTreeMap;
use std::sync::Arc;

pub mod delivery;
pub mod health;
pub mod ingest;
pub mod status;

pub use delivery::get_job_handler;
pub use health::health_handler;
pub use ingest::{IngestError, channel_webhook_handler, universal_webhook_handler};
pub use status::status_handler;

use crate::forward::Forwarder;
use crate::relay::JobRelay;
use crate::types::Category;

/// Shared application state.
///
/// This is passed to all handlers via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    relay: JobRelay,
    forwarder: Forwarder,
    /// Channel path segment → category.
    channels: BTreeMap<String, Category>,
}

impl AppState {
    pub fn new(
        relay: JobRelay,
        forwarder: Forwarder,
        channels: BTreeMap<String, Category>,
    ) -> Self {
        AppState {
            inner: Arc::new(AppStateInner {
                relay,
                forwarder,
                channels,
            }),
        }
    }

    pub fn relay(&self) -> &JobRelay {
        &self.inner.relay
    }

    pub fn forwarder(&self) -> &Forwarder {
        &self.inner.forwarder
    }

    /// The category a channel path segment feeds, if the channel exists.
    pub fn channel_category(&self, channel: &str) -> Option<&Category> {
        self.inner.channels.get(channel)
    }
}

/// Builds the axum Router with all endpoints.
pub fn build_router(app_state: AppState) -> axum::Router {
    use axum::routing::{get, post};

    axum::Router::new()
        .route("/webhook/{channel}", post(channel_webhook_handler))
        .route("/discord-webhook", post(universal_webhook_handler))
        .route("/get-job", get(get_job_handler))
        .route("/status", get(status_handler))
        .route("/health", get(health_handler))
        .with_state(app_state)
}
