//! Producer webhook endpoints.
//!
//! The body is read as raw bytes so that a non-JSON body can be told apart
//! from JSON that simply carries no job. Diagnostics from the extractor stay
//! in the logs; the response only says whether the payload was taken.

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::Utc;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use super::AppState;
use crate::relay::IngestOutcome;
use crate::types::Category;

/// Errors that can occur when accepting a producer payload.
#[derive(Debug, Error)]
pub enum IngestError {
    /// The path named a channel that is not configured.
    #[error("unknown channel: {0}")]
    UnknownChannel(String),

    /// The body is not JSON.
    #[error("invalid JSON body")]
    InvalidJson(#[from] serde_json::Error),

    /// The body is JSON but no job could be read from it.
    #[error("no job found in payload")]
    Rejected,
}

impl IntoResponse for IngestError {
    fn into_response(self) -> Response {
        let status = match &self {
            IngestError::UnknownChannel(_) => StatusCode::NOT_FOUND,
            IngestError::InvalidJson(_) => StatusCode::BAD_REQUEST,
            IngestError::Rejected => StatusCode::UNPROCESSABLE_ENTITY,
        };

        (status, self.to_string()).into_response()
    }
}

/// `POST /webhook/{channel}`
///
/// # Response
///
/// - 200 `OK`: job queued
/// - 200 `OK (duplicate)`: job already queued, payload dropped
/// - 400 Bad Request: body is not JSON
/// - 404 Not Found: channel is not configured
/// - 422 Unprocessable Entity: no job in payload
pub async fn channel_webhook_handler(
    State(app_state): State<AppState>,
    Path(channel): Path<String>,
    body: Bytes,
) -> Result<(StatusCode, &'static str), IngestError> {
    let Some(category) = app_state.channel_category(&channel).cloned() else {
        debug!(channel = %channel, "Payload for unknown channel");
        return Err(IngestError::UnknownChannel(channel));
    };
    accept(&app_state, category, &body)
}

/// `POST /discord-webhook`
///
/// Same contract as the channel endpoint, with the `universal` category.
pub async fn universal_webhook_handler(
    State(app_state): State<AppState>,
    body: Bytes,
) -> Result<(StatusCode, &'static str), IngestError> {
    accept(&app_state, Category::universal(), &body)
}

fn accept(
    app_state: &AppState,
    category: Category,
    body: &[u8],
) -> Result<(StatusCode, &'static str), IngestError> {
    let payload: Value = match serde_json::from_slice(body) {
        Ok(payload) => payload,
        Err(error) => {
            app_state.relay().record_failure();
            warn!(category = %category, error = %error, "Payload is not JSON");
            return Err(IngestError::InvalidJson(error));
        }
    };

    match app_state.relay().ingest(category, &payload, Utc::now()) {
        IngestOutcome::Admitted(record) => {
            // The outbound call runs detached; its handle is not awaited.
            let _ = app_state.forwarder().forward(&record.category, payload);
            Ok((StatusCode::OK, "OK"))
        }
        IngestOutcome::DuplicateDropped(_) => Ok((StatusCode::OK, "OK (duplicate)")),
        IngestOutcome::ExtractionFailed(_) => Err(IngestError::Rejected),
    }
}
