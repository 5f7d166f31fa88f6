//! Read-only status view.

use axum::Json;
use axum::extract::State;
use chrono::Utc;

use super::AppState;
use crate::relay::RelaySnapshot;

/// `GET /status`
///
/// Counters plus the live queue in delivery order. Expired records are
/// evicted before the view is taken.
pub async fn status_handler(State(app_state): State<AppState>) -> Json<RelaySnapshot> {
    Json(app_state.relay().snapshot(Utc::now()))
}
