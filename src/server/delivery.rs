//! Consumer pull endpoint.

use axum::Json;
use axum::extract::State;
use chrono::{DateTime, Utc};
use serde::Serialize;

use super::AppState;
use crate::types::{Category, JobId, JobRecord};

const NO_JOB_MESSAGE: &str = "no job available";

/// Body of `GET /get-job`. Always sent with HTTP 200.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GetJobResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job: Option<DeliveredJob>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
}

/// A job as handed to the consumer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveredJob {
    pub job_id: Option<JobId>,
    pub name: String,
    pub current_players: String,
    pub max_players: String,
    pub value: String,
    pub category: Category,
    pub timestamp: DateTime<Utc>,
}

impl From<JobRecord> for DeliveredJob {
    fn from(record: JobRecord) -> Self {
        let (current, max) = record.player_counts();
        DeliveredJob {
            current_players: current.to_string(),
            max_players: max.to_string(),
            timestamp: record.received_at(),
            job_id: record.job_id,
            name: record.name,
            value: record.value,
            category: record.category,
        }
    }
}

impl GetJobResponse {
    pub fn found(record: JobRecord) -> Self {
        GetJobResponse {
            success: true,
            job: Some(record.into()),
            message: None,
        }
    }

    pub fn empty() -> Self {
        GetJobResponse {
            success: false,
            job: None,
            message: Some(NO_JOB_MESSAGE),
        }
    }
}

/// `GET /get-job`
///
/// Removes the best live job. Each job is returned to at most one caller.
pub async fn get_job_handler(State(app_state): State<AppState>) -> Json<GetJobResponse> {
    let response = match app_state.relay().pull(Utc::now()) {
        Some(record) => GetJobResponse::found(record),
        None => GetJobResponse::empty(),
    };
    Json(response)
}
