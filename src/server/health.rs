//! Liveness endpoint.

use axum::http::StatusCode;

/// `GET /health`: 200 with the text "OK" while the process is serving.
pub async fn health_handler() -> (StatusCode, &'static str) {
    (StatusCode::OK, "OK")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn health_returns_200_ok() {
        assert_eq!(health_handler().await, (StatusCode::OK, "OK"));
    }
}
