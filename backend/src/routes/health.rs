//! Health endpoints
//!
//! `/health` and `/health/live` answer while the process runs;
//! `/health/ready` also pings the database and answers 503 when it is down.

use crate::{db, state::AppState};
use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use std::time::Instant;
use tracing::warn;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<DatabaseCheck>,
}

#[derive(Debug, Serialize)]
pub struct DatabaseCheck {
    pub healthy: bool,
    pub latency_ms: u128,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

fn status(status: &'static str) -> HealthResponse {
    HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION"),
        database: None,
    }
}

pub async fn health_check() -> Json<HealthResponse> {
    Json(status("healthy"))
}

pub async fn liveness_check() -> Json<HealthResponse> {
    Json(status("alive"))
}

pub async fn readiness_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let started = Instant::now();
    let result = db::health_check(state.db()).await;
    let latency_ms = started.elapsed().as_millis();

    let (code, body) = match result {
        Ok(()) => (
            StatusCode::OK,
            HealthResponse {
                database: Some(DatabaseCheck {
                    healthy: true,
                    latency_ms,
                    message: None,
                }),
                ..status("ready")
            },
        ),
        Err(e) => {
            warn!(error = %e, "Readiness check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                HealthResponse {
                    database: Some(DatabaseCheck {
                        healthy: false,
                        latency_ms,
                        message: Some(e.to_string()),
                    }),
                    ..status("not_ready")
                },
            )
        }
    };

    (code, Json(body))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_health_and_liveness() {
        assert_eq!(health_check().await.status, "healthy");
        let live = liveness_check().await;
        assert_eq!(live.status, "alive");
        assert!(live.database.is_none());
        assert!(!live.version.is_empty());
    }
}
