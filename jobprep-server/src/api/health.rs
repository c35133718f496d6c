//! Liveness probe: `GET /health`

use axum::{extract::State, routing::get, Json, Router};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::AppState;

const MODULE_NAME: &str = "jobprep-server";

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub module: &'static str,
    pub version: &'static str,
    pub uptime_seconds: u64,
}

impl HealthResponse {
    /// Snapshot for a process started at `started`; clock skew clamps to zero
    pub fn since(started: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        let uptime_seconds = u64::try_from((now - started).num_seconds()).unwrap_or(0);

        Self {
            status: "ok",
            module: MODULE_NAME,
            version: env!("CARGO_PKG_VERSION"),
            uptime_seconds,
        }
    }
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse::since(state.startup_time, Utc::now()))
}

pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_uptime_counts_whole_seconds() {
        let started = Utc::now();
        let report = HealthResponse::since(started, started + Duration::milliseconds(90_500));
        assert_eq!(report.uptime_seconds, 90);
        assert_eq!(report.module, "jobprep-server");
    }

    #[test]
    fn test_clock_going_backwards_reports_zero() {
        let started = Utc::now();
        let report = HealthResponse::since(started, started - Duration::seconds(5));
        assert_eq!(report.uptime_seconds, 0);
    }
}
