use crate::monitor::ThresholdUpdateError;
use crate::state::AppState;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use hexmon_common::types::{AlertState, LogRecord, Snapshot, ThresholdConfig};
use serde::{Deserialize, Serialize};

#[derive(Serialize)]
struct ApiError {
    error: String,
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(ApiError {
            error: message.to_string(),
        }),
    )
        .into_response()
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Latest snapshot plus the current alert state, the dashboard refresh
/// endpoint. `snapshot` is null until the first cycle has run.
#[derive(Serialize)]
struct StatusResponse {
    snapshot: Option<Snapshot>,
    alert: AlertState,
}

async fn status(State(state): State<AppState>) -> impl IntoResponse {
    Json(StatusResponse {
        snapshot: state.monitor.latest_snapshot(),
        alert: state.monitor.alert_state(),
    })
}

#[derive(Deserialize)]
struct HistoryParams {
    #[serde(default = "default_history_hours")]
    hours: u32,
}

fn default_history_hours() -> u32 {
    24
}

#[derive(Serialize)]
struct HistoryResponse {
    records: Vec<LogRecord>,
}

async fn history(
    State(state): State<AppState>,
    Query(params): Query<HistoryParams>,
) -> Response {
    match state.monitor.history(params.hours) {
        Ok(records) => (StatusCode::OK, Json(HistoryResponse { records })).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to query history");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to query history")
        }
    }
}

#[derive(Serialize)]
struct ThresholdsResponse {
    #[serde(flatten)]
    config: ThresholdConfig,
    /// Suggested `load_abs` for this host (`cores * 2`), display only.
    recommended_load: f64,
}

async fn get_thresholds(State(state): State<AppState>) -> impl IntoResponse {
    Json(ThresholdsResponse {
        config: state.monitor.thresholds(),
        recommended_load: state.monitor.recommended_load(),
    })
}

/// Partial threshold update; absent fields keep their current value.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ThresholdPatch {
    cpu_pct: Option<f64>,
    memory_pct: Option<f64>,
    load_abs: Option<f64>,
    db_cpu: Option<f64>,
    slow_queries: Option<u64>,
    alert_cooldown_secs: Option<u64>,
    notifications_enabled: Option<bool>,
}

impl ThresholdPatch {
    fn apply(self, config: &mut ThresholdConfig) {
        if let Some(v) = self.cpu_pct {
            config.cpu_pct = v;
        }
        if let Some(v) = self.memory_pct {
            config.memory_pct = v;
        }
        if let Some(v) = self.load_abs {
            config.load_abs = v;
        }
        if let Some(v) = self.db_cpu {
            config.db_cpu = v;
        }
        if let Some(v) = self.slow_queries {
            config.slow_queries = v;
        }
        if let Some(v) = self.alert_cooldown_secs {
            config.alert_cooldown_secs = v;
        }
        if let Some(v) = self.notifications_enabled {
            config.notifications_enabled = v;
        }
    }
}

async fn update_thresholds(
    State(state): State<AppState>,
    Json(patch): Json<ThresholdPatch>,
) -> Response {
    match state.monitor.update_thresholds(|config| patch.apply(config)) {
        Ok(config) => {
            tracing::info!("Thresholds updated");
            Json(ThresholdsResponse {
                config,
                recommended_load: state.monitor.recommended_load(),
            })
            .into_response()
        }
        Err(ThresholdUpdateError::Invalid(reason)) => {
            error_response(StatusCode::BAD_REQUEST, &reason)
        }
        Err(e @ ThresholdUpdateError::Store(_)) => {
            tracing::error!(error = %e, "Failed to persist thresholds");
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to persist thresholds",
            )
        }
    }
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/health", get(health))
        .route("/v1/status", get(status))
        .route("/v1/history", get(history))
        .route("/v1/thresholds", get(get_thresholds).put(update_thresholds))
}
