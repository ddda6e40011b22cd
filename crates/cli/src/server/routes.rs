//! HTTP routes

use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use contracts::{CompositeEvent, Reading};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{info, warn};

use super::state::{AppState, HealthReport};
use super::ws::observer_upgrade;

/// `GET /api/recent` body
#[derive(Debug, Serialize)]
pub struct RecentReadings {
    pub data: Vec<Reading>,
    pub count: usize,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(observer_upgrade))
        .route("/ws", get(observer_upgrade))
        .route("/health", get(health))
        .route("/api/recent", get(recent))
        .route("/api/trigger", post(trigger))
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> Json<HealthReport> {
    Json(state.health())
}

async fn recent(State(state): State<AppState>) -> Json<RecentReadings> {
    let data = state.history.snapshot();
    Json(RecentReadings {
        count: data.len(),
        data,
    })
}

async fn trigger(
    State(state): State<AppState>,
) -> Result<Json<CompositeEvent>, (StatusCode, Json<Value>)> {
    info!(device_id = %state.ingest.device_id(), "Manual trigger requested");

    state.ingest.trigger().await.map(Json).map_err(|e| {
        warn!(error = %e, "Manual trigger failed");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": e.to_string() })),
        )
    })
}
