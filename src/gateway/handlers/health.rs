//! `GET /healthz` (§14 supplemental feature): pings Postgres and Redis.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;

use crate::gateway::state::AppState;
use crate::gateway::types::HealthResponse;

pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let postgres = state.db.health_check().await.is_ok();
    let redis = state.kv.ping().await.is_ok();
    let status = if postgres && redis { "ok" } else { "degraded" };
    Json(HealthResponse {
        status,
        postgres,
        redis,
    })
}
