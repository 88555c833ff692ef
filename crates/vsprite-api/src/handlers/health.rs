//! Health and readiness probes.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde_json::json;

use crate::state::AppState;

/// Liveness probe.
pub async fn health() -> Json<serde_json::Value> {
    Json(json!({
        "status": "healthy",
        "service": "vsprite-api",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

/// Readiness probe: all three backing services must answer.
pub async fn ready(State(state): State<AppState>) -> (StatusCode, Json<serde_json::Value>) {
    let storage_ok = state.storage.check_connectivity().await.is_ok();
    let db_ok = state.db.ping().await.is_ok();
    let queue_ok = state.queue.len().await.is_ok();

    let all_ok = storage_ok && db_ok && queue_ok;
    let status = if all_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(json!({
            "status": if all_ok { "ready" } else { "not_ready" },
            "checks": {
                "storage": storage_ok,
                "database": db_ok,
                "queue": queue_ok,
            },
        })),
    )
}
