// src/handlers/session.rs

use axum::{Extension, Json, response::IntoResponse};
use serde_json::json;

use crate::utils::jwt::Session;

/// Describes the signed-in caller and where their dashboard lives.
pub async fn current_session(Extension(session): Extension<Session>) -> impl IntoResponse {
    Json(json!({
        "success": true,
        "user_id": session.user_id,
        "role": session.role,
        "dashboard": session.role.dashboard_path(),
    }))
}

/// Liveness check.
pub async fn health() -> impl IntoResponse {
    Json(json!({ "success": true, "status": "ok" }))
}
