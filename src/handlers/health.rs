// src/handlers/health.rs

use axum::{Json, response::IntoResponse};
use serde_json::json;

/// Liveness probe.
pub async fn health() -> impl IntoResponse {
    Json(json!({
        "status": "OK",
        "message": "Backend server is running",
        "timestamp": chrono::Utc::now(),
    }))
}

/// API index listing the top-level resources.
pub async fn index() -> impl IntoResponse {
    Json(json!({
        "message": "Quiz Reviewer API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "quizzes": "/api/quizzes",
            "results": "/api/results",
            "health": "/api/health",
        },
    }))
}
