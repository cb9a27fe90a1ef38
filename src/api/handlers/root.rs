use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

pub async fn root() -> impl IntoResponse {
    Json(json!({
        "name": "Herald API",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Company announcement lifecycle service",
        "status": "operational",
        "endpoints": {
            "health": "/health",
            "api": "/api/announcements",
            "admin": "/admin"
        }
    }))
}

pub async fn health_check() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "timestamp": chrono::Utc::now().to_rfc3339()
        })),
    )
}
