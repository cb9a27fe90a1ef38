pub mod handlers;
pub mod middleware;
pub mod state;

use std::sync::Arc;

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

use crate::{auth::TokenVerifier, config::Settings, service::ServiceContext};
use state::AppState;

pub fn create_app(
    service_context: Arc<ServiceContext>,
    token_verifier: Arc<TokenVerifier>,
    settings: Arc<Settings>,
) -> Router {
    let app_state = AppState::new(service_context, token_verifier, settings);

    Router::new()
        // Root and health endpoints
        .route("/", get(handlers::root::root))
        .route("/health", get(handlers::root::health_check))
        // API routes
        .nest("/api/announcements", announcement_routes(app_state.clone()))
        // Admin routes
        .nest("/admin", admin_routes(app_state.clone()))
        // Add state to the router
        .with_state(app_state)
        // Middleware
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive()) // Configure properly for production
        .layer(TraceLayer::new_for_http())
}

fn announcement_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::announcements::list))
        .route("/", post(handlers::announcements::create))
        .route("/:id", get(handlers::announcements::get))
        .route("/:id", put(handlers::announcements::update))
        .route("/:id", delete(handlers::announcements::delete))
        .route("/:id/publish", post(handlers::announcements::publish))
        .route("/:id/schedule", post(handlers::announcements::schedule))
        .route("/:id/unschedule", post(handlers::announcements::unschedule))
        .route("/:id/archive", post(handlers::announcements::archive))
        .route("/:id/restore", post(handlers::announcements::restore))
        .route("/:id/start", post(handlers::announcements::mark_start))
        .route("/:id/complete", post(handlers::announcements::mark_complete))
        .route_layer(axum::middleware::from_fn_with_state(
            state,
            middleware::auth::require_auth,
        ))
}

fn admin_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/audit-log", get(handlers::admin::audit_log))
        .route(
            "/audit-log/announcement/:id",
            get(handlers::admin::announcement_audit_log),
        )
        .route_layer(axum::middleware::from_fn_with_state(
            state,
            middleware::auth::require_platform_admin,
        ))
}
