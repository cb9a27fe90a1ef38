use std::sync::Arc;

use sqlx::sqlite::SqlitePoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use herald::{
    api,
    auth::TokenVerifier,
    config::Settings,
    repository::{SqliteAnnouncementRepository, SqliteAuditLogRepository},
    scheduler::TokioScheduler,
    service::ServiceContext,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "herald=debug,tower_http=debug,axum=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let settings = Settings::new().unwrap_or_else(|e| {
        tracing::warn!("Failed to load config: {}. Using defaults.", e);
        Settings::default()
    });

    tracing::info!(
        "Starting Herald server on {}:{}",
        settings.server.host,
        settings.server.port
    );

    // Initialize database
    let db_pool = SqlitePoolOptions::new()
        .max_connections(settings.database.max_connections)
        .connect(&settings.database.url)
        .await?;

    // Run migrations
    sqlx::migrate!("./migrations").run(&db_pool).await?;

    // Initialize repositories and scheduler
    let announcement_repo = Arc::new(SqliteAnnouncementRepository::new(db_pool.clone()));
    let audit_repo = Arc::new(SqliteAuditLogRepository::new(db_pool.clone()));
    let scheduler = Arc::new(TokioScheduler::new());

    // Create service context
    let service_context = Arc::new(ServiceContext::new(
        announcement_repo,
        audit_repo,
        scheduler.clone(),
        db_pool.clone(),
    ));

    // Wire the deferred-publish callback and re-enqueue jobs left over
    // from a previous process.
    scheduler
        .set_callback(service_context.announcement_service.clone())
        .await;
    service_context
        .announcement_service
        .resume_scheduled_jobs()
        .await?;

    let token_verifier = Arc::new(TokenVerifier::new(&settings.auth.jwt_secret));

    let app = api::create_app(
        service_context,
        token_verifier,
        Arc::new(settings.clone()),
    );

    let listener = tokio::net::TcpListener::bind(format!(
        "{}:{}",
        settings.server.host, settings.server.port
    ))
    .await?;

    tracing::info!(
        "Server listening on http://{}:{}",
        settings.server.host,
        settings.server.port
    );

    axum::serve(listener, app).await?;

    Ok(())
}
