use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use sqlx::SqlitePool;
use tower::ServiceExt;
use uuid::Uuid;

use herald::{
    api::create_app,
    auth::TokenVerifier,
    config::Settings,
    domain::Caller,
    repository::{SqliteAnnouncementRepository, SqliteAuditLogRepository},
    scheduler::RecordingScheduler,
    service::ServiceContext,
};

const SECRET: &str = "test-secret";

async fn setup_app() -> anyhow::Result<Router> {
    let pool = SqlitePool::connect(":memory:").await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    let announcement_repo = Arc::new(SqliteAnnouncementRepository::new(pool.clone()));
    let audit_repo = Arc::new(SqliteAuditLogRepository::new(pool.clone()));
    let scheduler = Arc::new(RecordingScheduler::new());

    let service_context = Arc::new(ServiceContext::new(
        announcement_repo,
        audit_repo,
        scheduler,
        pool,
    ));
    let token_verifier = Arc::new(TokenVerifier::new(SECRET));
    let settings = Arc::new(Settings::default());

    Ok(create_app(service_context, token_verifier, settings))
}

fn bearer(caller: &Caller) -> String {
    format!("Bearer {}", TokenVerifier::issue_for_tests(SECRET, caller))
}

async fn body_json(response: axum::response::Response) -> anyhow::Result<Value> {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
    Ok(serde_json::from_slice(&bytes)?)
}

#[tokio::test]
async fn test_health_check() -> anyhow::Result<()> {
    let app = setup_app().await?;

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty())?)
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await?;
    assert_eq!(body["status"], "healthy");

    Ok(())
}

#[tokio::test]
async fn test_announcements_require_auth() -> anyhow::Result<()> {
    let app = setup_app().await?;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/announcements")
                .body(Body::empty())?,
        )
        .await?;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    Ok(())
}

#[tokio::test]
async fn test_create_publish_and_fetch() -> anyhow::Result<()> {
    let app = setup_app().await?;
    let admin = Caller::company_admin(Uuid::new_v4(), Uuid::new_v4());

    let create = Request::builder()
        .method("POST")
        .uri("/api/announcements")
        .header(header::AUTHORIZATION, bearer(&admin))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            json!({
                "title": "Service update",
                "content": "We shipped a new dashboard.",
                "announcement_type": "GENERAL",
                "urgency": "MEDIUM"
            })
            .to_string(),
        ))?;

    let response = app.clone().oneshot(create).await?;
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = body_json(response).await?;
    assert_eq!(created["status"], "DRAFT");
    let id = created["id"].as_str().unwrap().to_string();

    let publish = Request::builder()
        .method("POST")
        .uri(format!("/api/announcements/{}/publish", id))
        .header(header::AUTHORIZATION, bearer(&admin))
        .body(Body::empty())?;
    let response = app.clone().oneshot(publish).await?;
    assert_eq!(response.status(), StatusCode::OK);

    let fetch = Request::builder()
        .uri(format!("/api/announcements/{}", id))
        .header(header::AUTHORIZATION, bearer(&admin))
        .body(Body::empty())?;
    let response = app.oneshot(fetch).await?;
    assert_eq!(response.status(), StatusCode::OK);
    let fetched = body_json(response).await?;
    assert_eq!(fetched["status"], "PUBLISHED");
    assert!(fetched["published_at"].is_string());

    Ok(())
}

#[tokio::test]
async fn test_create_with_missing_fields_returns_422() -> anyhow::Result<()> {
    let app = setup_app().await?;
    let admin = Caller::company_admin(Uuid::new_v4(), Uuid::new_v4());

    let create = Request::builder()
        .method("POST")
        .uri("/api/announcements")
        .header(header::AUTHORIZATION, bearer(&admin))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json!({ "title": "Incomplete" }).to_string()))?;

    let response = app.oneshot(create).await?;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = body_json(response).await?;
    let fields: Vec<&str> = body["fields"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["field"].as_str().unwrap())
        .collect();
    assert!(fields.contains(&"content"));
    assert!(fields.contains(&"announcement_type"));

    Ok(())
}

#[tokio::test]
async fn test_admin_routes_require_platform_admin() -> anyhow::Result<()> {
    let app = setup_app().await?;

    let company_admin = Caller::company_admin(Uuid::new_v4(), Uuid::new_v4());
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/admin/audit-log")
                .header(header::AUTHORIZATION, bearer(&company_admin))
                .body(Body::empty())?,
        )
        .await?;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let platform_admin = Caller::platform_admin(Uuid::new_v4());
    let response = app
        .oneshot(
            Request::builder()
                .uri("/admin/audit-log")
                .header(header::AUTHORIZATION, bearer(&platform_admin))
                .body(Body::empty())?,
        )
        .await?;
    assert_eq!(response.status(), StatusCode::OK);

    Ok(())
}
