use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;
use validator::Validate;

use crate::{
    api::{middleware::auth::CurrentUser, state::AppState},
    domain::{
        Announcement, AnnouncementFilter, AnnouncementType, CreateAnnouncementRequest,
        PublicationStatus, UpdateAnnouncementRequest,
    },
    error::{AppError, Result},
};

#[derive(Debug, Deserialize, Validate)]
pub struct ListAnnouncementsQuery {
    pub status: Option<String>,
    #[serde(rename = "type")]
    pub announcement_type: Option<String>,
    pub company_id: Option<Uuid>,
    #[validate(range(min = 1, max = 100))]
    pub limit: Option<i64>,
    #[validate(range(min = 0))]
    pub offset: Option<i64>,
}

/// Optional body for the state-transition endpoints; `reason` feeds the
/// audit log only.
#[derive(Debug, Default, Deserialize)]
pub struct ActionBody {
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ScheduleBody {
    pub scheduled_for: Option<DateTime<Utc>>,
    pub reason: Option<String>,
}

pub async fn list(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Query(params): Query<ListAnnouncementsQuery>,
) -> Result<Json<Vec<Announcement>>> {
    params
        .validate()
        .map_err(|e| AppError::validation("limit", e.to_string()))?;

    let status = match params.status.as_deref() {
        Some(raw) => Some(
            PublicationStatus::parse(raw)
                .ok_or_else(|| AppError::validation("status", "status is not a valid publication status"))?,
        ),
        None => None,
    };
    let announcement_type = match params.announcement_type.as_deref() {
        Some(raw) => Some(
            AnnouncementType::parse(raw)
                .ok_or_else(|| AppError::validation("type", "type is not a valid announcement type"))?,
        ),
        None => None,
    };

    let filter = AnnouncementFilter {
        company_id: params.company_id,
        status,
        announcement_type,
        limit: params.limit.unwrap_or(20),
        offset: params.offset.unwrap_or(0),
    };

    let announcements = state
        .service_context
        .announcement_service
        .list(&user.caller, filter)
        .await?;

    Ok(Json(announcements))
}

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<Announcement>> {
    let announcement = state
        .service_context
        .announcement_service
        .get(id, &user.caller)
        .await?;

    Ok(Json(announcement))
}

pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(request): Json<CreateAnnouncementRequest>,
) -> Result<(StatusCode, Json<Announcement>)> {
    let created = state
        .service_context
        .announcement_service
        .create(&user.caller, request)
        .await?;

    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(user): Extension<CurrentUser>,
    Json(request): Json<UpdateAnnouncementRequest>,
) -> Result<Json<Announcement>> {
    let updated = state
        .service_context
        .announcement_service
        .update(id, &user.caller, request)
        .await?;

    Ok(Json(updated))
}

pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(user): Extension<CurrentUser>,
    body: Option<Json<ActionBody>>,
) -> Result<Json<Value>> {
    let reason = body.and_then(|Json(b)| b.reason);

    state
        .service_context
        .announcement_service
        .delete(id, &user.caller, reason)
        .await?;

    Ok(Json(json!({ "success": true })))
}

pub async fn publish(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(user): Extension<CurrentUser>,
    body: Option<Json<ActionBody>>,
) -> Result<Json<Announcement>> {
    let reason = body.and_then(|Json(b)| b.reason);

    let published = state
        .service_context
        .announcement_service
        .publish(id, &user.caller, reason)
        .await?;

    Ok(Json(published))
}

pub async fn schedule(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(user): Extension<CurrentUser>,
    Json(body): Json<ScheduleBody>,
) -> Result<Json<Announcement>> {
    let scheduled_for = body.scheduled_for.ok_or_else(|| {
        AppError::validation("scheduled_for", "scheduled_for is required when scheduling")
    })?;

    let scheduled = state
        .service_context
        .announcement_service
        .schedule(id, &user.caller, scheduled_for, body.reason)
        .await?;

    Ok(Json(scheduled))
}

pub async fn unschedule(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(user): Extension<CurrentUser>,
    body: Option<Json<ActionBody>>,
) -> Result<Json<Announcement>> {
    let reason = body.and_then(|Json(b)| b.reason);

    let unscheduled = state
        .service_context
        .announcement_service
        .unschedule(id, &user.caller, reason)
        .await?;

    Ok(Json(unscheduled))
}

pub async fn archive(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(user): Extension<CurrentUser>,
    body: Option<Json<ActionBody>>,
) -> Result<Json<Announcement>> {
    let reason = body.and_then(|Json(b)| b.reason);

    let archived = state
        .service_context
        .announcement_service
        .archive(id, &user.caller, reason)
        .await?;

    Ok(Json(archived))
}

pub async fn restore(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(user): Extension<CurrentUser>,
    body: Option<Json<ActionBody>>,
) -> Result<Json<Announcement>> {
    let reason = body.and_then(|Json(b)| b.reason);

    let restored = state
        .service_context
        .announcement_service
        .restore(id, &user.caller, reason)
        .await?;

    Ok(Json(restored))
}

pub async fn mark_start(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<Announcement>> {
    let marked = state
        .service_context
        .announcement_service
        .mark_maintenance_start(id, &user.caller)
        .await?;

    Ok(Json(marked))
}

pub async fn mark_complete(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<Announcement>> {
    let marked = state
        .service_context
        .announcement_service
        .mark_maintenance_end(id, &user.caller)
        .await?;

    Ok(Json(marked))
}
