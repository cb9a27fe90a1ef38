use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{api::state::AppState, domain::AuditEntry, error::Result};

#[derive(Debug, Deserialize)]
pub struct AuditLogQuery {
    pub limit: Option<i64>,
}

pub async fn audit_log(
    State(state): State<AppState>,
    Query(params): Query<AuditLogQuery>,
) -> Result<Json<Vec<AuditEntry>>> {
    let limit = params.limit.unwrap_or(100).min(500);
    let entries = state.service_context.audit_repo.list_recent(limit).await?;

    Ok(Json(entries))
}

pub async fn announcement_audit_log(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<AuditEntry>>> {
    let entries = state
        .service_context
        .audit_repo
        .list_for_announcement(id)
        .await?;

    Ok(Json(entries))
}
