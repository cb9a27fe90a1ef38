use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::{FromRow, SqlitePool};
use uuid::Uuid;

use crate::{
    domain::{AuditAction, AuditEntry},
    error::{AppError, Result},
    repository::AuditLogRepository,
};

#[derive(FromRow)]
struct AuditRow {
    id: String,
    announcement_id: String,
    company_id: String,
    actor_id: String,
    action: String,
    reason: Option<String>,
    recorded_at: NaiveDateTime,
}

pub struct SqliteAuditLogRepository {
    pool: SqlitePool,
}

impl SqliteAuditLogRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_entry(row: AuditRow) -> Result<AuditEntry> {
        Ok(AuditEntry {
            id: Uuid::parse_str(&row.id).map_err(|e| AppError::Database(e.to_string()))?,
            announcement_id: Uuid::parse_str(&row.announcement_id)
                .map_err(|e| AppError::Database(e.to_string()))?,
            company_id: Uuid::parse_str(&row.company_id)
                .map_err(|e| AppError::Database(e.to_string()))?,
            actor_id: Uuid::parse_str(&row.actor_id)
                .map_err(|e| AppError::Database(e.to_string()))?,
            action: Self::parse_action(&row.action)?,
            reason: row.reason,
            recorded_at: DateTime::from_naive_utc_and_offset(row.recorded_at, Utc),
        })
    }

    fn parse_action(s: &str) -> Result<AuditAction> {
        match s {
            "created" => Ok(AuditAction::Created),
            "published" => Ok(AuditAction::Published),
            "scheduled" => Ok(AuditAction::Scheduled),
            "unscheduled" => Ok(AuditAction::Unscheduled),
            "updated" => Ok(AuditAction::Updated),
            "archived" => Ok(AuditAction::Archived),
            "restored" => Ok(AuditAction::Restored),
            "deleted" => Ok(AuditAction::Deleted),
            "maintenance_started" => Ok(AuditAction::MaintenanceStarted),
            "maintenance_completed" => Ok(AuditAction::MaintenanceCompleted),
            _ => Err(AppError::Database(format!("Invalid audit action: {}", s))),
        }
    }

    fn action_to_str(action: AuditAction) -> &'static str {
        match action {
            AuditAction::Created => "created",
            AuditAction::Published => "published",
            AuditAction::Scheduled => "scheduled",
            AuditAction::Unscheduled => "unscheduled",
            AuditAction::Updated => "updated",
            AuditAction::Archived => "archived",
            AuditAction::Restored => "restored",
            AuditAction::Deleted => "deleted",
            AuditAction::MaintenanceStarted => "maintenance_started",
            AuditAction::MaintenanceCompleted => "maintenance_completed",
        }
    }
}

#[async_trait]
impl AuditLogRepository for SqliteAuditLogRepository {
    async fn record(&self, entry: &AuditEntry) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO audit_log (
                id, announcement_id, company_id, actor_id, action, reason, recorded_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(entry.id.to_string())
        .bind(entry.announcement_id.to_string())
        .bind(entry.company_id.to_string())
        .bind(entry.actor_id.to_string())
        .bind(Self::action_to_str(entry.action))
        .bind(&entry.reason)
        .bind(entry.recorded_at.naive_utc())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(())
    }

    async fn list_recent(&self, limit: i64) -> Result<Vec<AuditEntry>> {
        let rows = sqlx::query_as::<_, AuditRow>(
            r#"
            SELECT id, announcement_id, company_id, actor_id, action, reason, recorded_at
            FROM audit_log
            ORDER BY recorded_at DESC
            LIMIT ?
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        rows.into_iter().map(Self::row_to_entry).collect()
    }

    async fn list_for_announcement(&self, announcement_id: Uuid) -> Result<Vec<AuditEntry>> {
        let rows = sqlx::query_as::<_, AuditRow>(
            r#"
            SELECT id, announcement_id, company_id, actor_id, action, reason, recorded_at
            FROM audit_log
            WHERE announcement_id = ?
            ORDER BY recorded_at DESC
            "#,
        )
        .bind(announcement_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        rows.into_iter().map(Self::row_to_entry).collect()
    }
}
