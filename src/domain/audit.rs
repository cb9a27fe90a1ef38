use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One recorded mutation. Written fire-and-forget; failures to record
/// never fail the operation that triggered them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: Uuid,
    pub announcement_id: Uuid,
    pub company_id: Uuid,
    pub actor_id: Uuid,
    pub action: AuditAction,
    pub reason: Option<String>,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    Created,
    Published,
    Scheduled,
    Unscheduled,
    Updated,
    Archived,
    Restored,
    Deleted,
    MaintenanceStarted,
    MaintenanceCompleted,
}

impl AuditEntry {
    pub fn new(
        announcement_id: Uuid,
        company_id: Uuid,
        actor_id: Uuid,
        action: AuditAction,
        reason: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            announcement_id,
            company_id,
            actor_id,
            action,
            reason,
            recorded_at: Utc::now(),
        }
    }
}
