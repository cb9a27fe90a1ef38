use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::*;
use crate::error::Result;

pub mod announcement_repository;
pub mod audit_log_repository;

pub use announcement_repository::SqliteAnnouncementRepository;
pub use audit_log_repository::SqliteAuditLogRepository;

#[async_trait]
pub trait AnnouncementRepository: Send + Sync {
    async fn create(&self, announcement: Announcement) -> Result<Announcement>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Announcement>>;
    async fn list(&self, filter: &AnnouncementFilter) -> Result<Vec<Announcement>>;

    /// Persists a modified announcement only if the stored row still has
    /// the expected status and updated_at. Returns the saved row, or
    /// `None` when a concurrent writer got there first.
    async fn update_guarded(
        &self,
        id: Uuid,
        expected_status: PublicationStatus,
        expected_updated_at: DateTime<Utc>,
        announcement: &Announcement,
    ) -> Result<Option<Announcement>>;

    /// Hard-deletes the row only if it still has the expected status.
    /// Returns false when a concurrent writer moved it out from under us.
    async fn delete_guarded(&self, id: Uuid, expected_status: PublicationStatus) -> Result<bool>;
}

#[async_trait]
pub trait AuditLogRepository: Send + Sync {
    async fn record(&self, entry: &AuditEntry) -> Result<()>;
    async fn list_recent(&self, limit: i64) -> Result<Vec<AuditEntry>>;
    async fn list_for_announcement(&self, announcement_id: Uuid) -> Result<Vec<AuditEntry>>;
}
