pub mod announcement_service;

use std::sync::Arc;

use sqlx::SqlitePool;

use crate::repository::*;
use crate::scheduler::DeferredScheduler;

pub use announcement_service::AnnouncementService;

pub struct ServiceContext {
    pub announcement_service: Arc<AnnouncementService>,
    pub announcement_repo: Arc<dyn AnnouncementRepository>,
    pub audit_repo: Arc<dyn AuditLogRepository>,
    pub scheduler: Arc<dyn DeferredScheduler>,
    pub db_pool: SqlitePool,
}

impl ServiceContext {
    pub fn new(
        announcement_repo: Arc<dyn AnnouncementRepository>,
        audit_repo: Arc<dyn AuditLogRepository>,
        scheduler: Arc<dyn DeferredScheduler>,
        db_pool: SqlitePool,
    ) -> Self {
        let announcement_service = Arc::new(AnnouncementService::new(
            announcement_repo.clone(),
            audit_repo.clone(),
            scheduler.clone(),
        ));

        Self {
            announcement_service,
            announcement_repo,
            audit_repo,
            scheduler,
            db_pool,
        }
    }
}
