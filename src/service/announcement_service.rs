use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::{
    domain::*,
    error::{AppError, FieldErrors, Result},
    repository::{AnnouncementRepository, AuditLogRepository},
    scheduler::{DeferredScheduler, PublishCallback},
};

/// Minimum lead time for a deferred publish.
const MIN_SCHEDULE_LEAD_MINUTES: i64 = 5;
/// Maximum horizon for a deferred publish.
const MAX_SCHEDULE_AHEAD_DAYS: i64 = 365;
const MAX_AFFECTED_SERVICES: usize = 20;

/// Enforces the announcement publication state machine:
///
/// ```text
/// DRAFT ──────► SCHEDULED ──────► PUBLISHED ──────► ARCHIVED
///   │ ▲             │                 ▲                │
///   │ └─────────────┘ (unschedule)    │                │
///   └─────────────────────────────────┘ (publish now)  │
///   ▲                                                  │
///   └──────────────────────────────────────────────────┘ (restore)
/// ```
///
/// Every mutation runs as a guarded read-modify-write against the
/// repository, so two racing requests cannot both win a transition.
pub struct AnnouncementService {
    repo: Arc<dyn AnnouncementRepository>,
    audit: Arc<dyn AuditLogRepository>,
    scheduler: Arc<dyn DeferredScheduler>,
}

impl AnnouncementService {
    pub fn new(
        repo: Arc<dyn AnnouncementRepository>,
        audit: Arc<dyn AuditLogRepository>,
        scheduler: Arc<dyn DeferredScheduler>,
    ) -> Self {
        Self {
            repo,
            audit,
            scheduler,
        }
    }

    pub async fn create(
        &self,
        caller: &Caller,
        request: CreateAnnouncementRequest,
    ) -> Result<Announcement> {
        let company_id = self.require_company_admin(caller, "create")?;

        let now = Utc::now();
        let validated = validate_create(&request, now)?;

        let (status, published_at) = match request.action {
            CreateAction::Draft => (PublicationStatus::Draft, None),
            CreateAction::Publish => (PublicationStatus::Published, Some(now)),
            CreateAction::Schedule => (PublicationStatus::Scheduled, None),
        };

        let mut metadata = validated.metadata;
        let scheduled_for = if request.action == CreateAction::Schedule {
            // Presence + window already validated above.
            metadata.set_scheduled_for(request.scheduled_for);
            request.scheduled_for
        } else {
            None
        };

        let announcement = Announcement {
            id: Uuid::new_v4(),
            company_id,
            author_id: caller.user_id,
            title: validated.title,
            content: validated.content,
            announcement_type: validated.announcement_type,
            status,
            metadata,
            published_at,
            created_at: now,
            updated_at: now,
        };

        let created = self.repo.create(announcement).await?;

        if let Some(run_at) = scheduled_for {
            self.scheduler.enqueue(created.id, run_at).await?;
        }

        self.record(&created, caller.user_id, AuditAction::Created, request.reason.clone())
            .await;
        match request.action {
            CreateAction::Publish => {
                self.record(&created, caller.user_id, AuditAction::Published, None)
                    .await
            }
            CreateAction::Schedule => {
                self.record(&created, caller.user_id, AuditAction::Scheduled, None)
                    .await
            }
            CreateAction::Draft => {}
        }

        Ok(created)
    }

    pub async fn get(&self, id: Uuid, caller: &Caller) -> Result<Announcement> {
        let announcement = self.load(id).await?;

        match caller.role {
            Role::PlatformAdmin => Ok(announcement),
            Role::CompanyAdmin if caller.company_id == Some(announcement.company_id) => {
                Ok(announcement)
            }
            Role::Agent | Role::User
                if announcement.status == PublicationStatus::Published =>
            {
                Ok(announcement)
            }
            _ => Err(AppError::Forbidden("Insufficient permissions".to_string())),
        }
    }

    pub async fn list(&self, caller: &Caller, mut filter: AnnouncementFilter) -> Result<Vec<Announcement>> {
        match caller.role {
            Role::PlatformAdmin => {
                // Platform admins see everything, optionally narrowed by company.
            }
            Role::CompanyAdmin => {
                let company_id = caller
                    .company_id
                    .ok_or_else(|| AppError::Forbidden("Insufficient permissions".to_string()))?;
                filter.company_id = Some(company_id);
            }
            Role::Agent | Role::User => {
                filter.status = Some(PublicationStatus::Published);
            }
        }

        self.repo.list(&filter).await
    }

    pub async fn publish(&self, id: Uuid, caller: &Caller, reason: Option<String>) -> Result<Announcement> {
        let announcement = self.load(id).await?;
        self.authorize(&announcement, caller, "publish")?;
        guard_publish(announcement.status)?;

        let was_scheduled = announcement.status == PublicationStatus::Scheduled;
        let prior_status = announcement.status;
        let prior_updated_at = announcement.updated_at;

        let mut updated = announcement;
        updated.status = PublicationStatus::Published;
        updated.published_at = Some(Utc::now());
        updated.metadata.set_scheduled_for(None);

        let saved = self
            .repo
            .update_guarded(id, prior_status, prior_updated_at, &updated)
            .await?;
        let saved = match saved {
            Some(saved) => saved,
            None => return Err(self.lost_race(id, guard_publish).await),
        };

        if was_scheduled {
            self.scheduler.cancel(id).await?;
        }

        self.record(&saved, caller.user_id, AuditAction::Published, reason)
            .await;

        Ok(saved)
    }

    pub async fn schedule(
        &self,
        id: Uuid,
        caller: &Caller,
        scheduled_for: DateTime<Utc>,
        reason: Option<String>,
    ) -> Result<Announcement> {
        let announcement = self.load(id).await?;
        self.authorize(&announcement, caller, "modify")?;
        guard_schedule(announcement.status)?;

        if let Some(message) = schedule_window_error(scheduled_for, Utc::now()) {
            return Err(AppError::validation("scheduled_for", message));
        }

        let prior_status = announcement.status;
        let prior_updated_at = announcement.updated_at;

        let mut updated = announcement;
        updated.status = PublicationStatus::Scheduled;
        updated.metadata.set_scheduled_for(Some(scheduled_for));

        let saved = self
            .repo
            .update_guarded(id, prior_status, prior_updated_at, &updated)
            .await?;
        let saved = match saved {
            Some(saved) => saved,
            None => return Err(self.lost_race(id, guard_schedule).await),
        };

        // Enqueue replaces any pending job, which makes rescheduling an
        // already-scheduled announcement a single call.
        self.scheduler.enqueue(id, scheduled_for).await?;

        self.record(&saved, caller.user_id, AuditAction::Scheduled, reason)
            .await;

        Ok(saved)
    }

    pub async fn unschedule(&self, id: Uuid, caller: &Caller, reason: Option<String>) -> Result<Announcement> {
        let announcement = self.load(id).await?;
        self.authorize(&announcement, caller, "modify")?;
        guard_unschedule(announcement.status)?;

        let prior_updated_at = announcement.updated_at;

        let mut updated = announcement;
        updated.status = PublicationStatus::Draft;
        updated.metadata.set_scheduled_for(None);

        let saved = self
            .repo
            .update_guarded(id, PublicationStatus::Scheduled, prior_updated_at, &updated)
            .await?;
        let saved = match saved {
            Some(saved) => saved,
            None => return Err(self.lost_race(id, guard_unschedule).await),
        };

        self.scheduler.cancel(id).await?;

        self.record(&saved, caller.user_id, AuditAction::Unscheduled, reason)
            .await;

        Ok(saved)
    }

    /// Partial update of title/content/metadata. Never touches the
    /// announcement type, company, status or the pending publish job.
    pub async fn update(
        &self,
        id: Uuid,
        caller: &Caller,
        request: UpdateAnnouncementRequest,
    ) -> Result<Announcement> {
        let announcement = self.load(id).await?;
        self.authorize(&announcement, caller, "modify")?;
        guard_update(announcement.status)?;

        let prior_status = announcement.status;
        let prior_updated_at = announcement.updated_at;

        let mut updated = announcement;
        apply_update(&mut updated, &request)?;

        let saved = self
            .repo
            .update_guarded(id, prior_status, prior_updated_at, &updated)
            .await?;
        let saved = match saved {
            Some(saved) => saved,
            None => return Err(self.lost_race(id, guard_update).await),
        };

        self.record(&saved, caller.user_id, AuditAction::Updated, request.reason.clone())
            .await;

        Ok(saved)
    }

    pub async fn delete(&self, id: Uuid, caller: &Caller, reason: Option<String>) -> Result<()> {
        let announcement = self.load(id).await?;
        self.authorize(&announcement, caller, "delete")?;
        guard_delete(announcement.status)?;

        // Deleting is only reachable from DRAFT or ARCHIVED, so there is
        // never a pending publish job to cancel here. If policy ever
        // allows deleting SCHEDULED directly, a scheduler.cancel must be
        // added alongside this delete.
        let deleted = self.repo.delete_guarded(id, announcement.status).await?;
        if !deleted {
            return Err(self.lost_race(id, guard_delete).await);
        }

        self.record(&announcement, caller.user_id, AuditAction::Deleted, reason)
            .await;

        Ok(())
    }

    pub async fn archive(&self, id: Uuid, caller: &Caller, reason: Option<String>) -> Result<Announcement> {
        let announcement = self.load(id).await?;
        self.authorize(&announcement, caller, "modify")?;
        guard_archive(announcement.status)?;

        let prior_updated_at = announcement.updated_at;

        // published_at survives archival; only restore clears it.
        let mut updated = announcement;
        updated.status = PublicationStatus::Archived;

        let saved = self
            .repo
            .update_guarded(id, PublicationStatus::Published, prior_updated_at, &updated)
            .await?;
        let saved = match saved {
            Some(saved) => saved,
            None => return Err(self.lost_race(id, guard_archive).await),
        };

        self.record(&saved, caller.user_id, AuditAction::Archived, reason)
            .await;

        Ok(saved)
    }

    pub async fn restore(&self, id: Uuid, caller: &Caller, reason: Option<String>) -> Result<Announcement> {
        let announcement = self.load(id).await?;
        self.authorize(&announcement, caller, "modify")?;
        guard_restore(announcement.status)?;

        let prior_updated_at = announcement.updated_at;

        let mut updated = announcement;
        updated.status = PublicationStatus::Draft;
        updated.published_at = None;

        let saved = self
            .repo
            .update_guarded(id, PublicationStatus::Archived, prior_updated_at, &updated)
            .await?;
        let saved = match saved {
            Some(saved) => saved,
            None => return Err(self.lost_race(id, guard_restore).await),
        };

        self.record(&saved, caller.user_id, AuditAction::Restored, reason)
            .await;

        Ok(saved)
    }

    /// Records the real-world start of a maintenance window. Write-once:
    /// a second call fails and leaves the first timestamp intact.
    pub async fn mark_maintenance_start(&self, id: Uuid, caller: &Caller) -> Result<Announcement> {
        let announcement = self.load(id).await?;
        self.authorize(&announcement, caller, "modify")?;

        let prior_status = announcement.status;
        let prior_updated_at = announcement.updated_at;

        let mut updated = announcement;
        {
            let maintenance = updated.metadata.as_maintenance_mut().ok_or_else(|| {
                AppError::BadRequest("Announcement is not a maintenance announcement".to_string())
            })?;

            if maintenance.actual_start.is_some() {
                return Err(AppError::InvalidState(
                    "Maintenance start already marked".to_string(),
                ));
            }
            maintenance.actual_start = Some(Utc::now());
        }

        let saved = self
            .repo
            .update_guarded(id, prior_status, prior_updated_at, &updated)
            .await?;
        let saved = match saved {
            Some(saved) => saved,
            None => return Err(self.lost_mark_race(id, MarkKind::Start).await),
        };

        self.record(&saved, caller.user_id, AuditAction::MaintenanceStarted, None)
            .await;

        Ok(saved)
    }

    /// Records the real-world end of a maintenance window. Requires the
    /// start to have been marked first; write-once like the start marker.
    pub async fn mark_maintenance_end(&self, id: Uuid, caller: &Caller) -> Result<Announcement> {
        let announcement = self.load(id).await?;
        self.authorize(&announcement, caller, "modify")?;

        let prior_status = announcement.status;
        let prior_updated_at = announcement.updated_at;

        let mut updated = announcement;
        {
            let maintenance = updated.metadata.as_maintenance_mut().ok_or_else(|| {
                AppError::BadRequest("Announcement is not a maintenance announcement".to_string())
            })?;

            let actual_start = maintenance
                .actual_start
                .ok_or_else(|| AppError::InvalidState("Mark start first".to_string()))?;
            if maintenance.actual_end.is_some() {
                return Err(AppError::InvalidState(
                    "Maintenance already completed".to_string(),
                ));
            }

            let now = Utc::now();
            if now <= actual_start {
                return Err(AppError::validation(
                    "actual_end",
                    "actual_end must be after actual_start",
                ));
            }
            maintenance.actual_end = Some(now);
        }

        let saved = self
            .repo
            .update_guarded(id, prior_status, prior_updated_at, &updated)
            .await?;
        let saved = match saved {
            Some(saved) => saved,
            None => return Err(self.lost_mark_race(id, MarkKind::End).await),
        };

        self.record(&saved, caller.user_id, AuditAction::MaintenanceCompleted, None)
            .await;

        Ok(saved)
    }

    /// Re-enqueues publish jobs for announcements left in SCHEDULED by a
    /// previous process. Called once at boot; past-due jobs fire
    /// immediately.
    pub async fn resume_scheduled_jobs(&self) -> Result<usize> {
        let filter = AnnouncementFilter {
            status: Some(PublicationStatus::Scheduled),
            limit: i64::MAX,
            ..Default::default()
        };

        let scheduled = self.repo.list(&filter).await?;
        let mut resumed = 0;

        for announcement in &scheduled {
            match announcement.metadata.scheduled_for() {
                Some(run_at) => {
                    self.scheduler.enqueue(announcement.id, run_at).await?;
                    resumed += 1;
                }
                None => {
                    tracing::warn!(
                        "Announcement {} is SCHEDULED but has no scheduled_for",
                        announcement.id
                    );
                }
            }
        }

        if resumed > 0 {
            tracing::info!("Resumed {} pending publish jobs", resumed);
        }

        Ok(resumed)
    }

    async fn load(&self, id: Uuid) -> Result<Announcement> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Announcement not found".to_string()))
    }

    fn require_company_admin(&self, caller: &Caller, verb: &str) -> Result<Uuid> {
        match caller.role {
            Role::CompanyAdmin => caller
                .company_id
                .ok_or_else(|| AppError::Forbidden("Insufficient permissions".to_string())),
            Role::PlatformAdmin => Err(AppError::Forbidden(format!(
                "Platform admins cannot {} company announcements",
                verb
            ))),
            _ => Err(AppError::Forbidden("Insufficient permissions".to_string())),
        }
    }

    /// Mutations require the owning company's admin. Platform admins are
    /// read-only over company announcements and get a role-specific
    /// message; everyone else gets the generic one.
    fn authorize(&self, announcement: &Announcement, caller: &Caller, verb: &str) -> Result<()> {
        match caller.role {
            Role::CompanyAdmin if caller.company_id == Some(announcement.company_id) => Ok(()),
            Role::PlatformAdmin => Err(AppError::Forbidden(format!(
                "Platform admins cannot {} company announcements",
                verb
            ))),
            _ => Err(AppError::Forbidden("Insufficient permissions".to_string())),
        }
    }

    /// A guarded write matched zero rows: a concurrent request changed
    /// the row between our read and write. Re-derive the error the
    /// caller would have seen had it arrived second.
    async fn lost_race(&self, id: Uuid, guard: fn(PublicationStatus) -> Result<()>) -> AppError {
        match self.repo.find_by_id(id).await {
            Ok(Some(fresh)) => match guard(fresh.status) {
                Err(e) => e,
                Ok(()) => AppError::Conflict("Announcement was modified concurrently".to_string()),
            },
            Ok(None) => AppError::NotFound("Announcement not found".to_string()),
            Err(e) => e,
        }
    }

    async fn lost_mark_race(&self, id: Uuid, kind: MarkKind) -> AppError {
        match self.repo.find_by_id(id).await {
            Ok(Some(fresh)) => {
                let maintenance = fresh.metadata.as_maintenance();
                let already = match (kind, maintenance) {
                    (MarkKind::Start, Some(m)) => m.actual_start.is_some(),
                    (MarkKind::End, Some(m)) => m.actual_end.is_some(),
                    _ => false,
                };
                if already {
                    match kind {
                        MarkKind::Start => {
                            AppError::InvalidState("Maintenance start already marked".to_string())
                        }
                        MarkKind::End => {
                            AppError::InvalidState("Maintenance already completed".to_string())
                        }
                    }
                } else {
                    AppError::Conflict("Announcement was modified concurrently".to_string())
                }
            }
            Ok(None) => AppError::NotFound("Announcement not found".to_string()),
            Err(e) => e,
        }
    }

    /// Fire-and-forget audit write: failures are logged, never surfaced.
    async fn record(
        &self,
        announcement: &Announcement,
        actor_id: Uuid,
        action: AuditAction,
        reason: Option<String>,
    ) {
        let entry = AuditEntry::new(
            announcement.id,
            announcement.company_id,
            actor_id,
            action,
            reason,
        );
        if let Err(e) = self.audit.record(&entry).await {
            tracing::error!(
                "Failed to record audit entry for announcement {}: {:?}",
                announcement.id,
                e
            );
        }
    }
}

#[derive(Clone, Copy)]
enum MarkKind {
    Start,
    End,
}

#[async_trait]
impl PublishCallback for AnnouncementService {
    /// Deferred publish. A human may have published, unscheduled or
    /// deleted the announcement since the job was enqueued; all of those
    /// are benign no-ops here, not errors.
    async fn publish_due(&self, announcement_id: Uuid) {
        let announcement = match self.repo.find_by_id(announcement_id).await {
            Ok(Some(announcement)) => announcement,
            Ok(None) => {
                tracing::info!(
                    "Publish job fired for {} but it no longer exists",
                    announcement_id
                );
                return;
            }
            Err(e) => {
                tracing::error!(
                    "Publish job for {} failed to load announcement: {:?}",
                    announcement_id,
                    e
                );
                return;
            }
        };

        if announcement.status != PublicationStatus::Scheduled {
            tracing::info!(
                "Publish job fired for {} but status is no longer SCHEDULED",
                announcement_id
            );
            return;
        }

        let prior_updated_at = announcement.updated_at;
        let company_id = announcement.company_id;

        let mut updated = announcement;
        updated.status = PublicationStatus::Published;
        updated.published_at = Some(Utc::now());
        updated.metadata.set_scheduled_for(None);

        match self
            .repo
            .update_guarded(
                announcement_id,
                PublicationStatus::Scheduled,
                prior_updated_at,
                &updated,
            )
            .await
        {
            Ok(Some(_)) => {
                tracing::info!("Published scheduled announcement {}", announcement_id);
                // System action: recorded with the nil actor.
                let entry = AuditEntry::new(
                    announcement_id,
                    company_id,
                    Uuid::nil(),
                    AuditAction::Published,
                    None,
                );
                if let Err(e) = self.audit.record(&entry).await {
                    tracing::error!(
                        "Failed to record audit entry for announcement {}: {:?}",
                        announcement_id,
                        e
                    );
                }
            }
            Ok(None) => {
                tracing::info!(
                    "Publish job for {} lost to a concurrent transition",
                    announcement_id
                );
            }
            Err(e) => {
                tracing::error!("Publish job for {} failed: {:?}", announcement_id, e);
            }
        }
    }
}

fn guard_publish(status: PublicationStatus) -> Result<()> {
    match status {
        PublicationStatus::Published => Err(AppError::InvalidState(
            "Announcement is already published".to_string(),
        )),
        PublicationStatus::Archived => Err(AppError::InvalidState(
            "Cannot publish archived announcement".to_string(),
        )),
        PublicationStatus::Draft | PublicationStatus::Scheduled => Ok(()),
    }
}

fn guard_schedule(status: PublicationStatus) -> Result<()> {
    match status {
        PublicationStatus::Published => Err(AppError::InvalidState(
            "Cannot schedule already published announcement".to_string(),
        )),
        PublicationStatus::Archived => Err(AppError::InvalidState(
            "Cannot schedule archived announcement".to_string(),
        )),
        // Scheduling an already-scheduled announcement reschedules it.
        PublicationStatus::Draft | PublicationStatus::Scheduled => Ok(()),
    }
}

fn guard_unschedule(status: PublicationStatus) -> Result<()> {
    match status {
        PublicationStatus::Scheduled => Ok(()),
        PublicationStatus::Published => Err(AppError::InvalidState(
            "Cannot unschedule published announcement".to_string(),
        )),
        PublicationStatus::Draft | PublicationStatus::Archived => Err(AppError::InvalidState(
            "Announcement is not scheduled".to_string(),
        )),
    }
}

fn guard_update(status: PublicationStatus) -> Result<()> {
    match status {
        PublicationStatus::Draft | PublicationStatus::Scheduled => Ok(()),
        PublicationStatus::Published => Err(AppError::Forbidden(
            "Cannot edit published announcement".to_string(),
        )),
        PublicationStatus::Archived => Err(AppError::Forbidden(
            "Cannot edit archived announcement".to_string(),
        )),
    }
}

fn guard_delete(status: PublicationStatus) -> Result<()> {
    match status {
        PublicationStatus::Draft | PublicationStatus::Archived => Ok(()),
        PublicationStatus::Published => Err(AppError::Forbidden(
            "Cannot delete published announcement. Archive it first.".to_string(),
        )),
        PublicationStatus::Scheduled => Err(AppError::Forbidden(
            "Cannot delete scheduled announcement. Unschedule it first.".to_string(),
        )),
    }
}

fn guard_archive(status: PublicationStatus) -> Result<()> {
    match status {
        PublicationStatus::Published => Ok(()),
        _ => Err(AppError::InvalidState(
            "Only published announcements can be archived".to_string(),
        )),
    }
}

fn guard_restore(status: PublicationStatus) -> Result<()> {
    match status {
        PublicationStatus::Archived => Ok(()),
        _ => Err(AppError::InvalidState(
            "Only archived announcements can be restored".to_string(),
        )),
    }
}

#[derive(Debug)]
struct ValidatedCreate {
    title: String,
    content: String,
    announcement_type: AnnouncementType,
    metadata: AnnouncementMetadata,
}

fn validate_create(request: &CreateAnnouncementRequest, now: DateTime<Utc>) -> Result<ValidatedCreate> {
    let mut errors = FieldErrors::new();

    let title = match request.title.as_deref().map(str::trim) {
        Some(t) if !t.is_empty() => Some(t.to_string()),
        _ => {
            errors.push("title", "title is required");
            None
        }
    };
    let content = match request.content.as_deref().map(str::trim) {
        Some(c) if !c.is_empty() => Some(c.to_string()),
        _ => {
            errors.push("content", "content is required");
            None
        }
    };
    let announcement_type = match request.announcement_type {
        Some(t) => Some(t),
        None => {
            errors.push("announcement_type", "announcement_type is required");
            None
        }
    };

    let urgency = match request.urgency.as_deref() {
        Some(raw) => match Urgency::parse(raw) {
            Some(u) => Some(u),
            None => {
                errors.push("urgency", "urgency must be LOW, MEDIUM, HIGH or CRITICAL");
                None
            }
        },
        None => {
            errors.push("urgency", "urgency is required");
            None
        }
    };

    let affected_services = request.affected_services.clone().unwrap_or_default();
    if affected_services.len() > MAX_AFFECTED_SERVICES {
        errors.push(
            "affected_services",
            "affected_services must not contain more than 20 entries",
        );
    }

    if request.action == CreateAction::Schedule {
        match request.scheduled_for {
            None => errors.push("scheduled_for", "scheduled_for is required when scheduling"),
            Some(scheduled_for) => {
                if let Some(message) = schedule_window_error(scheduled_for, now) {
                    errors.push("scheduled_for", message);
                }
            }
        }
    }

    let metadata = match announcement_type {
        Some(AnnouncementType::General) => urgency.map(|urgency| {
            AnnouncementMetadata::General(GeneralMetadata {
                urgency,
                affected_services: affected_services.clone(),
                scheduled_for: None,
            })
        }),
        Some(AnnouncementType::Maintenance) => {
            if urgency == Some(Urgency::Critical) {
                errors.push(
                    "urgency",
                    "urgency must be LOW, MEDIUM or HIGH for maintenance announcements",
                );
            }

            let scheduled_start = request.scheduled_start;
            let scheduled_end = request.scheduled_end;
            if scheduled_start.is_none() {
                errors.push("scheduled_start", "scheduled_start is required");
            }
            if scheduled_end.is_none() {
                errors.push("scheduled_end", "scheduled_end is required");
            }
            if let (Some(start), Some(end)) = (scheduled_start, scheduled_end) {
                if end <= start {
                    errors.push("scheduled_end", "scheduled_end must be after scheduled_start");
                }
            }
            if request.is_emergency.is_none() {
                errors.push("is_emergency", "is_emergency is required");
            }

            match (urgency, scheduled_start, scheduled_end, request.is_emergency) {
                (Some(urgency), Some(scheduled_start), Some(scheduled_end), Some(is_emergency))
                    if urgency != Urgency::Critical =>
                {
                    Some(AnnouncementMetadata::Maintenance(MaintenanceMetadata {
                        urgency,
                        scheduled_start,
                        scheduled_end,
                        is_emergency,
                        affected_services: affected_services.clone(),
                        scheduled_for: None,
                        actual_start: None,
                        actual_end: None,
                    }))
                }
                _ => None,
            }
        }
        None => None,
    };

    errors.into_result()?;

    // All components validated above; unwraps here cannot fire.
    match (title, content, announcement_type, metadata) {
        (Some(title), Some(content), Some(announcement_type), Some(metadata)) => {
            Ok(ValidatedCreate {
                title,
                content,
                announcement_type,
                metadata,
            })
        }
        _ => Err(AppError::Internal(
            "create validation produced no field errors but is incomplete".to_string(),
        )),
    }
}

fn apply_update(announcement: &mut Announcement, request: &UpdateAnnouncementRequest) -> Result<()> {
    let mut errors = FieldErrors::new();

    if let Some(title) = &request.title {
        announcement.title = title.clone();
    }
    if let Some(content) = &request.content {
        announcement.content = content.clone();
    }

    let urgency = match request.urgency.as_deref() {
        Some(raw) => match Urgency::parse(raw) {
            Some(u) => Some(u),
            None => {
                errors.push("urgency", "urgency must be LOW, MEDIUM, HIGH or CRITICAL");
                None
            }
        },
        None => None,
    };

    if let Some(services) = &request.affected_services {
        if services.len() > MAX_AFFECTED_SERVICES {
            errors.push(
                "affected_services",
                "affected_services must not contain more than 20 entries",
            );
        }
    }

    match &mut announcement.metadata {
        AnnouncementMetadata::General(metadata) => {
            if let Some(urgency) = urgency {
                metadata.urgency = urgency;
            }
            if let Some(services) = &request.affected_services {
                if services.len() <= MAX_AFFECTED_SERVICES {
                    metadata.affected_services = services.clone();
                }
            }
            // Maintenance-only fields on a general announcement are
            // silently ignored, like type/company changes.
        }
        AnnouncementMetadata::Maintenance(metadata) => {
            match urgency {
                Some(Urgency::Critical) => errors.push(
                    "urgency",
                    "urgency must be LOW, MEDIUM or HIGH for maintenance announcements",
                ),
                Some(urgency) => metadata.urgency = urgency,
                None => {}
            }

            let new_start = request.scheduled_start.unwrap_or(metadata.scheduled_start);
            let new_end = request.scheduled_end.unwrap_or(metadata.scheduled_end);
            if (request.scheduled_start.is_some() || request.scheduled_end.is_some())
                && new_end <= new_start
            {
                errors.push("scheduled_end", "scheduled_end must be after scheduled_start");
            } else {
                metadata.scheduled_start = new_start;
                metadata.scheduled_end = new_end;
            }

            if let Some(is_emergency) = request.is_emergency {
                metadata.is_emergency = is_emergency;
            }
            if let Some(services) = &request.affected_services {
                if services.len() <= MAX_AFFECTED_SERVICES {
                    metadata.affected_services = services.clone();
                }
            }
        }
    }

    errors.into_result()
}

fn schedule_window_error(scheduled_for: DateTime<Utc>, now: DateTime<Utc>) -> Option<&'static str> {
    if scheduled_for < now + Duration::minutes(MIN_SCHEDULE_LEAD_MINUTES) {
        return Some("scheduled_for must be at least 5 minutes in the future");
    }
    if scheduled_for > now + Duration::days(MAX_SCHEDULE_AHEAD_DAYS) {
        return Some("scheduled_for must not be more than 1 year in the future");
    }
    None
}
