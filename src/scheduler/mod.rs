use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::error::Result;

/// Invoked when a deferred publish job fires. Implemented by the
/// announcement service; the implementation must re-check the current
/// status and treat anything other than SCHEDULED as a no-op, since a
/// human may have published, unscheduled or deleted in the meantime.
#[async_trait]
pub trait PublishCallback: Send + Sync {
    async fn publish_due(&self, announcement_id: Uuid);
}

/// Deferred job queue contract: one pending publish job per announcement.
#[async_trait]
pub trait DeferredScheduler: Send + Sync {
    /// Enqueues a publish job to fire at `run_at`. Replaces any job
    /// already pending for the same announcement.
    async fn enqueue(&self, announcement_id: Uuid, run_at: DateTime<Utc>) -> Result<()>;

    /// Cancels the pending job, if any. Cancelling a job that already
    /// fired (or never existed) is not an error.
    async fn cancel(&self, announcement_id: Uuid) -> Result<()>;
}

/// In-process scheduler: one spawned task per pending job, sleeping
/// until its run time. Jobs do not survive a restart on their own;
/// `AnnouncementService::resume_scheduled_jobs` re-enqueues them from
/// the database at boot.
pub struct TokioScheduler {
    jobs: Arc<Mutex<HashMap<Uuid, PendingJob>>>,
    generations: AtomicU64,
    // Installed after construction: the service owns the scheduler, so
    // the callback cannot be passed to new().
    callback: Arc<RwLock<Option<Arc<dyn PublishCallback>>>>,
}

struct PendingJob {
    // Distinguishes this job from any replacement enqueued for the same
    // announcement, so a fired job only ever cleans up its own entry.
    generation: u64,
    handle: JoinHandle<()>,
}

impl TokioScheduler {
    pub fn new() -> Self {
        Self {
            jobs: Arc::new(Mutex::new(HashMap::new())),
            generations: AtomicU64::new(0),
            callback: Arc::new(RwLock::new(None)),
        }
    }

    pub async fn set_callback(&self, callback: Arc<dyn PublishCallback>) {
        *self.callback.write().await = Some(callback);
    }

    pub async fn pending_count(&self) -> usize {
        self.jobs.lock().await.len()
    }
}

impl Default for TokioScheduler {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DeferredScheduler for TokioScheduler {
    async fn enqueue(&self, announcement_id: Uuid, run_at: DateTime<Utc>) -> Result<()> {
        let generation = self.generations.fetch_add(1, Ordering::Relaxed);
        let mut jobs = self.jobs.lock().await;

        if let Some(job) = jobs.remove(&announcement_id) {
            tracing::debug!("Replacing pending publish job for {}", announcement_id);
            job.handle.abort();
        }

        // A run time already in the past fires immediately.
        let delay = (run_at - Utc::now()).to_std().unwrap_or_default();

        let jobs_ref = Arc::clone(&self.jobs);
        let callback_ref = Arc::clone(&self.callback);

        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;

            let callback = callback_ref.read().await.clone();
            match callback {
                Some(callback) => callback.publish_due(announcement_id).await,
                None => tracing::warn!(
                    "Publish job fired for {} but no callback is installed",
                    announcement_id
                ),
            }

            // A replacement may have been enqueued while the callback
            // ran; only evict the entry this task created.
            let mut jobs = jobs_ref.lock().await;
            if jobs.get(&announcement_id).map(|job| job.generation) == Some(generation) {
                jobs.remove(&announcement_id);
            }
        });

        jobs.insert(announcement_id, PendingJob { generation, handle });
        tracing::info!(
            "Enqueued publish job for {} at {}",
            announcement_id,
            run_at
        );

        Ok(())
    }

    async fn cancel(&self, announcement_id: Uuid) -> Result<()> {
        let mut jobs = self.jobs.lock().await;

        match jobs.remove(&announcement_id) {
            Some(job) => {
                job.handle.abort();
                tracing::info!("Cancelled publish job for {}", announcement_id);
            }
            None => {
                // Benign: the job already fired or was never enqueued.
                tracing::debug!("No pending publish job for {}", announcement_id);
            }
        }

        Ok(())
    }
}

/// Records enqueue/cancel calls without running anything. Used by tests
/// to assert on scheduling side effects.
#[cfg(any(test, feature = "test-utils"))]
pub struct RecordingScheduler {
    calls: std::sync::Mutex<Vec<SchedulerCall>>,
}

#[cfg(any(test, feature = "test-utils"))]
#[derive(Debug, Clone, PartialEq)]
pub enum SchedulerCall {
    Enqueue {
        announcement_id: Uuid,
        run_at: DateTime<Utc>,
    },
    Cancel {
        announcement_id: Uuid,
    },
}

#[cfg(any(test, feature = "test-utils"))]
impl RecordingScheduler {
    pub fn new() -> Self {
        Self {
            calls: std::sync::Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<SchedulerCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn enqueued_for(&self, announcement_id: Uuid) -> Option<DateTime<Utc>> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find_map(|call| match call {
                SchedulerCall::Enqueue {
                    announcement_id: id,
                    run_at,
                } if *id == announcement_id => Some(*run_at),
                _ => None,
            })
    }

    pub fn was_cancelled(&self, announcement_id: Uuid) -> bool {
        self.calls.lock().unwrap().iter().any(|call| {
            matches!(call, SchedulerCall::Cancel { announcement_id: id } if *id == announcement_id)
        })
    }
}

#[cfg(any(test, feature = "test-utils"))]
impl Default for RecordingScheduler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(any(test, feature = "test-utils"))]
#[async_trait]
impl DeferredScheduler for RecordingScheduler {
    async fn enqueue(&self, announcement_id: Uuid, run_at: DateTime<Utc>) -> Result<()> {
        self.calls.lock().unwrap().push(SchedulerCall::Enqueue {
            announcement_id,
            run_at,
        });
        Ok(())
    }

    async fn cancel(&self, announcement_id: Uuid) -> Result<()> {
        self.calls
            .lock()
            .unwrap()
            .push(SchedulerCall::Cancel { announcement_id });
        Ok(())
    }
}
