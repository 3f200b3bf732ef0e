//! Job status transitions and terminal notifications

use csync_common::events::JobNotification;
use csync_common::models::{JobKind, JobStatus};
use sqlx::SqlitePool;
use std::future::Future;
use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;

use crate::collaborators::Notifier;
use crate::db::songs;
use crate::error::CutResult;

/// Wraps one job run with its status writes and notification
///
/// The `running` write happens before the job starts; if it fails the job
/// never runs and the error is returned as-is. Once the job has started,
/// every outcome ends in exactly one notification.
#[derive(Clone)]
pub struct JobStatusTracker {
    db: SqlitePool,
    notifier: Arc<dyn Notifier>,
}

impl JobStatusTracker {
    pub fn new(db: SqlitePool, notifier: Arc<dyn Notifier>) -> Self {
        Self { db, notifier }
    }

    /// Run `job` for `song_id`
    ///
    /// The job itself persists its artifact together with the `ready`
    /// status. On error the `failed` status is written, the notification
    /// sent, and the original error returned.
    pub async fn track<T, F>(&self, song_id: Uuid, kind: JobKind, job: F) -> CutResult<T>
    where
        F: Future<Output = CutResult<T>>,
    {
        songs::set_job_status(&self.db, song_id, kind, JobStatus::Running).await?;
        info!(song_id = %song_id, job = %kind, "Job started");

        match job.await {
            Ok(value) => {
                info!(song_id = %song_id, job = %kind, "Job ready");
                self.notifier
                    .notify(&JobNotification::ready(song_id, kind))
                    .await;
                Ok(value)
            }
            Err(err) => {
                error!(song_id = %song_id, job = %kind, error = %err, "Job failed");

                if let Err(status_err) =
                    songs::set_job_status(&self.db, song_id, kind, JobStatus::Failed).await
                {
                    error!(
                        song_id = %song_id,
                        job = %kind,
                        error = %status_err,
                        "Could not record failed status"
                    );
                }

                self.notifier
                    .notify(&JobNotification::failed(song_id, kind, err.to_string()))
                    .await;
                Err(err)
            }
        }
    }
}
