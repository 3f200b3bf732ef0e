//! In-process registry of running jobs
//!
//! Guards against starting the same job twice for one song inside this
//! process. Separate processes sharing a record store are not fenced.

use csync_common::models::JobKind;
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

type JobKey = (Uuid, JobKind);

#[derive(Clone, Default)]
pub struct ActiveJobs {
    running: Arc<Mutex<HashSet<JobKey>>>,
}

impl ActiveJobs {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashSet<JobKey>> {
        // The set stays consistent even if a holder panicked
        self.running.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Register a job; `None` if the same job already runs for the song
    pub fn try_start(&self, song_id: Uuid, kind: JobKind) -> Option<ActiveJobGuard> {
        if self.lock().insert((song_id, kind)) {
            Some(ActiveJobGuard {
                jobs: self.clone(),
                key: (song_id, kind),
            })
        } else {
            None
        }
    }

    pub fn is_running(&self, song_id: Uuid, kind: JobKind) -> bool {
        self.lock().contains(&(song_id, kind))
    }

    /// Running jobs of one kind across all songs
    pub fn count(&self, kind: JobKind) -> usize {
        self.lock().iter().filter(|(_, k)| *k == kind).count()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Unregisters the job when dropped
pub struct ActiveJobGuard {
    jobs: ActiveJobs,
    key: JobKey,
}

impl Drop for ActiveJobGuard {
    fn drop(&mut self) {
        self.jobs.lock().remove(&self.key);
    }
}
