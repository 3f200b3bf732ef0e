//! Job notification events and the in-process EventBus
//!
//! A [`JobNotification`] is emitted once per terminal job transition
//! (`ready` or `failed`). Its serialized form is the outbound webhook body:
//!
//! ```json
//! {"song_id": "…", "event": "cut_complete", "payload": {"status": "failed", "error": "…"}}
//! ```

use crate::models::{JobKind, JobStatus};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Notification event names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobEvent {
    AnalysisComplete,
    CutComplete,
}

impl JobEvent {
    pub fn for_job(kind: JobKind) -> Self {
        match kind {
            JobKind::Analysis => JobEvent::AnalysisComplete,
            JobKind::Cut => JobEvent::CutComplete,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            JobEvent::AnalysisComplete => "analysis_complete",
            JobEvent::CutComplete => "cut_complete",
        }
    }
}

/// Notification payload: terminal status plus the error message on failure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationPayload {
    pub status: JobStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Outbound notification for one terminal job transition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobNotification {
    pub song_id: Uuid,
    pub event: JobEvent,
    pub payload: NotificationPayload,
}

impl JobNotification {
    /// Successful completion of `kind` for `song_id`
    pub fn ready(song_id: Uuid, kind: JobKind) -> Self {
        Self {
            song_id,
            event: JobEvent::for_job(kind),
            payload: NotificationPayload {
                status: JobStatus::Ready,
                error: None,
            },
        }
    }

    /// Failure of `kind` for `song_id` with a human-readable message
    pub fn failed(song_id: Uuid, kind: JobKind, error: impl Into<String>) -> Self {
        Self {
            song_id,
            event: JobEvent::for_job(kind),
            payload: NotificationPayload {
                status: JobStatus::Failed,
                error: Some(error.into()),
            },
        }
    }
}

/// Broadcast bus for job notifications inside one process
///
/// Uses tokio::broadcast internally:
/// - Non-blocking publish (slow subscribers don't block producers)
/// - Multiple concurrent subscribers
/// - Lagged message detection for slow subscribers
///
/// ```
/// use csync_common::events::{EventBus, JobNotification};
/// use csync_common::models::JobKind;
///
/// let bus = EventBus::new(16);
/// let mut rx = bus.subscribe();
/// bus.emit_lossy(JobNotification::ready(uuid::Uuid::nil(), JobKind::Cut));
/// assert!(rx.try_recv().is_ok());
/// ```
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<JobNotification>,
    capacity: usize,
}

impl EventBus {
    /// Create a bus buffering up to `capacity` events per subscriber
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    pub fn subscribe(&self) -> broadcast::Receiver<JobNotification> {
        self.tx.subscribe()
    }

    /// Emit an event, returning the number of subscribers that received it
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: JobNotification,
    ) -> Result<usize, broadcast::error::SendError<JobNotification>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring the absence of subscribers
    pub fn emit_lossy(&self, event: JobNotification) {
        let _ = self.tx.send(event);
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
