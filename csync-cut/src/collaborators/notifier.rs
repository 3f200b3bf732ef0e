//! Job notification sinks
//!
//! All sinks are best-effort: delivery problems are logged, never returned.

use std::sync::Arc;
use std::time::Duration;

use csync_common::events::{EventBus, JobNotification};

use super::Notifier;

pub const WEBHOOK_SECRET_HEADER: &str = "x-webhook-secret";
pub const WEBHOOK_TIMEOUT: Duration = Duration::from_secs(10);

/// POSTs each notification as JSON to a configured URL
///
/// Without a URL every call is a silent no-op.
pub struct WebhookNotifier {
    client: reqwest::Client,
    url: Option<String>,
    secret: String,
}

impl WebhookNotifier {
    pub fn new(url: Option<String>, secret: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(WEBHOOK_TIMEOUT)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Falling back to default webhook client");
                reqwest::Client::new()
            });

        Self {
            client,
            url: url.filter(|u| !u.trim().is_empty()),
            secret: secret.into(),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.url.is_some()
    }
}

#[async_trait::async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(&self, notification: &JobNotification) {
        let Some(url) = &self.url else {
            return;
        };

        let result = self
            .client
            .post(url)
            .header(WEBHOOK_SECRET_HEADER, &self.secret)
            .json(notification)
            .send()
            .await;

        match result {
            Ok(response) if response.status().is_success() => {
                tracing::debug!(
                    song_id = %notification.song_id,
                    event = notification.event.as_str(),
                    "Webhook delivered"
                );
            }
            Ok(response) => {
                tracing::warn!(
                    song_id = %notification.song_id,
                    event = notification.event.as_str(),
                    status = %response.status(),
                    "Webhook rejected notification"
                );
            }
            Err(e) => {
                tracing::warn!(
                    song_id = %notification.song_id,
                    event = notification.event.as_str(),
                    error = %e,
                    "Webhook delivery failed"
                );
            }
        }
    }
}

/// Republishes notifications on the in-process [`EventBus`] (SSE clients)
pub struct EventBusNotifier {
    bus: EventBus,
}

impl EventBusNotifier {
    pub fn new(bus: EventBus) -> Self {
        Self { bus }
    }
}

#[async_trait::async_trait]
impl Notifier for EventBusNotifier {
    async fn notify(&self, notification: &JobNotification) {
        self.bus.emit_lossy(notification.clone());
    }
}

/// Delivers to several sinks in order
#[derive(Default)]
pub struct FanoutNotifier {
    sinks: Vec<Arc<dyn Notifier>>,
}

impl FanoutNotifier {
    pub fn new(sinks: Vec<Arc<dyn Notifier>>) -> Self {
        Self { sinks }
    }

    pub fn with(mut self, sink: Arc<dyn Notifier>) -> Self {
        self.sinks.push(sink);
        self
    }
}

#[async_trait::async_trait]
impl Notifier for FanoutNotifier {
    async fn notify(&self, notification: &JobNotification) {
        for sink in &self.sinks {
            sink.notify(notification).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::HeaderMap, routing::post, Json, Router};
    use csync_common::models::{JobKind, JobStatus};
    use std::sync::Mutex;
    use uuid::Uuid;

    type Received = Arc<Mutex<Vec<(Option<String>, serde_json::Value)>>>;

    async fn spawn_webhook(received: Received) -> String {
        let app = Router::new().route(
            "/hook",
            post(move |headers: HeaderMap, Json(body): Json<serde_json::Value>| async move {
                let secret = headers
                    .get(WEBHOOK_SECRET_HEADER)
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_string);
                received.lock().unwrap().push((secret, body));
            }),
        );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}/hook", addr)
    }

    #[tokio::test]
    async fn test_webhook_posts_payload_with_secret() {
        let received: Received = Arc::new(Mutex::new(Vec::new()));
        let url = spawn_webhook(received.clone()).await;
        let notifier = WebhookNotifier::new(Some(url), "s3cret");
        let song_id = Uuid::new_v4();

        notifier
            .notify(&JobNotification::failed(song_id, JobKind::Cut, "No sections selected for the cut"))
            .await;

        let received = received.lock().unwrap();
        assert_eq!(received.len(), 1);
        let (secret, body) = &received[0];
        assert_eq!(secret.as_deref(), Some("s3cret"));
        assert_eq!(body["song_id"], song_id.to_string());
        assert_eq!(body["event"], "cut_complete");
        assert_eq!(body["payload"]["status"], "failed");
        assert_eq!(body["payload"]["error"], "No sections selected for the cut");
    }

    #[tokio::test]
    async fn test_unconfigured_webhook_is_noop() {
        let notifier = WebhookNotifier::new(Some("  ".to_string()), "");
        assert!(!notifier.is_configured());
        notifier
            .notify(&JobNotification::ready(Uuid::new_v4(), JobKind::Analysis))
            .await;
    }

    #[tokio::test]
    async fn test_unreachable_webhook_does_not_fail() {
        let notifier = WebhookNotifier::new(Some("http://127.0.0.1:9/hook".to_string()), "");
        notifier
            .notify(&JobNotification::ready(Uuid::new_v4(), JobKind::Cut))
            .await;
    }

    #[tokio::test]
    async fn test_fanout_reaches_event_bus() {
        let bus = EventBus::new(8);
        let mut rx = bus.subscribe();
        let fanout = FanoutNotifier::default()
            .with(Arc::new(WebhookNotifier::new(None, "")))
            .with(Arc::new(EventBusNotifier::new(bus.clone())));

        let song_id = Uuid::new_v4();
        fanout.notify(&JobNotification::ready(song_id, JobKind::Analysis)).await;

        let received = rx.try_recv().unwrap();
        assert_eq!(received.song_id, song_id);
        assert_eq!(received.payload.status, JobStatus::Ready);
    }
}
