/// Webhook notification service
///
/// Fire-and-forget delivery of site events (visits, uploads, upload
/// failures) to a Discord-compatible webhook. Messages go through an
/// unbounded channel drained by one background worker, so a slow webhook
/// never blocks a request handler or the compressor. Delivery failures
/// are logged and swallowed; there are no retries.
use crate::config::NotifierConfig;
use serde_json::json;
use tokio::sync::mpsc;
use tracing::{debug, error, warn};

/// Handle for enqueueing notifications
#[derive(Clone)]
pub struct Notifier {
    tx: mpsc::UnboundedSender<String>,
}

impl Notifier {
    /// Create a notifier and spawn its delivery worker
    pub fn new(config: NotifierConfig) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(delivery_worker(rx, config));
        Self { tx }
    }

    /// Create a notifier whose messages land in the returned receiver
    /// instead of going out over HTTP. Used by tests to observe exactly
    /// which notifications a code path emits.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Enqueue a notification. Never blocks and never fails the caller.
    pub fn notify(&self, message: impl Into<String>) {
        if self.tx.send(message.into()).is_err() {
            warn!("notification worker gone, dropping message");
        }
    }
}

/// Drain the queue, posting each message to the configured webhook
async fn delivery_worker(mut rx: mpsc::UnboundedReceiver<String>, config: NotifierConfig) {
    let client = reqwest::Client::new();

    while let Some(message) = rx.recv().await {
        let Some(url) = config.webhook_url.as_deref() else {
            debug!("webhook URL not configured, skipping notification");
            continue;
        };

        let payload = json!({
            "content": message,
            "username": config.username,
        });

        match client.post(url).json(&payload).send().await {
            Ok(resp) if resp.status().is_success() => {}
            Ok(resp) => error!("webhook rejected notification: HTTP {}", resp.status()),
            Err(e) => error!("failed to deliver notification: {}", e),
        }
    }
}
