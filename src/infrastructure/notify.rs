use crate::domain::account::OwnerId;
use crate::domain::ports::{Notification, Notifier};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

/// Notifier that only logs. Stands in for the chat delivery layer, which is
/// external to the core; delivery is best-effort by contract, so logging is a
/// complete implementation of that contract.
#[derive(Default, Clone)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, recipient: OwnerId, event: Notification) {
        info!(recipient, ?event, "notification");
    }
}

/// Captures notifications for assertions in tests.
#[derive(Default, Clone)]
pub struct RecordingNotifier {
    events: Arc<Mutex<Vec<(OwnerId, Notification)>>>,
}

impl RecordingNotifier {
    pub async fn take(&self) -> Vec<(OwnerId, Notification)> {
        std::mem::take(&mut *self.events.lock().await)
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, recipient: OwnerId, event: Notification) {
        self.events.lock().await.push((recipient, event));
    }
}
