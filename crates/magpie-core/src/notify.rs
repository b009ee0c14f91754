//! Notification collaborator interface.
//!
//! Delivery (web push, etc.) belongs to the host application. The pipeline
//! only fires notifications and logs failures; a failed notification never
//! fails a run.

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub body: String,
    /// Relative URL the client should open when the notification is tapped.
    pub url: String,
}

#[derive(Debug, Error)]
#[error("notification delivery failed: {0}")]
pub struct NotifyError(pub String);

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, notification: Notification) -> Result<(), NotifyError>;
}

/// Notifier that writes a log line instead of delivering anything.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, notification: Notification) -> Result<(), NotifyError> {
        tracing::info!(
            title = %notification.title,
            body = %notification.body,
            url = %notification.url,
            "notification"
        );
        Ok(())
    }
}
