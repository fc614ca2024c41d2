//! Port to the mail/push service.

use coop_types::{Notification, Result};

/// One-way notification sink.
pub trait Notifier: Send + Sync {
    fn send(&self, notification: &Notification) -> Result<()>;
}

/// Send and swallow: a failed notification is logged and never reaches the
/// caller of the workflow that produced it.
pub fn notify_best_effort(notifier: &dyn Notifier, notification: &Notification) {
    match notifier.send(notification) {
        Ok(()) => tracing::debug!(event = notification.event(), "Notification sent"),
        Err(err) => tracing::warn!(
            event = notification.event(),
            error = %err,
            "Notification failed"
        ),
    }
}
