//! Outbound user notifications.
//!
//! The scheduling core reports progress through a cloneable [`Notifier`]
//! handle; delivery is fire-and-forget and failures never propagate back into
//! the jobs. The Telegram front-end drains the paired receiver.

use tokio::sync::mpsc;
use tracing::warn;

/// A single human-readable status message for one user.
#[derive(Debug, Clone)]
pub struct Notification {
    pub user_id: i64,
    pub text: String,
}

/// Fire-and-forget sender for user notifications.
#[derive(Clone)]
pub struct Notifier {
    tx: mpsc::UnboundedSender<Notification>,
}

impl Notifier {
    /// Create a notifier and the receiver its messages arrive on.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Notification>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Queue a message for delivery. Never fails; a closed receiver only logs.
    pub fn notify(&self, user_id: i64, text: impl Into<String>) {
        let text = text.into();
        if self.tx.send(Notification { user_id, text }).is_err() {
            warn!(user_id, "notification dropped, delivery channel closed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn notify_delivers_in_order() {
        let (notifier, mut rx) = Notifier::channel();
        notifier.notify(7, "first");
        notifier.notify(7, "second");

        assert_eq!(rx.recv().await.unwrap().text, "first");
        let second = rx.recv().await.unwrap();
        assert_eq!(second.user_id, 7);
        assert_eq!(second.text, "second");
    }

    #[tokio::test]
    async fn closed_receiver_does_not_panic() {
        let (notifier, rx) = Notifier::channel();
        drop(rx);
        notifier.notify(7, "into the void");
    }
}
