//! In-process "reports changed" notification.
//!
//! Notifications carry no payload: subscribers re-read whatever they show.

use tokio::sync::broadcast;

/// SSE event name clients listen for.
pub const REPORTS_UPDATED: &str = "reportsUpdated";

/// Broadcast handle shared by handlers and subscribers.
#[derive(Clone)]
pub struct ReportEvents {
    sender: broadcast::Sender<()>,
}

impl ReportEvents {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Tell every current subscriber that reports changed.
    pub fn notify(&self) {
        // No subscribers is not an error
        let receivers = self.sender.send(()).unwrap_or(0);
        tracing::debug!("Notified {} report subscribers", receivers);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.sender.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_subscriber_receives_notification() {
        let events = ReportEvents::new(8);
        let mut rx = events.subscribe();
        events.notify();
        assert!(rx.recv().await.is_ok());
    }

    #[tokio::test]
    async fn test_late_subscriber_sees_nothing_retroactive() {
        let events = ReportEvents::new(8);
        events.notify();
        let mut rx = events.subscribe();
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_notify_without_subscribers() {
        let events = ReportEvents::new(0);
        events.notify();
    }
}
