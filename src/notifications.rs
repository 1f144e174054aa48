//! Ephemeral user-facing notifications.
//!
//! A [`NotificationChannel`] hands out short-lived messages to the presentation
//! layer. Each call to [`NotificationChannel::show`] spawns its own lifecycle
//! task which emits three [`NotificationEvent`]s:
//!
//! ```text
//! show() ──200ms──▶ Entered ──2.9s──▶ Exiting ──300ms──▶ Removed
//! ```
//!
//! Calls never block, never coalesce identical messages and never wait on the
//! consumer. Events sent after the receiver is dropped are discarded.

use std::{
    fmt,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use chrono::{DateTime, Utc};
use log::{debug, warn};
use tokio::{runtime::Handle, sync::mpsc, time};

/// Delay before a notification becomes visible.
const ENTER_DELAY: Duration = Duration::from_millis(200);
/// Time a notification stays legible once visible.
const DWELL: Duration = Duration::from_millis(2900);
/// Duration of the exit transition before removal.
const EXIT_DURATION: Duration = Duration::from_millis(300);

/// Visual category of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Info,
    Success,
    Warning,
    Error,
    Critical,
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let tag = match self {
            NotificationKind::Info => "info",
            NotificationKind::Success => "success",
            NotificationKind::Warning => "warning",
            NotificationKind::Error => "error",
            NotificationKind::Critical => "critical",
        };
        f.write_str(tag)
    }
}

/// A message shown to the user.
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    /// Identifier unique within a channel
    pub id: u64,
    pub message: String,
    pub kind: NotificationKind,
    pub created_at: DateTime<Utc>,
}

/// Lifecycle phase reported for a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationPhase {
    Entered,
    Exiting,
    Removed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NotificationEvent {
    pub notification: Notification,
    pub phase: NotificationPhase,
}

/// Fire-and-forget producer of notification events.
///
/// Cloning the channel shares the event stream and the id counter.
///
/// # Examples
///
/// ```no_run
/// let (channel, mut events) = NotificationChannel::new();
/// channel.show("Preferences saved", NotificationKind::Success);
///
/// while let Some(event) = events.recv().await {
///     println!("{:?} {}", event.phase, event.notification.message);
/// }
/// ```
#[derive(Clone)]
pub struct NotificationChannel {
    sender: mpsc::UnboundedSender<NotificationEvent>,
    next_id: Arc<AtomicU64>,
}

impl NotificationChannel {
    /// Creates a channel and the receiver the presentation layer drains.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<NotificationEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let channel = NotificationChannel {
            sender,
            next_id: Arc::new(AtomicU64::new(1)),
        };
        (channel, receiver)
    }

    /// Shows `message` and returns immediately.
    ///
    /// The lifecycle runs on a spawned task. Outside of a Tokio runtime the
    /// notification is emitted as `Entered` only.
    pub fn show(&self, message: impl Into<String>, kind: NotificationKind) {
        let notification = Notification {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            message: message.into(),
            kind,
            created_at: Utc::now(),
        };
        debug!(
            "notification {} [{}] {}",
            notification.id, notification.kind, notification.message
        );

        let sender = self.sender.clone();
        let Ok(handle) = Handle::try_current() else {
            warn!("no runtime to animate notification {}", notification.id);
            emit(&sender, &notification, NotificationPhase::Entered);
            return;
        };

        handle.spawn(async move {
            time::sleep(ENTER_DELAY).await;
            emit(&sender, &notification, NotificationPhase::Entered);

            time::sleep(DWELL).await;
            emit(&sender, &notification, NotificationPhase::Exiting);

            time::sleep(EXIT_DURATION).await;
            emit(&sender, &notification, NotificationPhase::Removed);
        });
    }
}

fn emit(
    sender: &mpsc::UnboundedSender<NotificationEvent>,
    notification: &Notification,
    phase: NotificationPhase,
) {
    let event = NotificationEvent {
        notification: notification.clone(),
        phase,
    };
    if sender.send(event).is_err() {
        debug!("notification {} dropped, no receiver", notification.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_lifecycle_phases_and_timing() {
        let (channel, mut events) = NotificationChannel::new();
        let started = time::Instant::now();

        channel.show("Hello", NotificationKind::Info);

        let entered = events.recv().await.unwrap();
        assert_eq!(entered.phase, NotificationPhase::Entered);
        assert_eq!(entered.notification.message, "Hello");
        assert_eq!(entered.notification.kind, NotificationKind::Info);
        assert!(started.elapsed() >= ENTER_DELAY);

        let exiting = events.recv().await.unwrap();
        assert_eq!(exiting.phase, NotificationPhase::Exiting);
        assert!(started.elapsed() >= ENTER_DELAY + DWELL);

        let removed = events.recv().await.unwrap();
        assert_eq!(removed.phase, NotificationPhase::Removed);
        let total = started.elapsed();
        assert!(total >= Duration::from_millis(3400));
        assert!(total < Duration::from_millis(3500));
    }

    #[tokio::test(start_paused = true)]
    async fn test_identical_messages_are_not_coalesced() {
        let (channel, mut events) = NotificationChannel::new();

        channel.show("Same", NotificationKind::Warning);
        channel.show("Same", NotificationKind::Warning);

        let mut entered_ids = Vec::new();
        for _ in 0..6 {
            let event = events.recv().await.unwrap();
            if event.phase == NotificationPhase::Entered {
                entered_ids.push(event.notification.id);
            }
        }

        assert_eq!(entered_ids.len(), 2);
        assert_ne!(entered_ids[0], entered_ids[1]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_show_does_not_block_caller() {
        let (channel, _events) = NotificationChannel::new();
        let started = time::Instant::now();

        for i in 0..100 {
            channel.show(format!("burst {}", i), NotificationKind::Critical);
        }

        assert_eq!(started.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_receiver_is_tolerated() {
        let (channel, events) = NotificationChannel::new();
        drop(events);

        channel.show("Nobody listens", NotificationKind::Info);
        time::sleep(Duration::from_secs(4)).await;
    }

    #[test]
    fn test_show_outside_runtime_emits_entered() {
        let (channel, mut events) = NotificationChannel::new();

        channel.show("No runtime", NotificationKind::Error);

        let event = events.try_recv().unwrap();
        assert_eq!(event.phase, NotificationPhase::Entered);
        assert!(events.try_recv().is_err());
    }
}
