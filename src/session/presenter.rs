//! Outbound boundary between the session and the presentation layer.

use mockall::automock;
use serde::Serialize;
use thiserror::Error;

use crate::{
    alerts::{Alert, Severity, stats::AlertStatistics},
    preferences::UserPreferences,
    session::SessionState,
};

/// Everything the presentation layer needs after a state change.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    /// Alerts passing the active filter, in source order
    pub alerts: Vec<Alert>,
    /// Statistics over the full, unfiltered collection
    pub statistics: AlertStatistics,
    pub language: String,
    #[serde(skip)]
    pub state: SessionState,
}

/// Rendering capability the session drives.
///
/// Implementations must return quickly: the session calls them inline after
/// every change.
#[automock]
pub trait Presenter {
    fn render(&mut self, view: &SessionView);
    /// Applies theme, font size, language and sound settings.
    fn apply_settings(&mut self, preferences: &UserPreferences);
    /// Queues an audible cue for an alert of `severity`.
    fn play_alert_sound(&mut self, severity: Severity);
}

/// Failure of an optional host capability.
#[derive(Debug, Error)]
pub enum CapabilityError {
    #[error("capability failed: {0}")]
    Failed(String),
}

/// Host capability used to share an alert (share sheet, clipboard...).
#[automock]
pub trait ShareTarget {
    fn share(&mut self, text: &str) -> Result<(), CapabilityError>;
}
