//! Session orchestration.
//!
//! The [`SessionController`] is the single owner of the alert collection and of
//! the working copy of the user preferences. It restores preferences, fetches
//! alerts, filters them, derives statistics and pushes a [`SessionView`] to a
//! [`Presenter`] after every change.
//!
//! # Lifecycle
//!
//! ```text
//! Uninitialized → LoadingPreferences → LoadingAlerts → Ready
//!                        │                   │
//!                        └───── failure ─────┴──→ DegradedReady
//! ```
//!
//! Both `Ready` and `DegradedReady` accept every mutation; the degraded state
//! only means the session started with impoverished data.

use std::fmt;

use thiserror::Error;

use crate::{
    alerts::{
        GeoPoint, SourceError,
        filter::{FilterError, LineFilter, LocationFilter, SeverityFilter, TimeFilter},
    },
    preferences::FontSize,
};

mod presenter;
mod session_controller;

#[cfg(test)]
pub use crate::session::presenter::{MockPresenter, MockShareTarget};
pub use crate::session::presenter::{CapabilityError, Presenter, SessionView, ShareTarget};
pub use crate::session::session_controller::SessionController;

/// Initialization state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    LoadingPreferences,
    LoadingAlerts,
    Ready,
    /// Usable, but initialization had to recover from a failure
    DegradedReady,
}

impl SessionState {
    /// Whether the session accepts user mutations.
    pub fn is_ready(self) -> bool {
        matches!(self, SessionState::Ready | SessionState::DegradedReady)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            SessionState::Uninitialized => "uninitialized",
            SessionState::LoadingPreferences => "loading-preferences",
            SessionState::LoadingAlerts => "loading-alerts",
            SessionState::Ready => "ready",
            SessionState::DegradedReady => "degraded-ready",
        };
        f.write_str(name)
    }
}

/// Failures caught at the initialization boundary.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("alert source failed: {0}")]
    Source(#[from] SourceError),
    #[error("filtering failed: {0}")]
    Filter(#[from] FilterError),
}

/// User-driven events processed by [`SessionController::run`].
#[derive(Debug, Clone, PartialEq)]
pub enum SessionCommand {
    SetLineFilter(LineFilter),
    SetSeverityFilter(SeverityFilter),
    SetTimeFilter(TimeFilter),
    SetLocationFilter(LocationFilter),
    ToggleRushHourMode,
    ToggleSound,
    ToggleTheme,
    SetFontSize(FontSize),
    IncreaseFontSize,
    DecreaseFontSize,
    SetLanguage(String),
    SetUserLocation(Option<GeoPoint>),
    ToggleFavorite(String),
    ShareAlert(String),
    ClearPreferences,
    Refresh,
    Shutdown,
}
