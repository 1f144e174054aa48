//! Session controller owning alerts and preferences.

use std::{sync::Arc, time::Duration};

use chrono::Utc;
use futures::{FutureExt, StreamExt, future::LocalBoxFuture, stream::FuturesUnordered};
use log::{debug, info, warn};
use tokio::{
    sync::mpsc,
    time::{self, Instant, MissedTickBehavior},
};

use crate::{
    alerts::{
        Alert, AlertSource, GeoPoint, Severity, SourceError,
        filter::{self, FilterContext, FilterError, LineFilter, LocationFilter, SeverityFilter, TimeFilter},
        stats::{self, AlertStatistics},
    },
    i18n::Translator,
    notifications::{NotificationChannel, NotificationKind},
    preferences::{FontSize, LoadOutcome, PreferenceStore, StorageBackend, UserPreferences},
    session::{Presenter, SessionCommand, SessionError, SessionState, SessionView, ShareTarget},
};

/// Saves younger than this are announced when restored.
const RECENT_SAVE_MINUTES: i64 = 60;

type FetchResult = (u64, RefreshTrigger, Result<Vec<Alert>, SourceError>);

/// What started a refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshTrigger {
    Manual,
    Periodic,
}

/// Single owner of the session state.
///
/// Every mutation replaces the preference record or alert collection with a new
/// value, re-runs filtering and statistics, writes the preferences through to
/// the store and renders.
///
/// # Examples
///
/// ```no_run
/// let (notifier, notifications) = NotificationChannel::new();
/// let mut controller = SessionController::new(
///     SimulatedAlertSource::new(Duration::from_millis(500), None),
///     PreferenceStore::new(MemoryStorage::default()),
///     presenter,
///     Translator::builtin("en"),
///     notifier,
///     Duration::from_secs(120),
/// );
///
/// controller.initialize().await;
/// controller.set_severity_filter(SeverityFilter::Only(Severity::Critical));
/// ```
pub struct SessionController<S: AlertSource, B: StorageBackend, P: Presenter> {
    /// Alert supplier, shared with in-flight fetches
    source: Arc<S>,
    store: PreferenceStore<B>,
    presenter: P,
    translator: Translator,
    notifier: NotificationChannel,
    /// Period of the automatic refresh in [`Self::run`]
    refresh_interval: Duration,
    state: SessionState,
    /// Working copy of the persisted preferences
    preferences: UserPreferences,
    /// Full collection from the last applied fetch
    alerts: Vec<Alert>,
    /// Alerts passing the current filter
    visible: Vec<Alert>,
    statistics: AlertStatistics,
    user_location: Option<GeoPoint>,
    /// Id of the most recently requested fetch
    latest_request: u64,
}

impl<S: AlertSource, B: StorageBackend, P: Presenter> SessionController<S, B, P> {
    pub fn new(
        source: S,
        store: PreferenceStore<B>,
        presenter: P,
        translator: Translator,
        notifier: NotificationChannel,
        refresh_interval: Duration,
    ) -> Self {
        let preferences = UserPreferences::with_language(translator.default_language());

        SessionController {
            source: Arc::new(source),
            store,
            presenter,
            translator,
            notifier,
            refresh_interval,
            state: SessionState::Uninitialized,
            preferences,
            alerts: Vec::new(),
            visible: Vec::new(),
            statistics: stats::summarize(&[]),
            user_location: None,
            latest_request: 0,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn preferences(&self) -> &UserPreferences {
        &self.preferences
    }

    pub fn visible_alerts(&self) -> &[Alert] {
        &self.visible
    }

    pub fn statistics(&self) -> AlertStatistics {
        self.statistics
    }

    /// Snapshot handed to the presenter.
    pub fn view(&self) -> SessionView {
        SessionView {
            alerts: self.visible.clone(),
            statistics: self.statistics,
            language: self.preferences.language.clone(),
            state: self.state,
        }
    }

    /// Restores preferences, loads alerts and renders the first view.
    ///
    /// Always ends in [`SessionState::Ready`] or [`SessionState::DegradedReady`].
    pub async fn initialize(&mut self) -> SessionState {
        info!("initializing session");

        self.state = match self.try_initialize().await {
            Ok(()) => SessionState::Ready,
            Err(e) => {
                warn!("session initialization failed, starting degraded: {}", e);
                if let SessionError::Source(_) = e {
                    self.alerts = Vec::new();
                    self.notify("notifications.sourceFailed", &[], NotificationKind::Info);
                }
                self.visible = self.alerts.clone();
                self.statistics = stats::summarize(&self.alerts);
                self.notify("notifications.degraded", &[], NotificationKind::Warning);
                SessionState::DegradedReady
            }
        };

        info!("session {} with {} alerts", self.state, self.alerts.len());
        self.render();
        self.state
    }

    async fn try_initialize(&mut self) -> Result<(), SessionError> {
        self.state = SessionState::LoadingPreferences;
        self.restore_preferences();

        self.state = SessionState::LoadingAlerts;
        self.alerts = self.source.fetch().await?;
        self.recompute()?;
        self.announce_critical_alerts();

        Ok(())
    }

    fn restore_preferences(&mut self) {
        let outcome = self.store.load();
        if let LoadOutcome::Failed(e) = &outcome {
            debug!("saved preferences unusable, keeping defaults: {}", e);
        }

        if let Some(saved) = outcome.into_saved() {
            self.preferences = saved.preferences;

            // Legacy records may not carry a save instant
            let minutes = saved.last_updated.map(|at| (Utc::now() - at).num_minutes());
            if let Some(minutes) = minutes.filter(|m| (0..RECENT_SAVE_MINUTES).contains(m)) {
                self.notify(
                    "notifications.preferencesRestored",
                    &[&minutes.to_string()],
                    NotificationKind::Info,
                );
            }
        }

        self.notify_if_location_missing();
        self.presenter.apply_settings(&self.preferences);
    }

    /// Re-runs statistics and filtering over the current collection.
    ///
    /// On a filtering failure the unfiltered collection becomes visible and the
    /// error is returned for the caller to classify. See [`Self::refilter`].
    fn recompute(&mut self) -> Result<(), FilterError> {
        self.statistics = stats::summarize(&self.alerts);

        let context = FilterContext::now(self.user_location);
        match filter::apply(&self.alerts, &self.preferences.criteria(), &context) {
            Ok(visible) => {
                self.visible = visible;
                Ok(())
            }
            Err(e) => {
                self.visible = self.alerts.clone();
                Err(e)
            }
        }
    }

    /// [`Self::recompute`] for paths where a filtering failure only degrades
    /// the view.
    fn refilter(&mut self) {
        if let Err(e) = self.recompute() {
            warn!("filtering failed, showing all alerts: {}", e);
        }
    }

    fn render(&mut self) {
        let view = self.view();
        self.presenter.render(&view);
    }

    fn notify(&self, key: &str, args: &[&str], kind: NotificationKind) {
        let message = self
            .translator
            .format(key, &self.preferences.language, args);
        self.notifier.show(message, kind);
    }

    fn notify_if_location_missing(&self) {
        if self.preferences.location_filter == LocationFilter::NearMe && self.user_location.is_none()
        {
            self.notify(
                "notifications.locationUnavailable",
                &[],
                NotificationKind::Warning,
            );
        }
    }

    /// One notification, and one sound when enabled, per critical alert.
    fn announce_critical_alerts(&mut self) {
        let critical: Vec<String> = self
            .alerts
            .iter()
            .filter(|a| a.severity == Severity::Critical)
            .map(|a| a.title.clone())
            .collect();

        for title in critical {
            self.notify(
                "notifications.criticalAlert",
                &[&title],
                NotificationKind::Critical,
            );
            if self.preferences.sound_enabled {
                self.presenter.play_alert_sound(Severity::Critical);
            }
        }
    }

    fn persist(&self) {
        if let Err(e) = self.store.save(&self.preferences) {
            debug!("preferences kept in memory only: {}", e);
        }
    }

    /// Replaces the preferences with an updated copy and refreshes the view.
    fn update_preferences(&mut self, change: &str, update: impl FnOnce(&mut UserPreferences)) {
        if !self.state.is_ready() {
            warn!("ignoring {} while session is {}", change, self.state);
            return;
        }

        let mut preferences = self.preferences.clone();
        update(&mut preferences);
        self.preferences = preferences;
        debug!("applied {}", change);

        self.persist();
        self.presenter.apply_settings(&self.preferences);
        self.refilter();
        self.render();
    }

    pub fn set_line_filter(&mut self, line: LineFilter) {
        self.update_preferences("line filter", |p| p.line_filter = line);
    }

    pub fn set_severity_filter(&mut self, severity: SeverityFilter) {
        self.update_preferences("severity filter", |p| p.severity_filter = severity);
    }

    pub fn set_time_filter(&mut self, time: TimeFilter) {
        self.update_preferences("time filter", |p| p.time_filter = time);
    }

    pub fn set_location_filter(&mut self, location: LocationFilter) {
        self.update_preferences("location filter", |p| p.location_filter = location);
        if self.state.is_ready() {
            self.notify_if_location_missing();
        }
    }

    pub fn toggle_rush_hour_mode(&mut self) {
        self.update_preferences("rush hour mode", |p| p.rush_hour_mode = !p.rush_hour_mode);
    }

    pub fn toggle_sound(&mut self) {
        self.update_preferences("sound", |p| p.sound_enabled = !p.sound_enabled);
    }

    pub fn toggle_theme(&mut self) {
        self.update_preferences("theme", |p| p.theme = p.theme.toggled());
    }

    pub fn set_font_size(&mut self, font_size: FontSize) {
        self.update_preferences("font size", |p| p.font_size = font_size);
    }

    pub fn increase_font_size(&mut self) {
        self.update_preferences("font size", |p| p.font_size = p.font_size.larger());
    }

    pub fn decrease_font_size(&mut self) {
        self.update_preferences("font size", |p| p.font_size = p.font_size.smaller());
    }

    /// Switches language. Unknown codes are kept and fall back to the default
    /// language's text.
    pub fn set_language(&mut self, language: &str) {
        self.update_preferences("language", |p| p.language = language.to_string());
        if self.state.is_ready() {
            let name = self.translator.language_name(language);
            self.notify(
                "notifications.languageChanged",
                &[&name],
                NotificationKind::Success,
            );
        }
    }

    pub fn toggle_favorite(&mut self, alert_id: &str) {
        self.update_preferences("favorite", |p| {
            if !p.favorites.remove(alert_id) {
                p.favorites.insert(alert_id.to_string());
            }
        });
    }

    /// Updates the user position supplied by the host, `None` when unavailable.
    ///
    /// The position is not persisted.
    pub fn set_user_location(&mut self, location: Option<GeoPoint>) {
        self.user_location = location;
        if !self.state.is_ready() {
            return;
        }

        self.notify_if_location_missing();
        self.refilter();
        self.render();
    }

    /// Resets preferences to defaults and removes the saved record.
    pub fn clear_preferences(&mut self) {
        if !self.state.is_ready() {
            warn!("ignoring preference reset while session is {}", self.state);
            return;
        }

        self.preferences = UserPreferences::with_language(self.translator.default_language());
        if let Err(e) = self.store.clear() {
            debug!("saved preferences not cleared: {}", e);
        }
        info!("preferences reset to defaults");

        self.presenter.apply_settings(&self.preferences);
        self.refilter();
        self.notify(
            "notifications.preferencesCleared",
            &[],
            NotificationKind::Info,
        );
        self.render();
    }

    /// Shares the alert `alert_id` through `target`.
    ///
    /// An unknown id or a failing target only raises an error notification.
    pub fn share_alert(&mut self, alert_id: &str, target: &mut impl ShareTarget) {
        let Some(alert) = self.alerts.iter().find(|a| a.id == alert_id) else {
            warn!("cannot share unknown alert {}", alert_id);
            self.notify(
                "notifications.unknownAlert",
                &[alert_id],
                NotificationKind::Error,
            );
            return;
        };

        let language = &self.preferences.language;
        let severity = self
            .translator
            .resolve(&format!("severity.{}", alert.severity), language);
        let text = self.translator.format(
            "share.text",
            language,
            &[&alert.title, &severity, &alert.description],
        );

        match target.share(&text) {
            Ok(()) => self.notify("notifications.shared", &[], NotificationKind::Success),
            Err(e) => {
                warn!("failed to share alert {}: {}", alert_id, e);
                self.notify("notifications.shareFailed", &[], NotificationKind::Error);
            }
        }
    }

    /// Registers a new fetch and returns its request id.
    ///
    /// Only the completion carrying the latest id is applied.
    pub fn begin_refresh(&mut self) -> u64 {
        self.latest_request += 1;
        debug!("starting refresh {}", self.latest_request);
        self.latest_request
    }

    /// Applies a fetch result if it belongs to the latest request.
    ///
    /// Returns whether the result was applied. A failed fetch empties the
    /// collection and raises an informational notification.
    pub fn complete_refresh(
        &mut self,
        request: u64,
        trigger: RefreshTrigger,
        result: Result<Vec<Alert>, SourceError>,
    ) -> bool {
        if request != self.latest_request {
            debug!(
                "dropping stale refresh {}, latest is {}",
                request, self.latest_request
            );
            return false;
        }

        match result {
            Ok(alerts) => {
                info!("{:?} refresh loaded {} alerts", trigger, alerts.len());
                self.alerts = alerts;
                if trigger == RefreshTrigger::Manual {
                    let count = self.alerts.len().to_string();
                    self.notify(
                        "notifications.refreshed",
                        &[&count],
                        NotificationKind::Success,
                    );
                }
            }
            Err(e) => {
                warn!("{:?} refresh failed, showing no alerts: {}", trigger, e);
                self.alerts = Vec::new();
                self.notify("notifications.sourceFailed", &[], NotificationKind::Info);
            }
        }

        self.refilter();
        self.announce_critical_alerts();
        self.render();
        true
    }

    fn handle_command(&mut self, command: SessionCommand, share_target: &mut impl ShareTarget) {
        debug!("handling {:?}", command);

        match command {
            SessionCommand::SetLineFilter(line) => self.set_line_filter(line),
            SessionCommand::SetSeverityFilter(severity) => self.set_severity_filter(severity),
            SessionCommand::SetTimeFilter(time) => self.set_time_filter(time),
            SessionCommand::SetLocationFilter(location) => self.set_location_filter(location),
            SessionCommand::ToggleRushHourMode => self.toggle_rush_hour_mode(),
            SessionCommand::ToggleSound => self.toggle_sound(),
            SessionCommand::ToggleTheme => self.toggle_theme(),
            SessionCommand::SetFontSize(font_size) => self.set_font_size(font_size),
            SessionCommand::IncreaseFontSize => self.increase_font_size(),
            SessionCommand::DecreaseFontSize => self.decrease_font_size(),
            SessionCommand::SetLanguage(language) => self.set_language(&language),
            SessionCommand::SetUserLocation(location) => self.set_user_location(location),
            SessionCommand::ToggleFavorite(alert_id) => self.toggle_favorite(&alert_id),
            SessionCommand::ShareAlert(alert_id) => self.share_alert(&alert_id, share_target),
            SessionCommand::ClearPreferences => self.clear_preferences(),
            // Fetching commands are driven by the event loop
            SessionCommand::Refresh | SessionCommand::Shutdown => {}
        }
    }
}

impl<S, B, P> SessionController<S, B, P>
where
    S: AlertSource + 'static,
    B: StorageBackend,
    P: Presenter,
{
    fn start_fetch(&mut self, trigger: RefreshTrigger) -> LocalBoxFuture<'static, FetchResult> {
        let request = self.begin_refresh();
        let source = Arc::clone(&self.source);

        async move { (request, trigger, source.fetch().await) }.boxed_local()
    }

    /// Processes commands and periodic refreshes until shutdown.
    ///
    /// Everything runs on the calling task: handlers complete before the next
    /// event is taken, while fetches stay in flight without blocking commands.
    /// Overlapping fetches are resolved by request id, the latest request wins.
    pub async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<SessionCommand>,
        mut share_target: impl ShareTarget,
    ) {
        info!(
            "refreshing alerts every {} seconds",
            self.refresh_interval.as_secs()
        );
        let mut interval = time::interval_at(
            Instant::now() + self.refresh_interval,
            self.refresh_interval,
        );
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut in_flight: FuturesUnordered<LocalBoxFuture<'static, FetchResult>> =
            FuturesUnordered::new();

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    in_flight.push(self.start_fetch(RefreshTrigger::Periodic));
                }
                Some((request, trigger, result)) = in_flight.next(), if !in_flight.is_empty() => {
                    self.complete_refresh(request, trigger, result);
                }
                command = commands.recv() => match command {
                    Some(SessionCommand::Refresh) => {
                        in_flight.push(self.start_fetch(RefreshTrigger::Manual));
                    }
                    Some(SessionCommand::Shutdown) | None => break,
                    Some(command) => self.handle_command(command, &mut share_target),
                }
            }
        }

        info!("session stopped");
    }
}
