//! Terminal implementations of the session's presentation capabilities.

use std::io::{self, Write};

use log::{debug, info};

use crate::{
    alerts::{Alert, Severity},
    i18n::Translator,
    preferences::UserPreferences,
    session::{CapabilityError, Presenter, SessionView, ShareTarget},
};

/// Renders session views as log lines.
pub struct ConsolePresenter<W: Write> {
    translator: Translator,
    /// Receives the terminal bell
    out: W,
}

impl ConsolePresenter<io::Stdout> {
    pub fn stdout(translator: Translator) -> Self {
        ConsolePresenter {
            translator,
            out: io::stdout(),
        }
    }
}

impl<W: Write> ConsolePresenter<W> {
    fn describe(&self, alert: &Alert, language: &str) -> String {
        let severity = self
            .translator
            .resolve(&format!("severity.{}", alert.severity), language);
        let reliability = self.translator.format(
            "alert.reliability",
            language,
            &[&alert.service_reliability.to_string()],
        );
        let resolution = match alert.estimated_resolution {
            Some(at) => self.translator.format(
                "alert.resolution",
                language,
                &[&at.format("%H:%M").to_string()],
            ),
            None => self.translator.resolve("alert.ongoing", language),
        };
        let lines: Vec<&str> = alert.lines.iter().map(String::as_str).collect();

        format!(
            "[{}] {} {} [{}] {}, {}, {} ({})",
            alert.id,
            severity,
            alert.title,
            lines.join(" "),
            alert.location.as_str(),
            reliability,
            resolution,
            alert.walking_distance
        )
    }
}

impl<W: Write> Presenter for ConsolePresenter<W> {
    fn render(&mut self, view: &SessionView) {
        let language = view.language.as_str();
        let t = |key: &str| self.translator.resolve(key, language);
        let stats = view.statistics;

        info!(
            "{} ({}): {} {}, {} {}, {} {}, {} {}, {} {}",
            t("app.title"),
            view.state,
            t("stats.critical"),
            stats.critical_count,
            t("stats.warning"),
            stats.warning_count,
            t("stats.info"),
            stats.info_count,
            t("stats.rushHour"),
            stats.rush_hour_count,
            t("stats.goodService"),
            stats.good_service_line_count
        );

        if view.alerts.is_empty() {
            info!("{}", t("alert.empty"));
        }
        for alert in &view.alerts {
            info!("{}", self.describe(alert, language));
        }
    }

    fn apply_settings(&mut self, preferences: &UserPreferences) {
        info!(
            "settings: theme={:?}, font={:?}, language={}, sound={}, filters={}",
            preferences.theme,
            preferences.font_size,
            self.translator.language_name(&preferences.language),
            preferences.sound_enabled,
            preferences.criteria()
        );
    }

    fn play_alert_sound(&mut self, severity: Severity) {
        debug!("ringing bell for {} alert", severity);
        if let Err(e) = self.out.write_all(b"\x07").and_then(|_| self.out.flush()) {
            debug!("unable to ring bell: {}", e);
        }
    }
}

/// Shares alerts by printing them.
pub struct ConsoleShareTarget<W: Write> {
    out: W,
}

impl ConsoleShareTarget<io::Stdout> {
    pub fn stdout() -> Self {
        ConsoleShareTarget { out: io::stdout() }
    }
}

impl<W: Write> ShareTarget for ConsoleShareTarget<W> {
    fn share(&mut self, text: &str) -> Result<(), CapabilityError> {
        writeln!(self.out, "{}", text)
            .and_then(|_| self.out.flush())
            .map_err(|e| CapabilityError::Failed(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alerts::{create_test_alert, stats};
    use crate::session::SessionState;

    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_describe_alert_is_localized() {
        let presenter = ConsolePresenter {
            translator: Translator::builtin("en"),
            out: Vec::new(),
        };
        let alert = create_test_alert("c1", Severity::Critical, &["4", "5"]);

        let english = presenter.describe(&alert, "en");
        assert!(english.starts_with("[c1] Critical Alert c1 [4 5] manhattan"));
        assert!(english.contains("80% of normal service"));
        assert!(english.contains("No estimated resolution"));
        assert!(english.ends_with("(2.5 mi)"));

        let french = presenter.describe(&alert, "fr");
        assert!(french.contains("Critique"));
        assert!(french.contains("80% du service normal"));
    }

    #[test]
    fn test_render_and_sound_do_not_fail_on_broken_output() {
        let mut presenter = ConsolePresenter {
            translator: Translator::builtin("en"),
            out: BrokenPipe,
        };
        let alerts = vec![create_test_alert("c1", Severity::Critical, &["4"])];
        let view = SessionView {
            statistics: stats::summarize(&alerts),
            alerts,
            language: "en".to_string(),
            state: SessionState::Ready,
        };

        presenter.render(&view);
        presenter.apply_settings(&UserPreferences::default());
        presenter.play_alert_sound(Severity::Critical);
    }

    #[test]
    fn test_bell_is_written() {
        let mut presenter = ConsolePresenter {
            translator: Translator::builtin("en"),
            out: Vec::new(),
        };
        presenter.play_alert_sound(Severity::Critical);
        assert_eq!(presenter.out, b"\x07");
    }

    #[test]
    fn test_share_prints_text() {
        let mut target = ConsoleShareTarget { out: Vec::new() };
        target.share("Signal problems (Critical): delays").unwrap();
        assert_eq!(
            String::from_utf8(target.out).unwrap(),
            "Signal problems (Critical): delays\n"
        );
    }

    #[test]
    fn test_share_reports_write_failure() {
        let mut target = ConsoleShareTarget { out: BrokenPipe };
        assert!(matches!(
            target.share("text"),
            Err(CapabilityError::Failed(_))
        ));
    }
}
