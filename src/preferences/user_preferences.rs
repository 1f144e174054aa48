//! User preferences persisted across sessions.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::alerts::filter::{FilterCriteria, LineFilter, LocationFilter, SeverityFilter, TimeFilter};

/// Colour theme of the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

/// Text size of the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontSize {
    Small,
    #[default]
    Medium,
    Large,
}

impl FontSize {
    /// Next size up, saturating at [`FontSize::Large`].
    pub fn larger(self) -> Self {
        match self {
            FontSize::Small => FontSize::Medium,
            FontSize::Medium | FontSize::Large => FontSize::Large,
        }
    }

    /// Next size down, saturating at [`FontSize::Small`].
    pub fn smaller(self) -> Self {
        match self {
            FontSize::Large => FontSize::Medium,
            FontSize::Medium | FontSize::Small => FontSize::Small,
        }
    }
}

/// Every user-tracked setting.
///
/// Missing fields deserialize to their defaults, so a partial record merges
/// onto [`UserPreferences::default`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UserPreferences {
    pub line_filter: LineFilter,
    pub severity_filter: SeverityFilter,
    pub time_filter: TimeFilter,
    pub location_filter: LocationFilter,
    pub sound_enabled: bool,
    pub rush_hour_mode: bool,
    pub theme: Theme,
    pub font_size: FontSize,
    /// Language code, may name a language without a translation table
    pub language: String,
    /// Ids of alerts marked as favorite
    pub favorites: BTreeSet<String>,
}

impl Default for UserPreferences {
    fn default() -> Self {
        UserPreferences {
            line_filter: LineFilter::All,
            severity_filter: SeverityFilter::All,
            time_filter: TimeFilter::All,
            location_filter: LocationFilter::All,
            sound_enabled: true,
            rush_hour_mode: false,
            theme: Theme::Light,
            font_size: FontSize::Medium,
            language: "en".to_string(),
            favorites: BTreeSet::new(),
        }
    }
}

impl UserPreferences {
    /// Defaults with a specific language.
    pub fn with_language(language: &str) -> Self {
        UserPreferences {
            language: language.to_string(),
            ..UserPreferences::default()
        }
    }

    /// Filter criteria described by the saved facets.
    pub fn criteria(&self) -> FilterCriteria {
        FilterCriteria {
            line: self.line_filter.clone(),
            severity: self.severity_filter,
            time: self.time_filter,
            location: self.location_filter,
            rush_hour_mode: self.rush_hour_mode,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alerts::{Borough, Severity};

    #[test]
    fn test_partial_record_keeps_defaults() {
        let preferences: UserPreferences =
            serde_json::from_str(r#"{"theme": "dark", "severityFilter": "critical"}"#).unwrap();

        assert_eq!(preferences.theme, Theme::Dark);
        assert_eq!(
            preferences.severity_filter,
            SeverityFilter::Only(Severity::Critical)
        );
        assert_eq!(preferences.language, "en");
        assert!(preferences.sound_enabled);
        assert_eq!(preferences.line_filter, LineFilter::All);
    }

    #[test]
    fn test_criteria_mirrors_facets() {
        let preferences = UserPreferences {
            line_filter: LineFilter::Group("NQRW".to_string()),
            location_filter: LocationFilter::Region(Borough::Queens),
            time_filter: TimeFilter::Rush,
            rush_hour_mode: true,
            ..UserPreferences::default()
        };

        let criteria = preferences.criteria();
        assert_eq!(criteria.line, LineFilter::Group("NQRW".to_string()));
        assert_eq!(criteria.location, LocationFilter::Region(Borough::Queens));
        assert_eq!(criteria.time, TimeFilter::Rush);
        assert_eq!(criteria.severity, SeverityFilter::All);
        assert!(criteria.rush_hour_mode);
    }

    #[test]
    fn test_font_size_saturates() {
        assert_eq!(FontSize::Large.larger(), FontSize::Large);
        assert_eq!(FontSize::Small.smaller(), FontSize::Small);
        assert_eq!(FontSize::Medium.larger(), FontSize::Large);
        assert_eq!(FontSize::Medium.smaller(), FontSize::Small);
    }

    #[test]
    fn test_theme_toggle() {
        assert_eq!(Theme::Light.toggled(), Theme::Dark);
        assert_eq!(Theme::Dark.toggled(), Theme::Light);
    }
}
