//! Transit service alert records.
//!
//! This module provides the [`Alert`] struct produced by an alert source and the
//! small value types it is built from. Alerts are immutable once produced: the
//! session only ever replaces whole collections.

use std::{collections::BTreeSet, fmt};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Severity of a service alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Service is suspended or heavily disrupted.
    Critical,
    /// Delays or partial disruption.
    Warning,
    /// Planned work and informational items.
    Info,
}

impl Severity {
    /// Returns the lowercase tag used in feeds, filters and translation keys.
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Critical => "critical",
            Severity::Warning => "warning",
            Severity::Info => "info",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Region tag used for geographic filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Borough {
    Manhattan,
    Brooklyn,
    Queens,
    Bronx,
    StatenIsland,
}

impl Borough {
    /// Returns the kebab-case tag used in feeds and persisted filters.
    pub fn as_str(self) -> &'static str {
        match self {
            Borough::Manhattan => "manhattan",
            Borough::Brooklyn => "brooklyn",
            Borough::Queens => "queens",
            Borough::Bronx => "bronx",
            Borough::StatenIsland => "staten-island",
        }
    }

    /// Parses a region tag, returning `None` for unknown values.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "manhattan" => Some(Borough::Manhattan),
            "brooklyn" => Some(Borough::Brooklyn),
            "queens" => Some(Borough::Queens),
            "bronx" => Some(Borough::Bronx),
            "staten-island" => Some(Borough::StatenIsland),
            _ => None,
        }
    }
}

/// Unit attached to a walking distance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceUnit {
    Mi,
    Km,
}

/// Walking distance from the user to the affected stations.
///
/// Only used by the "near me" location facet, which compares the raw numeric
/// value against `1.0` whatever the unit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Distance {
    pub value: f64,
    pub unit: DistanceUnit,
}

impl fmt::Display for Distance {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let unit = match self.unit {
            DistanceUnit::Mi => "mi",
            DistanceUnit::Km => "km",
        };
        write!(f, "{:.1} {}", self.value, unit)
    }
}

/// A geographic position supplied by the host environment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

/// A single transit service alert.
///
/// # Examples
///
/// ```
/// let alert = Alert {
///     id: "a1".to_string(),
///     title: "Signal problems".to_string(),
///     description: "Expect delays".to_string(),
///     lines: ["4", "5", "6"].iter().map(|l| l.to_string()).collect(),
///     severity: Severity::Critical,
///     timestamp: Utc::now(),
///     affected_stations: vec!["Grand Central".to_string()],
///     estimated_resolution: None,
///     is_rush_hour: true,
///     location: Borough::Manhattan,
///     service_reliability: 62,
///     walking_distance: Distance { value: 0.4, unit: DistanceUnit::Mi },
/// };
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    /// Opaque unique identifier.
    pub id: String,
    pub title: String,
    pub description: String,
    /// Line identifiers affected by the alert.
    ///
    /// Empty for informational items that are not tied to a line.
    #[serde(default)]
    pub lines: BTreeSet<String>,
    pub severity: Severity,
    /// Creation instant.
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub affected_stations: Vec<String>,
    /// Expected end of the disruption, `None` when unknown or ongoing.
    #[serde(default)]
    pub estimated_resolution: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_rush_hour: bool,
    pub location: Borough,
    /// Percentage of normal service still running, expected in `0..=100`.
    pub service_reliability: u8,
    pub walking_distance: Distance,
}

impl Alert {
    /// Returns whether the alert is still in effect at `now`.
    ///
    /// An alert without an estimated resolution is always active.
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        match self.estimated_resolution {
            Some(resolution) => resolution > now,
            None => true,
        }
    }
}

impl fmt::Display for Alert {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "id={}, severity={}, lines={:?}, location={}, rush_hour={}",
            self.id,
            self.severity,
            self.lines,
            self.location.as_str(),
            self.is_rush_hour
        )
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::Duration;

    /// Builds an alert with neutral defaults, tweaked by the caller.
    pub(crate) fn create_test_alert(id: &str, severity: Severity, lines: &[&str]) -> Alert {
        Alert {
            id: id.to_string(),
            title: format!("Alert {}", id),
            description: "Test alert".to_string(),
            lines: lines.iter().map(|l| l.to_string()).collect(),
            severity,
            timestamp: Utc::now(),
            affected_stations: vec!["Union Sq".to_string()],
            estimated_resolution: None,
            is_rush_hour: false,
            location: Borough::Manhattan,
            service_reliability: 80,
            walking_distance: Distance {
                value: 2.5,
                unit: DistanceUnit::Mi,
            },
        }
    }

    #[test]
    fn test_alert_without_resolution_is_active() {
        let alert = create_test_alert("a1", Severity::Warning, &["A"]);
        assert!(alert.is_active_at(Utc::now()));
    }

    #[test]
    fn test_alert_resolved_in_the_past_is_inactive() {
        let mut alert = create_test_alert("a1", Severity::Warning, &["A"]);
        let now = Utc::now();
        alert.estimated_resolution = Some(now - Duration::minutes(5));
        assert!(!alert.is_active_at(now));

        alert.estimated_resolution = Some(now);
        assert!(!alert.is_active_at(now));

        alert.estimated_resolution = Some(now + Duration::minutes(5));
        assert!(alert.is_active_at(now));
    }

    #[test]
    fn test_deserialize_feed_alert() {
        let body = r#"{
            "id": "mta-1",
            "title": "Delays",
            "description": "Signal problems at 14 St",
            "lines": ["4", "5", "6"],
            "severity": "critical",
            "timestamp": "2026-10-17T08:15:00Z",
            "affectedStations": ["14 St-Union Sq"],
            "isRushHour": true,
            "location": "staten-island",
            "serviceReliability": 40,
            "walkingDistance": { "value": 0.6, "unit": "km" }
        }"#;

        let alert: Alert = serde_json::from_str(body).unwrap();
        assert_eq!(alert.id, "mta-1");
        assert_eq!(alert.severity, Severity::Critical);
        assert_eq!(alert.lines.len(), 3);
        assert_eq!(alert.location, Borough::StatenIsland);
        assert!(alert.estimated_resolution.is_none());
        assert_eq!(alert.walking_distance.unit, DistanceUnit::Km);
    }

    #[test]
    fn test_borough_parse() {
        assert_eq!(Borough::parse("queens"), Some(Borough::Queens));
        assert_eq!(Borough::parse("staten-island"), Some(Borough::StatenIsland));
        assert_eq!(Borough::parse("jersey"), None);
    }

    #[test]
    fn test_alert_display() {
        let alert = create_test_alert("a9", Severity::Info, &["L"]);
        let display = format!("{}", alert);
        assert!(display.contains("id=a9"));
        assert!(display.contains("severity=info"));
        assert!(display.contains("location=manhattan"));
    }
}
