//! Composable multi-facet alert filtering.
//!
//! [`apply`] is a pure function: it keeps the alerts for which every facet of a
//! [`FilterCriteria`] holds, in input order. Facets are independent and ANDed;
//! each one defaults to "no restriction".

use std::fmt;

use chrono::{DateTime, Utc};
use log::debug;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::alerts::{Alert, Borough, GeoPoint, Severity, lines::line_group};

/// Raised when an alert does not have the shape the predicates rely on.
#[derive(Debug, Error, PartialEq)]
pub enum FilterError {
    #[error("malformed alert {id}: {reason}")]
    MalformedAlert { id: String, reason: String },
}

/// Line facet: everything, or a named line group.
///
/// An unknown group name matches nothing.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum LineFilter {
    #[default]
    All,
    Group(String),
}

impl From<String> for LineFilter {
    fn from(value: String) -> Self {
        if value == "all" {
            LineFilter::All
        } else {
            LineFilter::Group(value)
        }
    }
}

impl From<LineFilter> for String {
    fn from(filter: LineFilter) -> Self {
        match filter {
            LineFilter::All => "all".to_string(),
            LineFilter::Group(group) => group,
        }
    }
}

/// Severity facet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum SeverityFilter {
    #[default]
    All,
    Only(Severity),
}

impl TryFrom<String> for SeverityFilter {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "all" => Ok(SeverityFilter::All),
            "critical" => Ok(SeverityFilter::Only(Severity::Critical)),
            "warning" => Ok(SeverityFilter::Only(Severity::Warning)),
            "info" => Ok(SeverityFilter::Only(Severity::Info)),
            other => Err(format!("unknown severity filter {}", other)),
        }
    }
}

impl From<SeverityFilter> for String {
    fn from(filter: SeverityFilter) -> Self {
        match filter {
            SeverityFilter::All => "all".to_string(),
            SeverityFilter::Only(severity) => severity.as_str().to_string(),
        }
    }
}

/// Time-window facet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeFilter {
    #[default]
    All,
    /// No estimated resolution, or one strictly after now.
    Active,
    /// Flagged as a rush-hour disruption.
    Rush,
    /// Planned work, i.e. `info` severity.
    Planned,
}

/// Location facet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum LocationFilter {
    #[default]
    All,
    /// Alerts within walking distance of the user, needs a known location.
    NearMe,
    Region(Borough),
}

impl TryFrom<String> for LocationFilter {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "all" => Ok(LocationFilter::All),
            "near" => Ok(LocationFilter::NearMe),
            other => Borough::parse(other)
                .map(LocationFilter::Region)
                .ok_or_else(|| format!("unknown location filter {}", other)),
        }
    }
}

impl From<LocationFilter> for String {
    fn from(filter: LocationFilter) -> Self {
        match filter {
            LocationFilter::All => "all".to_string(),
            LocationFilter::NearMe => "near".to_string(),
            LocationFilter::Region(borough) => borough.as_str().to_string(),
        }
    }
}

/// The full set of facets applied to an alert collection.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FilterCriteria {
    pub line: LineFilter,
    pub severity: SeverityFilter,
    pub time: TimeFilter,
    pub location: LocationFilter,
    /// Global override, ANDed with the time facet.
    pub rush_hour_mode: bool,
}

impl fmt::Display for FilterCriteria {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "line={}, severity={}, time={:?}, location={}, rush_hour_mode={}",
            String::from(self.line.clone()),
            String::from(self.severity),
            self.time,
            String::from(self.location),
            self.rush_hour_mode
        )
    }
}

/// Environment the predicates are evaluated against.
///
/// `now` is read fresh for every filtering pass so "active" is never frozen at
/// alert creation time.
#[derive(Debug, Clone, Copy)]
pub struct FilterContext {
    pub now: DateTime<Utc>,
    pub user_location: Option<GeoPoint>,
}

impl FilterContext {
    pub fn now(user_location: Option<GeoPoint>) -> Self {
        FilterContext {
            now: Utc::now(),
            user_location,
        }
    }
}

/// Filters `alerts` with `criteria`, preserving input order.
///
/// # Errors
///
/// Returns [`FilterError::MalformedAlert`] as soon as one alert cannot be
/// evaluated. Callers are expected to fall back to the unfiltered collection.
///
/// # Examples
///
/// ```
/// let criteria = FilterCriteria {
///     severity: SeverityFilter::Only(Severity::Critical),
///     ..FilterCriteria::default()
/// };
/// let visible = apply(&alerts, &criteria, &FilterContext::now(None))?;
/// ```
pub fn apply(
    alerts: &[Alert],
    criteria: &FilterCriteria,
    context: &FilterContext,
) -> Result<Vec<Alert>, FilterError> {
    let mut filtered = Vec::with_capacity(alerts.len());
    for alert in alerts {
        if matches(alert, criteria, context)? {
            filtered.push(alert.clone());
        }
    }

    debug!(
        "filtered {} of {} alerts with {}",
        filtered.len(),
        alerts.len(),
        criteria
    );

    Ok(filtered)
}

fn matches(
    alert: &Alert,
    criteria: &FilterCriteria,
    context: &FilterContext,
) -> Result<bool, FilterError> {
    check_shape(alert)?;

    Ok(matches_line(alert, &criteria.line)
        && matches_severity(alert, criteria.severity)
        && matches_time(alert, criteria.time, context.now)
        && matches_location(alert, criteria.location, context.user_location)?
        && (!criteria.rush_hour_mode || alert.is_rush_hour))
}

fn check_shape(alert: &Alert) -> Result<(), FilterError> {
    if alert.id.is_empty() {
        return Err(malformed(alert, "empty id"));
    }
    if alert.service_reliability > 100 {
        return Err(malformed(
            alert,
            &format!("service reliability {} out of range", alert.service_reliability),
        ));
    }
    Ok(())
}

fn matches_line(alert: &Alert, filter: &LineFilter) -> bool {
    match filter {
        LineFilter::All => true,
        LineFilter::Group(name) => match line_group(name) {
            Some(group) => group.iter().any(|line| alert.lines.contains(*line)),
            None => false,
        },
    }
}

fn matches_severity(alert: &Alert, filter: SeverityFilter) -> bool {
    match filter {
        SeverityFilter::All => true,
        SeverityFilter::Only(severity) => alert.severity == severity,
    }
}

fn matches_time(alert: &Alert, filter: TimeFilter, now: DateTime<Utc>) -> bool {
    match filter {
        TimeFilter::All => true,
        TimeFilter::Active => alert.is_active_at(now),
        TimeFilter::Rush => alert.is_rush_hour,
        TimeFilter::Planned => alert.severity == Severity::Info,
    }
}

fn matches_location(
    alert: &Alert,
    filter: LocationFilter,
    user_location: Option<GeoPoint>,
) -> Result<bool, FilterError> {
    match filter {
        LocationFilter::All => Ok(true),
        LocationFilter::Region(borough) => Ok(alert.location == borough),
        // Without a known position the facet is disabled
        LocationFilter::NearMe if user_location.is_none() => Ok(true),
        LocationFilter::NearMe => {
            let distance = alert.walking_distance.value;
            if !distance.is_finite() || distance < 0.0 {
                return Err(malformed(
                    alert,
                    &format!("invalid walking distance {}", distance),
                ));
            }
            Ok(distance < 1.0)
        }
    }
}

fn malformed(alert: &Alert, reason: &str) -> FilterError {
    FilterError::MalformedAlert {
        id: alert.id.clone(),
        reason: reason.to_string(),
    }
}
