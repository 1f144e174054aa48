//! Alert sources feeding the session.
//!
//! The [`AlertSource`] trait abstracts where alerts come from so the session can
//! be driven by the built-in simulation, by HTTP feeds, or by a mock in tests.

use std::{path::PathBuf, time::Duration};

use chrono::{DateTime, Utc};
use log::{debug, error, info, warn};
use mockall::automock;
use serde::Deserialize;
use thiserror::Error;
use tokio::{fs, time};

use crate::alerts::{Alert, Borough, Severity, alert::Distance, feed::HttpAlertSource};

/// Built-in catalogue used by the simulated source when no fixture file is set.
const SAMPLE_ALERTS: &str = include_str!("../../data/sample_alerts.json");

/// Errors a source may report instead of a collection.
///
/// The session treats every variant as "no alerts" and keeps running.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("all {0} feeds failed")]
    AllFeedsFailed(usize),
}

/// Supplies the current alert collection.
#[automock]
pub trait AlertSource {
    /// Fetches the current alerts.
    ///
    /// Implementations settle with an empty collection when their data is
    /// exhausted or malformed and only report transport failures as errors.
    async fn fetch(&self) -> Result<Vec<Alert>, SourceError>;
}

/// Catalogue entry with times relative to the fetch instant.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SampleAlert {
    id: String,
    title: String,
    description: String,
    #[serde(default)]
    lines: Vec<String>,
    severity: Severity,
    minutes_ago: i64,
    #[serde(default)]
    affected_stations: Vec<String>,
    #[serde(default)]
    resolves_in_minutes: Option<i64>,
    #[serde(default)]
    is_rush_hour: bool,
    location: Borough,
    service_reliability: u8,
    walking_distance: Distance,
}

impl SampleAlert {
    fn into_alert(self, now: DateTime<Utc>) -> Alert {
        Alert {
            id: self.id,
            title: self.title,
            description: self.description,
            lines: self.lines.into_iter().collect(),
            severity: self.severity,
            timestamp: now - chrono::Duration::minutes(self.minutes_ago),
            affected_stations: self.affected_stations,
            estimated_resolution: self
                .resolves_in_minutes
                .map(|minutes| now + chrono::Duration::minutes(minutes)),
            is_rush_hour: self.is_rush_hour,
            location: self.location,
            service_reliability: self.service_reliability,
            walking_distance: self.walking_distance,
        }
    }
}

/// Local simulation of an alert feed with artificial latency.
///
/// # Examples
///
/// ```no_run
/// let source = SimulatedAlertSource::new(Duration::from_millis(500), None);
/// let alerts = source.fetch().await?;
/// ```
pub struct SimulatedAlertSource {
    /// Delay applied before every answer
    latency: Duration,
    /// Optional JSON catalogue replacing the built-in one
    fixtures: Option<PathBuf>,
}

impl SimulatedAlertSource {
    pub fn new(latency: Duration, fixtures: Option<PathBuf>) -> Self {
        SimulatedAlertSource { latency, fixtures }
    }

    async fn read_catalogue(&self) -> Option<String> {
        let Some(path) = &self.fixtures else {
            return Some(SAMPLE_ALERTS.to_string());
        };

        match fs::read_to_string(path).await {
            Ok(content) => Some(content),
            Err(e) => {
                error!("failed to read alert fixtures {}: {}", path.display(), e);
                None
            }
        }
    }
}

impl AlertSource for SimulatedAlertSource {
    async fn fetch(&self) -> Result<Vec<Alert>, SourceError> {
        debug!("simulating {} ms of latency", self.latency.as_millis());
        time::sleep(self.latency).await;

        let Some(catalogue) = self.read_catalogue().await else {
            return Ok(vec![]);
        };

        let samples: Vec<SampleAlert> = match serde_json::from_str(&catalogue) {
            Ok(samples) => samples,
            Err(e) => {
                error!("malformed alert catalogue, serving no alerts: {}", e);
                return Ok(vec![]);
            }
        };

        let now = Utc::now();
        let alerts: Vec<Alert> = samples.into_iter().map(|s| s.into_alert(now)).collect();
        info!("simulated source produced {} alerts", alerts.len());

        Ok(alerts)
    }
}

/// Source selected by configuration.
pub enum ConfiguredSource {
    Simulated(SimulatedAlertSource),
    Http(HttpAlertSource),
}

impl AlertSource for ConfiguredSource {
    async fn fetch(&self) -> Result<Vec<Alert>, SourceError> {
        match self {
            ConfiguredSource::Simulated(source) => source.fetch().await,
            ConfiguredSource::Http(source) => {
                let result = source.fetch().await;
                if let Err(e) = &result {
                    warn!("http alert source failed: {}", e);
                }
                result
            }
        }
    }
}
