//! HTTP client for JSON alert feeds.
//!
//! This module provides the [`HttpAlertSource`] struct, which requests one or
//! more feeds concurrently and merges their alerts in feed order.

use futures::future::join_all;
use log::{debug, error, info};
use reqwest::{Client, Error};

use crate::alerts::{Alert, AlertSource, source::SourceError};

/// Alert source backed by HTTP feeds returning a JSON array of alerts.
///
/// # Examples
///
/// ```no_run
/// let source = HttpAlertSource::new(vec!["https://alerts.example.com/subway.json".to_string()]);
/// let alerts = source.fetch().await?;
/// ```
pub struct HttpAlertSource {
    /// Feed urls, requested concurrently
    feeds: Vec<String>,
    /// HTTP client
    client: Client,
}

impl HttpAlertSource {
    pub fn new(feeds: Vec<String>) -> Self {
        HttpAlertSource {
            feeds,
            client: Client::new(),
        }
    }

    async fn request_feed(&self, url: &str) -> Result<Vec<Alert>, Error> {
        info!("request alert feed {}", url);

        let alerts: Vec<Alert> = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        debug!("response from {} -> {} alerts", url, alerts.len());

        Ok(alerts)
    }
}

impl AlertSource for HttpAlertSource {
    /// Requests every feed and concatenates the successful responses.
    ///
    /// Failing feeds are logged and skipped. An error is only returned when
    /// every configured feed failed.
    async fn fetch(&self) -> Result<Vec<Alert>, SourceError> {
        let responses = join_all(self.feeds.iter().map(|url| self.request_feed(url))).await;

        let mut alerts = Vec::new();
        let mut failures = 0;
        for (url, response) in self.feeds.iter().zip(responses) {
            match response {
                Ok(feed_alerts) => alerts.extend(feed_alerts),
                Err(e) => {
                    error!("error while requesting feed {}: {}", url, e);
                    failures += 1;
                }
            }
        }

        if failures > 0 && failures == self.feeds.len() {
            return Err(SourceError::AllFeedsFailed(failures));
        }

        Ok(alerts)
    }
}
