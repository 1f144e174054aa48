//! Configuration file structures for transit-watch.
//!
//! The configuration is a YAML file merged with `TRANSIT_` prefixed environment
//! variables, `__` separating a section from its key. Every field has a default,
//! so an empty or missing file yields a usable configuration.
//!
//! # Configuration File Format
//!
//! ```yaml
//! source:
//!   # simulated or http
//!   kind: simulated
//!   # Artificial latency of the simulated source, in milliseconds
//!   latency_ms: 500
//!   # Optional alert catalogue replacing the built-in sample
//!   fixtures: ./data/sample_alerts.json
//!   # Feeds fetched concurrently by the http source
//!   feeds:
//!     - https://alerts.example.com/subway.json
//!
//! session:
//!   # Automatic refresh period, in seconds
//!   refresh_interval: 120
//!   default_language: en
//!   # Optional directory of <code>.json translation tables
//!   locales: ./locales
//!
//! storage:
//!   # Maximum size of a stored value, in bytes
//!   quota_bytes: 5242880
//! ```
//!
//! # Environment Variable Overrides
//!
//! ```bash
//! export TRANSIT_SOURCE__KIND=http
//! export TRANSIT_SESSION__REFRESH_INTERVAL=60
//! ```

use std::path::{Path, PathBuf};

use anyhow::Context;
use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use serde::Deserialize;

#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub source: SourceConfig,
    pub session: SessionConfig,
    pub storage: StorageConfig,
}

impl Config {
    /// Loads `path` and applies environment overrides.
    ///
    /// A missing file is not an error, the defaults and environment are used.
    ///
    /// # Errors
    ///
    /// Returns an error when the file or an override has the wrong shape.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();

        Figment::new()
            .merge(Yaml::file(path))
            .merge(Env::prefixed("TRANSIT_").split("__"))
            .extract()
            .with_context(|| format!("invalid configuration {}", path.display()))
    }
}

/// Which alert source backs the session.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    #[default]
    Simulated,
    Http,
}

#[derive(Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct SourceConfig {
    pub kind: SourceKind,
    pub latency_ms: u64,
    pub fixtures: Option<PathBuf>,
    pub feeds: Vec<String>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        SourceConfig {
            kind: SourceKind::Simulated,
            latency_ms: 500,
            fixtures: None,
            feeds: Vec::new(),
        }
    }
}

#[derive(Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct SessionConfig {
    /// Seconds between automatic refreshes
    pub refresh_interval: u64,
    pub default_language: String,
    pub locales: Option<PathBuf>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            refresh_interval: 120,
            default_language: "en".to_string(),
            locales: None,
        }
    }
}

#[derive(Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct StorageConfig {
    pub quota_bytes: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig {
            quota_bytes: 5 * 1024 * 1024,
        }
    }
}
