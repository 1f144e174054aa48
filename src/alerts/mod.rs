//! Transit alert data, filtering and statistics.
//!
//! This module owns everything that only depends on the shape of an alert:
//!
//! - [`Alert`]: an immutable service alert as produced by a source
//! - [`AlertSource`]: the asynchronous supplier of alert collections, with a
//!   simulated implementation and an HTTP feed implementation
//! - [`filter`]: the pure multi-facet filter engine
//! - [`stats`]: the statistics aggregator
//!
//! # Data flow
//!
//! ```text
//! AlertSource::fetch → Vec<Alert> ─┬─→ filter::apply → visible alerts
//!                                  └─→ stats::summarize → AlertStatistics
//! ```
//!
//! Statistics are always derived from the full collection, never from the
//! filtered one.

mod alert;
mod feed;
pub mod filter;
pub mod lines;
mod source;
pub mod stats;

pub use crate::alerts::alert::{Alert, Borough, GeoPoint, Severity};
pub use crate::alerts::feed::HttpAlertSource;
#[cfg(test)]
pub use crate::alerts::source::MockAlertSource;
pub use crate::alerts::source::{AlertSource, ConfiguredSource, SimulatedAlertSource, SourceError};

#[cfg(test)]
pub(crate) use crate::alerts::alert::tests::create_test_alert;
