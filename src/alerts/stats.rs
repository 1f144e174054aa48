//! Summary statistics over the full alert collection.

use std::collections::HashSet;

use serde::Serialize;

use crate::alerts::{Alert, Severity, lines::ALL_LINES};

/// Counts shown next to the alert list.
///
/// Always computed from the unfiltered collection so the user keeps an
/// overview of the whole network while viewing a narrowed list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertStatistics {
    pub critical_count: usize,
    pub warning_count: usize,
    pub info_count: usize,
    pub rush_hour_count: usize,
    /// Known lines not referenced by any critical alert.
    pub good_service_line_count: usize,
}

/// Summarizes `alerts`.
///
/// `good_service_line_count` is derived from the fixed [`ALL_LINES`] enumeration,
/// so a batch without critical alerts reports every line as healthy.
pub fn summarize(alerts: &[Alert]) -> AlertStatistics {
    let mut statistics = AlertStatistics::default();
    let mut disrupted_lines: HashSet<&str> = HashSet::new();

    for alert in alerts {
        match alert.severity {
            Severity::Critical => {
                statistics.critical_count += 1;
                disrupted_lines.extend(alert.lines.iter().map(String::as_str));
            }
            Severity::Warning => statistics.warning_count += 1,
            Severity::Info => statistics.info_count += 1,
        }
        if alert.is_rush_hour {
            statistics.rush_hour_count += 1;
        }
    }

    // Lines outside the network enumeration do not reduce the healthy count
    let disrupted_known = ALL_LINES
        .iter()
        .filter(|line| disrupted_lines.contains(*line))
        .count();
    statistics.good_service_line_count = ALL_LINES.len() - disrupted_known;

    statistics
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alerts::alert::tests::create_test_alert;

    #[test]
    fn test_empty_collection_reports_all_lines_healthy() {
        let statistics = summarize(&[]);
        assert_eq!(statistics.critical_count, 0);
        assert_eq!(statistics.warning_count, 0);
        assert_eq!(statistics.info_count, 0);
        assert_eq!(statistics.rush_hour_count, 0);
        assert_eq!(statistics.good_service_line_count, ALL_LINES.len());
    }

    #[test]
    fn test_no_critical_alert_keeps_full_line_count() {
        let alerts = vec![
            create_test_alert("a1", Severity::Warning, &["1", "2"]),
            create_test_alert("a2", Severity::Info, &["A"]),
        ];
        let statistics = summarize(&alerts);
        assert_eq!(statistics.warning_count, 1);
        assert_eq!(statistics.info_count, 1);
        assert_eq!(statistics.good_service_line_count, ALL_LINES.len());
    }

    #[test]
    fn test_critical_lines_are_counted_once() {
        let mut a1 = create_test_alert("a1", Severity::Critical, &["4", "5", "6"]);
        a1.is_rush_hour = true;
        let a2 = create_test_alert("a2", Severity::Critical, &["5", "6", "L"]);
        let a3 = create_test_alert("a3", Severity::Info, &["A"]);

        let statistics = summarize(&[a1, a2, a3]);
        assert_eq!(statistics.critical_count, 2);
        assert_eq!(statistics.info_count, 1);
        assert_eq!(statistics.rush_hour_count, 1);
        assert_eq!(statistics.good_service_line_count, ALL_LINES.len() - 4);
    }

    #[test]
    fn test_unknown_lines_do_not_underflow() {
        let alert = create_test_alert("a1", Severity::Critical, &["X1", "X2"]);
        let statistics = summarize(&[alert]);
        assert_eq!(statistics.good_service_line_count, ALL_LINES.len());
    }
}
