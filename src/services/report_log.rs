// Validated Report Log
// In-memory view over a ReportHistory store with notices and change events

use std::sync::mpsc::{channel, Receiver, Sender};

use chrono::DateTime;
use indexmap::IndexMap;
use tracing::{info, warn};

use super::error::StoreError;
use super::history::ReportHistory;
use crate::models::{LogEvent, Notice, ValidatedReport};

pub struct ReportLog<S: ReportHistory> {
    store: S,
    reports: Vec<ValidatedReport>,
    subscribers: Vec<Sender<LogEvent>>,
}

impl<S: ReportHistory> ReportLog<S> {
    /// Empty until [`ReportLog::refresh`] runs.
    pub fn new(store: S) -> Self {
        Self {
            store,
            reports: Vec::new(),
            subscribers: Vec::new(),
        }
    }

    pub fn reports(&self) -> &[ValidatedReport] {
        &self.reports
    }

    /// Receives an event after every successful save or delete.
    pub fn subscribe(&mut self) -> Receiver<LogEvent> {
        let (tx, rx) = channel();
        self.subscribers.push(tx);
        rx
    }

    fn notify(&mut self, event: LogEvent) {
        self.subscribers.retain(|tx| tx.send(event).is_ok());
    }

    pub fn refresh(&mut self) -> Notice {
        match self.store.load_all() {
            Ok(reports) => {
                self.reports = reports;
                info!(total = self.reports.len(), "log.refreshed");
                Notice::success("Reports Loaded", format!("{} reports loaded.", self.reports.len()))
            }
            Err(e) => {
                warn!(error = %e, "log.refresh_failed");
                Notice::failure("Error Loading Reports", "Could not load reports from the report store.")
            }
        }
    }

    pub fn save(&mut self, report: ValidatedReport) -> Notice {
        if let Err(e) = self.store.save(&report) {
            warn!(error = %e, timestamp = report.timestamp, "log.save_failed");
            return Notice::failure("Save Failed", "Could not save report to the report store.");
        }

        let timestamp = report.timestamp;
        self.reports.retain(|r| r.timestamp != timestamp);
        self.reports.insert(0, report);
        self.notify(LogEvent::Saved(timestamp));
        Notice::success("Report Saved", "Report saved to the report store.")
    }

    pub fn delete(&mut self, timestamp: i64) -> Notice {
        let outcome = match self.store.delete(timestamp) {
            Ok(true) => Ok(()),
            Ok(false) => Err(StoreError::NotFound(timestamp)),
            Err(e) => Err(e),
        };
        if let Err(e) = outcome {
            warn!(error = %e, timestamp, "log.delete_failed");
            return Notice::failure("Delete Failed", "Could not delete report from the report store.");
        }

        self.reports.retain(|r| r.timestamp != timestamp);
        self.notify(LogEvent::Deleted(timestamp));
        Notice::success("Report Deleted", "Report removed from the report store.")
    }

    pub fn filter(&self, query: &str) -> Vec<&ValidatedReport> {
        filter_reports(&self.reports, query)
    }
}

/// Case-insensitive search over output and notes; an empty query keeps everything.
pub fn filter_reports<'a>(reports: &'a [ValidatedReport], query: &str) -> Vec<&'a ValidatedReport> {
    let needle = query.trim().to_lowercase();
    reports
        .iter()
        .filter(|r| {
            needle.is_empty()
                || r.output.to_lowercase().contains(&needle)
                || r.analysis.notes.to_lowercase().contains(&needle)
        })
        .collect()
}

/// UTC calendar day (`YYYY-MM-DD`) for a millisecond timestamp.
pub fn day_key(timestamp: i64) -> String {
    DateTime::from_timestamp_millis(timestamp)
        .map(|dt| dt.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Buckets by UTC day, newest day first; reports inside a day stay newest first.
pub fn group_by_day<'a>(reports: &'a [ValidatedReport]) -> IndexMap<String, Vec<&'a ValidatedReport>> {
    let mut sorted: Vec<&ValidatedReport> = reports.iter().collect();
    sorted.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

    let mut days: IndexMap<String, Vec<&ValidatedReport>> = IndexMap::new();
    for report in sorted {
        days.entry(day_key(report.timestamp)).or_default().push(report);
    }
    days
}

pub fn export_json(reports: &[ValidatedReport]) -> Result<String, StoreError> {
    Ok(serde_json::to_string_pretty(reports)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AnalysisRecord;
    use crate::services::history::InMemoryReportStore;

    const DAY: i64 = 86_400_000;
    // 2024-03-10T12:00:00Z
    const NOON: i64 = 1_710_072_000_000;

    struct BrokenStore;

    impl ReportHistory for BrokenStore {
        fn load_all(&self) -> Result<Vec<ValidatedReport>, StoreError> {
            Err(StoreError::Unavailable("offline".to_string()))
        }
        fn save(&self, _report: &ValidatedReport) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("offline".to_string()))
        }
        fn delete(&self, _timestamp: i64) -> Result<bool, StoreError> {
            Err(StoreError::Unavailable("offline".to_string()))
        }
    }

    fn report(timestamp: i64, output: &str) -> ValidatedReport {
        ValidatedReport {
            timestamp,
            raw_input: String::new(),
            output: output.to_string(),
            analysis: AnalysisRecord::default(),
        }
    }

    #[test]
    fn test_save_and_delete_notify_subscribers() {
        let mut log = ReportLog::new(InMemoryReportStore::new());
        let rx = log.subscribe();

        assert!(log.save(report(1, "first")).is_success());
        assert!(log.save(report(2, "second")).is_success());
        assert_eq!(log.reports()[0].timestamp, 2);

        assert!(log.delete(1).is_success());
        assert_eq!(log.reports().len(), 1);

        let events: Vec<LogEvent> = rx.try_iter().collect();
        assert_eq!(events, vec![LogEvent::Saved(1), LogEvent::Saved(2), LogEvent::Deleted(1)]);
    }

    #[test]
    fn test_dropped_subscriber_is_pruned() {
        let mut log = ReportLog::new(InMemoryReportStore::new());
        drop(log.subscribe());
        assert!(log.save(report(1, "first")).is_success());
        assert!(log.subscribers.is_empty());
    }

    #[test]
    fn test_failures_leave_state_unchanged() {
        let mut log = ReportLog::new(BrokenStore);
        let rx = log.subscribe();
        assert!(!log.refresh().is_success());
        let notice = log.save(report(1, "first"));
        assert_eq!(notice.title, "Save Failed");
        assert!(log.reports().is_empty());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_delete_unknown_timestamp_fails() {
        let mut log = ReportLog::new(InMemoryReportStore::new());
        assert!(!log.delete(42).is_success());
    }

    #[test]
    fn test_refresh_loads_newest_first() {
        let store = InMemoryReportStore::with_reports(vec![report(1, "a"), report(3, "c"), report(2, "b")]);
        let mut log = ReportLog::new(store);
        assert!(log.refresh().is_success());
        let order: Vec<i64> = log.reports().iter().map(|r| r.timestamp).collect();
        assert_eq!(order, vec![3, 2, 1]);
    }

    #[test]
    fn test_filter_matches_output_and_notes() {
        let mut noted = report(2, "BLA blast at Pjr.");
        noted.analysis.notes = "Linked to TTP cell".to_string();
        let reports = vec![report(1, "TTP ambush on SFs cny."), noted, report(3, "FAK raid.")];

        assert_eq!(filter_reports(&reports, "ttp").len(), 2);
        assert_eq!(filter_reports(&reports, "  ").len(), 3);
        assert!(filter_reports(&reports, "drone").is_empty());
    }

    #[test]
    fn test_group_by_day() {
        let reports = vec![
            report(NOON - DAY, "yesterday"),
            report(NOON, "today noon"),
            report(NOON + 3_600_000, "today later"),
        ];
        let days = group_by_day(&reports);
        let keys: Vec<&str> = days.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["2024-03-10", "2024-03-09"]);
        assert_eq!(days["2024-03-10"][0].output, "today later");
    }

    #[test]
    fn test_export_json() {
        let json = export_json(&[report(5, "line")]).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value[0]["timestamp"], 5);
    }
}
