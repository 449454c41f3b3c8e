// Report History Storage
// Validated reports persisted as one JSON document, newest first

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::info;

use super::error::StoreError;
use crate::models::ValidatedReport;

const ENV_DATA_DIR: &str = "SITREP_DATA_DIR";
const REPORTS_FILE: &str = "reports.json";

/// Persistence port for the validated report log.
pub trait ReportHistory {
    /// Newest first.
    fn load_all(&self) -> Result<Vec<ValidatedReport>, StoreError>;
    /// Replaces any stored report with the same timestamp.
    fn save(&self, report: &ValidatedReport) -> Result<(), StoreError>;
    /// `Ok(false)` when no report carries the timestamp.
    fn delete(&self, timestamp: i64) -> Result<bool, StoreError>;
}

fn newest_first(reports: &mut [ValidatedReport]) {
    reports.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
}

pub struct JsonReportStore {
    data_dir: PathBuf,
    reports_file: PathBuf,
}

impl JsonReportStore {
    pub fn new(data_dir: PathBuf) -> Self {
        let reports_file = data_dir.join(REPORTS_FILE);
        Self { data_dir, reports_file }
    }

    /// Default data directory, honouring `SITREP_DATA_DIR`
    pub fn default_data_dir() -> Option<PathBuf> {
        match std::env::var(ENV_DATA_DIR) {
            Ok(p) if !p.trim().is_empty() => Some(PathBuf::from(p)),
            _ => dirs::data_local_dir().map(|p| p.join("sitrep")),
        }
    }

    pub fn reports_file(&self) -> &Path {
        &self.reports_file
    }

    fn read(&self) -> Result<Vec<ValidatedReport>, StoreError> {
        if !self.reports_file.exists() {
            return Ok(Vec::new());
        }
        let content = fs::read_to_string(&self.reports_file)?;
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_str(&content)?)
    }

    fn write(&self, reports: &[ValidatedReport]) -> Result<(), StoreError> {
        fs::create_dir_all(&self.data_dir)?;
        let content = serde_json::to_string_pretty(reports)?;
        fs::write(&self.reports_file, content)?;
        Ok(())
    }
}

impl ReportHistory for JsonReportStore {
    fn load_all(&self) -> Result<Vec<ValidatedReport>, StoreError> {
        let mut reports = self.read()?;
        newest_first(&mut reports);
        Ok(reports)
    }

    fn save(&self, report: &ValidatedReport) -> Result<(), StoreError> {
        let mut reports = self.read()?;
        reports.retain(|r| r.timestamp != report.timestamp);
        reports.push(report.clone());
        newest_first(&mut reports);
        self.write(&reports)?;
        info!(timestamp = report.timestamp, total = reports.len(), "history.report_saved");
        Ok(())
    }

    fn delete(&self, timestamp: i64) -> Result<bool, StoreError> {
        let mut reports = self.read()?;
        let before = reports.len();
        reports.retain(|r| r.timestamp != timestamp);
        if reports.len() == before {
            return Ok(false);
        }
        self.write(&reports)?;
        info!(timestamp, total = reports.len(), "history.report_deleted");
        Ok(true)
    }
}

/// Process-local history, for embedding and tests.
#[derive(Default)]
pub struct InMemoryReportStore {
    reports: Mutex<Vec<ValidatedReport>>,
}

impl InMemoryReportStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_reports(mut reports: Vec<ValidatedReport>) -> Self {
        newest_first(&mut reports);
        Self {
            reports: Mutex::new(reports),
        }
    }
}

impl ReportHistory for InMemoryReportStore {
    fn load_all(&self) -> Result<Vec<ValidatedReport>, StoreError> {
        let reports = self
            .reports
            .lock()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        Ok(reports.clone())
    }

    fn save(&self, report: &ValidatedReport) -> Result<(), StoreError> {
        let mut reports = self
            .reports
            .lock()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        reports.retain(|r| r.timestamp != report.timestamp);
        reports.push(report.clone());
        newest_first(&mut reports);
        Ok(())
    }

    fn delete(&self, timestamp: i64) -> Result<bool, StoreError> {
        let mut reports = self
            .reports
            .lock()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        let before = reports.len();
        reports.retain(|r| r.timestamp != timestamp);
        Ok(reports.len() != before)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AnalysisRecord;
    use tempfile::TempDir;

    fn report(timestamp: i64) -> ValidatedReport {
        let mut analysis = AnalysisRecord::default();
        analysis.casualties.insert("2 x sldrs sh");
        analysis.casualties.insert("1 x sldrs inj");
        ValidatedReport {
            timestamp,
            raw_input: "raw".to_string(),
            output: format!("report {}", timestamp),
            analysis,
        }
    }

    #[test]
    fn test_missing_file_is_empty_history() {
        let dir = TempDir::new().unwrap();
        let store = JsonReportStore::new(dir.path().join("nested"));
        assert!(store.load_all().unwrap().is_empty());
        assert!(!store.delete(1).unwrap());
    }

    #[test]
    fn test_save_load_delete() {
        let dir = TempDir::new().unwrap();
        let store = JsonReportStore::new(dir.path().to_path_buf());
        store.save(&report(100)).unwrap();
        store.save(&report(300)).unwrap();
        store.save(&report(200)).unwrap();

        let loaded = store.load_all().unwrap();
        let order: Vec<i64> = loaded.iter().map(|r| r.timestamp).collect();
        assert_eq!(order, vec![300, 200, 100]);
        assert_eq!(loaded[0].analysis.casualties.as_slice(), &["2 x sldrs sh", "1 x sldrs inj"]);

        assert!(store.delete(200).unwrap());
        assert_eq!(store.load_all().unwrap().len(), 2);
    }

    #[test]
    fn test_fragments_are_json_arrays() {
        let dir = TempDir::new().unwrap();
        let store = JsonReportStore::new(dir.path().to_path_buf());
        store.save(&report(1)).unwrap();
        let raw = fs::read_to_string(store.reports_file()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert!(value[0]["analysis"]["casualties"].is_array());
        assert_eq!(value[0]["rawInput"], "raw");
    }

    #[test]
    fn test_corrupt_file_is_parse_error() {
        let dir = TempDir::new().unwrap();
        let store = JsonReportStore::new(dir.path().to_path_buf());
        fs::write(store.reports_file(), "{not json").unwrap();
        assert!(matches!(store.load_all(), Err(StoreError::Parse(_))));
    }

    #[test]
    fn test_in_memory_store() {
        let store = InMemoryReportStore::with_reports(vec![report(1), report(2)]);
        assert_eq!(store.load_all().unwrap()[0].timestamp, 2);
        store.save(&report(2)).unwrap();
        assert_eq!(store.load_all().unwrap().len(), 2);
        assert!(store.delete(1).unwrap());
        assert!(!store.delete(1).unwrap());
    }
}
