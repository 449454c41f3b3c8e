// Sitrep Core Services
// Conversion engine, configuration tables and report-log collaborators

pub mod error;
pub mod text_processor;
pub mod config_store;
pub mod tables;
pub mod extraction;
pub mod assembler;
pub mod threat;
pub mod suggestions;
pub mod converter;
pub mod history;
pub mod report_log;
pub mod dashboard;

pub use error::StoreError;
pub use text_processor::{normalize_input, split_reports};
pub use config_store::{ConfigStore, InMemoryTablesPort, TablesPort};
pub use tables::{ConfigPayload, ConfigurationTables, KeywordMap, KeywordTable, LocationTable};
pub use assembler::assemble_report;
pub use threat::{threat_level, ThreatWeights};
pub use suggestions::{smart_suggestions, smart_suggestions_now};
pub use converter::ReportConverter;
pub use history::{InMemoryReportStore, JsonReportStore, ReportHistory};
pub use report_log::{day_key, export_json, filter_reports, group_by_day, ReportLog};
pub use dashboard::{activity, compute_kpis, forecast, recent_incidents, INSUFFICIENT_DATA_FORECAST};
