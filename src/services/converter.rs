// Report Converter
// Runs the extraction pipeline over one report and assembles the SITREP line

use tracing::debug;

use crate::models::{AnalysisRecord, ConversionResult, SmartSuggestion, ThreatLevel, ValidatedReport};
use crate::services::assembler::assemble_report;
use crate::services::config_store::TablesPort;
use crate::services::extraction::{
    attribute_social_media_source, extract_action, extract_casualties, extract_details, extract_location,
    extract_source, extract_target, extract_who, strip_claimed, strip_source,
};
use crate::services::suggestions::{smart_suggestions, smart_suggestions_now};
use crate::services::tables::ConfigurationTables;
use crate::services::text_processor::{normalize_input, split_reports};
use crate::services::threat::threat_level;

/// Conversion engine bound to one set of configuration tables.
///
/// Conversions only read the tables, so `&ReportConverter` can be shared across
/// threads; admin edits go through [`ReportConverter::tables_mut`] and need `&mut`.
#[derive(Debug, Clone, Default)]
pub struct ReportConverter {
    tables: ConfigurationTables,
}

impl ReportConverter {
    pub fn new(tables: ConfigurationTables) -> Self {
        Self { tables }
    }

    pub fn load(port: &dyn TablesPort) -> Self {
        Self::new(ConfigurationTables::load(port))
    }

    pub fn tables(&self) -> &ConfigurationTables {
        &self.tables
    }

    pub fn tables_mut(&mut self) -> &mut ConfigurationTables {
        &mut self.tables
    }

    /// Never fails: empty input gives an empty line and a default record.
    pub fn convert(&self, raw: &str) -> ConversionResult {
        let original = normalize_input(raw);
        if original.is_empty() {
            return ConversionResult::empty();
        }

        let mut analysis = AnalysisRecord::default();
        let tables = &self.tables;

        let (claimed, text) = strip_claimed(&original);
        let social_media = extract_source(&text, &mut analysis);
        let text = strip_source(&text);

        extract_who(&original, tables.militant_groups(), &mut analysis);
        if social_media {
            attribute_social_media_source(&mut analysis);
        }

        extract_action(&text, tables.action_map(), claimed, &mut analysis);
        extract_target(&text, tables.target_map(), &mut analysis);
        extract_location(&text, tables, &mut analysis);
        extract_casualties(&original, &mut analysis);
        extract_details(&original, &mut analysis);

        debug!(
            who = %analysis.who,
            action = %analysis.action,
            target = analysis.target.as_deref().unwrap_or("-"),
            location = %analysis.location,
            casualties = analysis.casualties.len(),
            details = analysis.details.len(),
            "convert.analysis"
        );

        ConversionResult {
            report: assemble_report(&analysis),
            analysis,
        }
    }

    /// Converts every blank-line separated report in the input.
    pub fn convert_batch(&self, raw: &str) -> Vec<ConversionResult> {
        let results: Vec<ConversionResult> = split_reports(raw).iter().map(|r| self.convert(r)).collect();
        debug!(count = results.len(), "convert.batch");
        results
    }

    /// Re-assembles the line from an analyst-edited record.
    pub fn rebuild(&self, analysis: &AnalysisRecord) -> String {
        assemble_report(analysis)
    }

    pub fn threat_level(&self, analysis: &AnalysisRecord) -> ThreatLevel {
        threat_level(analysis)
    }

    pub fn suggestions(
        &self,
        analysis: &AnalysisRecord,
        history: &[ValidatedReport],
        raw_input: &str,
    ) -> Vec<SmartSuggestion> {
        smart_suggestions_now(analysis, history, raw_input)
    }

    pub fn suggestions_at(
        &self,
        analysis: &AnalysisRecord,
        history: &[ValidatedReport],
        raw_input: &str,
        now_ms: i64,
    ) -> Vec<SmartSuggestion> {
        smart_suggestions(analysis, history, raw_input, now_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ThreatBand, BASELINE_ACTION, UNKNOWN_ACTOR};

    #[test]
    fn test_convert_ambush() {
        let converter = ReportConverter::default();
        let result =
            converter.convert("TTP ambushed a security forces convoy near Miran Shah, NWD. 2 sldrs sh, 1 inj. @TTP");
        let a = &result.analysis;
        assert_eq!(a.who, "TTP");
        assert_eq!(a.action, "ambush");
        assert_eq!(a.target.as_deref(), Some("SFs cny"));
        assert_eq!(a.location, "Miran Shah, NWD");
        assert_eq!(a.casualties.as_slice(), &["2 x sldrs sh", "1 x sldrs inj"]);
        assert_eq!(a.source, "@TTP");
        assert_eq!(
            result.report,
            "TTP ambush on SFs cny at Miran Shah, NWD; 2 x sldrs sh, 1 x sldrs inj. @TTP"
        );
        assert_eq!(converter.threat_level(a).level, ThreatBand::Severe);
    }

    #[test]
    fn test_convert_empty() {
        let converter = ReportConverter::default();
        for input in ["", "   \n\t"] {
            let result = converter.convert(input);
            assert_eq!(result.report, "");
            assert_eq!(result.analysis.who, UNKNOWN_ACTOR);
            assert_eq!(result.analysis.action, BASELINE_ACTION);
            assert!(result.analysis.target.is_none());
            assert!(result.analysis.casualties.is_empty());
        }
    }

    #[test]
    fn test_claimed_without_action_keyword() {
        let converter = ReportConverter::default();
        let result = converter.convert("BLA claimed responsibility in Panjgur");
        assert_eq!(result.analysis.who, "BLA");
        assert_eq!(result.analysis.action, "claimed attk");
        assert_eq!(result.analysis.location, "Pjr");
        assert_eq!(result.analysis.source, "@X");
    }

    #[test]
    fn test_social_media_sourced() {
        let converter = ReportConverter::default();
        let result = converter.convert("TTP attacked police station in Bannu, militant sources report 2 policemen martyred");
        assert_eq!(result.analysis.source, "@TTP SM");
        assert_eq!(result.analysis.target.as_deref(), Some("LEAs"));
        assert!(result.analysis.casualties.contains("2 x LEAs pers sh"));
    }

    #[test]
    fn test_batch_and_rebuild() {
        let converter = ReportConverter::default();
        let results = converter.convert_batch("IED blast in Lakki Marwat\n\nDrone strike in Bajaur");
        assert_eq!(results.len(), 2);
        assert_eq!(results[1].analysis.action, "strike");

        let mut edited = results[0].analysis.clone();
        edited.notes = "checked".to_string();
        assert!(converter.rebuild(&edited).ends_with("[Notes: checked]"));
    }
}
