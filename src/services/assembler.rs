// Report Assembler
// Renders an AnalysisRecord into the one-line SITREP summary

use regex::Regex;
use std::sync::OnceLock;

use crate::models::AnalysisRecord;
use crate::services::extraction::target::CTD_TARGET;
use crate::services::extraction::{ALLEGED_DETAIL, HIDEOUT_DETAIL};

fn whitespace_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("whitespace regex"))
}

fn at_code_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\bat\s+([^,;.]+?)\s*,\s*([A-Z][A-Za-z]{2})\b").expect("at-code regex")
    })
}

fn target_segment(analysis: &AnalysisRecord) -> String {
    let Some(target) = analysis.target.as_deref() else {
        return String::new();
    };

    if target == CTD_TARGET && analysis.details.contains(HIDEOUT_DETAIL) {
        return "on CTD HO".to_string();
    }

    if analysis.details.contains(ALLEGED_DETAIL) {
        format!("on alleged {}", target)
    } else {
        format!("on {}", target)
    }
}

fn details_segment(analysis: &AnalysisRecord) -> String {
    let printable: Vec<&str> = analysis
        .details
        .iter()
        .map(String::as_str)
        .filter(|d| *d != ALLEGED_DETAIL && *d != HIDEOUT_DETAIL)
        .collect();
    if printable.is_empty() {
        String::new()
    } else {
        format!(", {}", printable.join(", "))
    }
}

fn casualties_segment(analysis: &AnalysisRecord) -> String {
    if analysis.casualties.is_empty() {
        String::new()
    } else {
        format!("; {}", analysis.casualties.as_slice().join(", "))
    }
}

/// Whitespace collapse, stray space before the period, and "at <place>, <CODE>" spacing.
fn tidy(report: &str) -> String {
    let collapsed = whitespace_re().replace_all(report, " ");
    let period_fixed = collapsed.replacen(" .", ".", 1);
    at_code_re()
        .replace_all(&period_fixed, "at $1, $2")
        .trim()
        .to_string()
}

/// Deterministic: the same record always yields the same line.
pub fn assemble_report(analysis: &AnalysisRecord) -> String {
    let location = if analysis.location.is_empty() {
        String::new()
    } else {
        format!("at {}", analysis.location)
    };
    let source = if analysis.source.is_empty() {
        ".".to_string()
    } else {
        format!(". {}", analysis.source)
    };
    let notes = if analysis.notes.is_empty() {
        String::new()
    } else {
        format!(" [Notes: {}]", analysis.notes)
    };

    let report = format!(
        "{} {} {} {}{}{}{}{}",
        analysis.who,
        analysis.action,
        target_segment(analysis),
        location,
        details_segment(analysis),
        casualties_segment(analysis),
        source,
        notes
    );
    tidy(&report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::extraction::target::LEAS_TARGET;

    fn record() -> AnalysisRecord {
        let mut analysis = AnalysisRecord::default();
        analysis.who = "TTP".to_string();
        analysis.action = "ambush".to_string();
        analysis.target = Some("SFs cny".to_string());
        analysis.location = "Miran Shah, NWD".to_string();
        analysis.casualties.insert("2 x sldrs sh");
        analysis.casualties.insert("1 x sldrs inj");
        analysis.source = "@TTP".to_string();
        analysis
    }

    #[test]
    fn test_full_report() {
        assert_eq!(
            assemble_report(&record()),
            "TTP ambush on SFs cny at Miran Shah, NWD; 2 x sldrs sh, 1 x sldrs inj. @TTP"
        );
    }

    #[test]
    fn test_minimal_report() {
        let analysis = AnalysisRecord::default();
        assert_eq!(assemble_report(&analysis), "Unknown Ts raid.");
    }

    #[test]
    fn test_markers_rewrite_target_and_are_not_printed() {
        let mut analysis = record();
        analysis.details.insert(ALLEGED_DETAIL);
        analysis.details.insert("intense EoF");
        let report = assemble_report(&analysis);
        assert!(report.starts_with("TTP ambush on alleged SFs cny at Miran Shah, NWD, intense EoF;"));

        let mut analysis = AnalysisRecord::default();
        analysis.target = Some(CTD_TARGET.to_string());
        analysis.details.insert(HIDEOUT_DETAIL);
        assert_eq!(assemble_report(&analysis), "Unknown Ts raid on CTD HO.");
    }

    #[test]
    fn test_target_printed_as_extracted() {
        let mut analysis = AnalysisRecord::default();
        analysis.target = Some(LEAS_TARGET.to_string());
        assert_eq!(assemble_report(&analysis), "Unknown Ts raid on LEAs.");
    }

    #[test]
    fn test_notes_and_spacing() {
        let mut analysis = record();
        analysis.location = "Tirah ,  Khy".to_string();
        analysis.notes = "follow up".to_string();
        let report = assemble_report(&analysis);
        assert!(report.contains("at Tirah, Khy;"));
        assert!(report.ends_with(". @TTP [Notes: follow up]"));
    }

    #[test]
    fn test_idempotent() {
        let analysis = record();
        let first = assemble_report(&analysis);
        assert_eq!(first, assemble_report(&analysis));
        assert_eq!(tidy(&first), first);
    }
}
