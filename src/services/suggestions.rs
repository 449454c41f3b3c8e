// Smart suggestions
// Authoring hints derived from the current analysis, the raw text and the report log

use indexmap::IndexMap;
use regex::Regex;
use std::sync::OnceLock;

use crate::models::{AnalysisField, AnalysisRecord, SmartSuggestion, SuggestionAction, ValidatedReport};

const PATTERN_WINDOW_DAYS: i64 = 14;
const MS_PER_DAY: f64 = 86_400_000.0;

fn casualty_term_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\b(?:cas|casualt(?:y|ies)|killed|injured|martyred|wounded)\b")
            .expect("casualty term regex")
    })
}

/// Trailing code of a location such as "Miran Shah, NWD".
fn location_code(location: &str) -> &str {
    location.rsplit(',').next().unwrap_or(location).trim()
}

/// Most frequent known actor among reports in the same area; ties go to first appearance.
fn dominant_actor<'a>(history: &'a [ValidatedReport], code: &str) -> Option<&'a str> {
    let mut counts: IndexMap<&str, usize> = IndexMap::new();
    for report in history {
        let prior = &report.analysis;
        if prior.location.is_empty() || !prior.location.contains(code) || !prior.has_known_actor() {
            continue;
        }
        *counts.entry(prior.who.as_str()).or_insert(0) += 1;
    }

    let mut best: Option<(&str, usize)> = None;
    for (actor, count) in counts {
        if best.map_or(true, |(_, top)| count > top) {
            best = Some((actor, count));
        }
    }
    best.map(|(actor, _)| actor)
}

fn attribution(analysis: &AnalysisRecord, history: &[ValidatedReport]) -> Option<SmartSuggestion> {
    if analysis.has_known_actor() || analysis.location.is_empty() {
        return None;
    }
    let code = location_code(&analysis.location);
    let actor = dominant_actor(history, code)?;
    Some(SmartSuggestion {
        text: format!(
            "Consider attributing to <strong>{}</strong>, which is active in {}.",
            actor, code
        ),
        action: SuggestionAction::SetField,
        field: Some(AnalysisField::Who),
        value: Some(actor.to_string()),
    })
}

fn pattern_recurrence(
    analysis: &AnalysisRecord,
    history: &[ValidatedReport],
    now_ms: i64,
) -> Option<SmartSuggestion> {
    let similar = history
        .iter()
        .find(|r| r.analysis.action == analysis.action && r.analysis.target == analysis.target)?;

    let days = (now_ms.saturating_sub(similar.timestamp) as f64 / MS_PER_DAY).round() as i64;
    // Future-dated history is not a prior occurrence
    if !(0..PATTERN_WINDOW_DAYS).contains(&days) {
        return None;
    }
    let unit = if days == 1 { "day" } else { "days" };
    Some(SmartSuggestion {
        text: format!(
            "This matches a pattern: a similar attack occurred <strong>{} {} ago</strong>.",
            days, unit
        ),
        action: SuggestionAction::HighlightPattern,
        field: None,
        value: None,
    })
}

fn casualty_omission(analysis: &AnalysisRecord, raw_input: &str) -> Option<SmartSuggestion> {
    if !analysis.casualties.is_empty() || !casualty_term_re().is_match(raw_input) {
        return None;
    }
    Some(SmartSuggestion {
        text: "Report mentions casualties but none were parsed. Add details?".to_string(),
        action: SuggestionAction::FocusField,
        field: Some(AnalysisField::Casualties),
        value: None,
    })
}

fn notes_tip() -> SmartSuggestion {
    SmartSuggestion {
        text: "<strong>Pro Tip:</strong> Add your own analysis or context in the \"Notes\" field before saving."
            .to_string(),
        action: SuggestionAction::FocusField,
        field: Some(AnalysisField::Notes),
        value: None,
    }
}

/// `history` is newest first; `now_ms` is milliseconds since the Unix epoch.
pub fn smart_suggestions(
    analysis: &AnalysisRecord,
    history: &[ValidatedReport],
    raw_input: &str,
    now_ms: i64,
) -> Vec<SmartSuggestion> {
    let suggestions: Vec<SmartSuggestion> = [
        attribution(analysis, history),
        pattern_recurrence(analysis, history, now_ms),
        casualty_omission(analysis, raw_input),
    ]
    .into_iter()
    .flatten()
    .collect();

    if suggestions.is_empty() {
        vec![notes_tip()]
    } else {
        suggestions
    }
}

pub fn smart_suggestions_now(
    analysis: &AnalysisRecord,
    history: &[ValidatedReport],
    raw_input: &str,
) -> Vec<SmartSuggestion> {
    smart_suggestions(analysis, history, raw_input, chrono::Utc::now().timestamp_millis())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UNKNOWN_ACTOR;

    const DAY: i64 = 86_400_000;
    const NOW: i64 = 1_700_000_000_000;

    fn report(timestamp: i64, who: &str, action: &str, target: Option<&str>, location: &str) -> ValidatedReport {
        let mut analysis = AnalysisRecord::default();
        analysis.who = who.to_string();
        analysis.action = action.to_string();
        analysis.target = target.map(|t| t.to_string());
        analysis.location = location.to_string();
        ValidatedReport {
            timestamp,
            raw_input: String::new(),
            output: String::new(),
            analysis,
        }
    }

    #[test]
    fn test_attribution_picks_most_frequent_actor() {
        let history = vec![
            report(NOW - 40 * DAY, "BLA", "blast", None, "Pjr"),
            report(NOW - 41 * DAY, "BLF", "blast", None, "Turbat, Pjr"),
            report(NOW - 42 * DAY, "BLF", "raid", None, "Pjr"),
            report(NOW - 43 * DAY, UNKNOWN_ACTOR, "raid", None, "Pjr"),
        ];
        let mut analysis = AnalysisRecord::default();
        analysis.location = "Gwargo, Pjr".to_string();

        let suggestions = smart_suggestions(&analysis, &history, "", NOW);
        assert_eq!(suggestions[0].action, SuggestionAction::SetField);
        assert_eq!(suggestions[0].field, Some(AnalysisField::Who));
        assert_eq!(suggestions[0].value.as_deref(), Some("BLF"));
        assert!(suggestions[0].text.contains("active in Pjr"));
    }

    #[test]
    fn test_attribution_tie_goes_to_first_seen() {
        let history = vec![
            report(NOW - 20 * DAY, "TTP", "raid", None, "NWD"),
            report(NOW - 21 * DAY, "FAK", "raid", None, "NWD"),
        ];
        assert_eq!(dominant_actor(&history, "NWD"), Some("TTP"));
    }

    #[test]
    fn test_pattern_day_phrasing() {
        let history = vec![report(NOW - 5 * DAY, "TTP", "ambush", Some("SFs cny"), "NWD")];
        let mut analysis = AnalysisRecord::default();
        analysis.who = "TTP".to_string();
        analysis.action = "ambush".to_string();
        analysis.target = Some("SFs cny".to_string());

        let suggestions = smart_suggestions(&analysis, &history, "", NOW);
        assert_eq!(suggestions.len(), 1);
        assert_eq!(suggestions[0].action, SuggestionAction::HighlightPattern);
        assert!(suggestions[0].text.contains("<strong>5 days ago</strong>"));

        let history = vec![report(NOW - DAY, "TTP", "ambush", Some("SFs cny"), "NWD")];
        let suggestions = smart_suggestions(&analysis, &history, "", NOW);
        assert!(suggestions[0].text.contains("1 day ago"));
    }

    #[test]
    fn test_old_pattern_is_ignored() {
        let history = vec![report(NOW - 14 * DAY, "TTP", "raid", None, "")];
        let analysis = AnalysisRecord::default();
        let suggestions = smart_suggestions(&analysis, &history, "", NOW);
        assert_eq!(suggestions, vec![notes_tip()]);
    }

    #[test]
    fn test_extreme_and_future_timestamps_are_ignored() {
        let mut analysis = AnalysisRecord::default();
        analysis.who = "TTP".to_string();

        for timestamp in [i64::MIN, i64::MAX, NOW + 3 * DAY] {
            let history = vec![report(timestamp, "TTP", "raid", None, "")];
            let suggestions = smart_suggestions(&analysis, &history, "", NOW);
            assert_eq!(suggestions, vec![notes_tip()], "timestamp {}", timestamp);
        }
    }

    #[test]
    fn test_casualty_omission() {
        let analysis = AnalysisRecord::default();
        let suggestions = smart_suggestions(&analysis, &[], "Blast at Bannu, cas reported", NOW);
        assert_eq!(suggestions.len(), 1);
        assert_eq!(suggestions[0].field, Some(AnalysisField::Casualties));

        let suggestions = smart_suggestions(&analysis, &[], "Blast near a casino", NOW);
        assert_eq!(suggestions[0].field, Some(AnalysisField::Notes));
    }
}
