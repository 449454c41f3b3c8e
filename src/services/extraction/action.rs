// Action extraction
// First action category (in configured order) with a keyword in the text

use regex::Regex;
use std::sync::OnceLock;

use crate::models::{AnalysisRecord, CLAIMED_ACTION};
use crate::services::tables::KeywordMap;

fn claimed_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)claimed\s*").expect("claimed regex"))
}

/// Detect the "claimed" qualifier and remove its first occurrence.
pub fn strip_claimed(text: &str) -> (bool, String) {
    let claimed = text.to_lowercase().contains("claimed");
    (claimed, claimed_re().replace(text, "").into_owned())
}

/// Returns the matched category, if any.
pub fn match_category<'a>(lower_text: &str, map: &'a KeywordMap) -> Option<&'a str> {
    map.iter()
        .find(|(_, keywords)| {
            keywords
                .iter()
                .any(|k| !k.is_empty() && lower_text.contains(k.as_str()))
        })
        .map(|(category, _)| category.as_str())
}

pub fn extract_action(text: &str, map: &KeywordMap, claimed: bool, analysis: &mut AnalysisRecord) {
    let lower = text.to_lowercase();
    match match_category(&lower, map) {
        Some(category) => analysis.action = category.to_string(),
        None if claimed => analysis.action = CLAIMED_ACTION.to_string(),
        None => {}
    }
}
