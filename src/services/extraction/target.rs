// Target extraction
// Special-case targets first, then the configured target map, then normalization

use regex::Regex;
use std::sync::OnceLock;

use super::action::match_category;
use crate::models::AnalysisRecord;
use crate::services::tables::KeywordMap;

pub const POST_CP_TARGET: &str = "SFs Post/CP";
pub const LEAS_TARGET: &str = "LEAs";
pub const SFS_TARGET: &str = "SFs";
pub const ARMY_TARGET: &str = "Army";
pub const CTD_TARGET: &str = "CTD";
pub const FC_TARGET: &str = "FC";
pub const PC_TARGET: &str = "PC";
pub const ASI_TARGET: &str = "ASI";

fn multi_post_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\b\w+\s+post.*\b\w+\s+cp\b").expect("multi post regex"))
}

fn at_location_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\bat\s+\w").expect("at location regex"))
}

fn special_target(lower: &str) -> Option<&'static str> {
    if (lower.contains("post") && lower.contains("cp")) || multi_post_re().is_match(lower) {
        return Some(POST_CP_TARGET);
    }
    if lower.contains("ctd") {
        return Some(CTD_TARGET);
    }
    if lower.contains("fc pers") || (lower.contains("fc") && lower.contains("post")) {
        return Some(FC_TARGET);
    }
    if lower.contains("police constable") || lower.contains("pc ") {
        return Some(PC_TARGET);
    }
    if lower.contains("asi ") {
        return Some(ASI_TARGET);
    }
    None
}

fn normalize_target(target: &str, lower: &str) -> String {
    match target {
        ARMY_TARGET => SFS_TARGET.to_string(),
        // A constable/ASI "at <place>" was present at an LEA site rather than targeted personally
        PC_TARGET | ASI_TARGET if at_location_re().is_match(lower) => LEAS_TARGET.to_string(),
        other => other.to_string(),
    }
}

pub fn extract_target(text: &str, map: &KeywordMap, analysis: &mut AnalysisRecord) {
    let lower = text.to_lowercase();
    let matched = special_target(&lower).or_else(|| match_category(&lower, map));
    analysis.target = matched.map(|t| normalize_target(t, &lower));
}
