// Who extraction
// Attributes the incident to a configured group or the unknown-actor sentinel

use regex::Regex;
use tracing::warn;

use crate::models::{AnalysisRecord, UNKNOWN_ACTOR};

const GENERIC_ACTOR_NOUNS: [&str; 3] = ["militants", "terrorists", "unknown"];

fn claimed_by_re(groups: &[String]) -> Option<Regex> {
    let names: Vec<String> = groups
        .iter()
        .filter(|g| !g.trim().is_empty())
        .map(|g| regex::escape(g.trim()))
        .collect();
    if names.is_empty() {
        return None;
    }
    let pattern = format!(r"(?i)(?:claimed|owned)\s+by\s+({})", names.join("|"));
    match Regex::new(&pattern) {
        Ok(re) => Some(re),
        Err(e) => {
            warn!(error = %e, "who.claimed_by_pattern_invalid");
            None
        }
    }
}

/// First successful rule wins: group prefix, "claimed/owned by <group>", generic actor noun.
pub fn extract_who(text: &str, groups: &[String], analysis: &mut AnalysisRecord) {
    let lower = text.to_lowercase();

    let prefixed = groups
        .iter()
        .map(|g| g.trim())
        .filter(|g| !g.is_empty())
        .find(|g| lower.starts_with(&g.to_lowercase()));
    if let Some(group) = prefixed {
        analysis.who = group.to_uppercase();
        return;
    }

    if let Some(caps) = claimed_by_re(groups).and_then(|re| re.captures(text)) {
        analysis.who = caps[1].to_uppercase();
        return;
    }

    if GENERIC_ACTOR_NOUNS.iter().any(|noun| lower.starts_with(noun)) {
        analysis.who = UNKNOWN_ACTOR.to_string();
    }
}
