// Source extraction
// Trailing @handle attribution and social-media sourced reporting

use regex::Regex;
use std::sync::OnceLock;

use crate::models::AnalysisRecord;

/// Placeholder source for reports that carry no handle at all.
pub const DEFAULT_SOURCE: &str = "@X";
/// Actor used in the social-media tag when none could be attributed.
pub const FALLBACK_SM_ACTOR: &str = "FAH";

const MILITANT_SOURCED_PHRASES: [&str; 2] = ["sources report", "militant sources"];

fn trailing_handle_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(@[A-Za-z]+)\s*$").expect("trailing handle regex"))
}

/// Set `analysis.source` from a trailing handle, or the placeholder when no `@` appears at all.
///
/// Returns true when the text reads as militant/social-media sourced; the tag itself
/// is applied by [`attribute_social_media_source`] once the actor is known.
pub fn extract_source(text: &str, analysis: &mut AnalysisRecord) -> bool {
    if let Some(caps) = trailing_handle_re().captures(text) {
        analysis.source = caps[1].to_string();
    } else if !text.contains('@') {
        analysis.source = DEFAULT_SOURCE.to_string();
    }

    let lower = text.to_lowercase();
    MILITANT_SOURCED_PHRASES.iter().any(|p| lower.contains(p))
}

/// Override the source with `@<actor> SM`.
pub fn attribute_social_media_source(analysis: &mut AnalysisRecord) {
    let actor = if analysis.has_known_actor() {
        analysis.who.as_str()
    } else {
        FALLBACK_SM_ACTOR
    };
    analysis.source = format!("@{} SM", actor);
}

/// Remove the trailing handle so later extractors do not see it.
pub fn strip_source(text: &str) -> String {
    trailing_handle_re().replace(text, "").trim().to_string()
}
