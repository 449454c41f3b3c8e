// Location extraction
// Correction table, then a cascade of location patterns; first success wins

use regex::Regex;
use std::sync::OnceLock;
use tracing::warn;

use crate::models::AnalysisRecord;
use crate::services::tables::{ConfigurationTables, LocationTable};

fn bazar_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\bbazar\b").expect("bazar regex"))
}

fn qualifier_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\s*\b(?:valley|area|tehsil|district)$").expect("qualifier regex")
    })
}

fn movement_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\b(?:from|to)\s+[\w\s]+(?:\bto|,)\s+([\w\s]+)").expect("movement regex")
    })
}

fn preposition_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\b(?:at|in|near|of|on)\s+").expect("preposition regex"))
}

fn compile(pattern: &str) -> Option<Regex> {
    match Regex::new(pattern) {
        Ok(re) => Some(re),
        Err(e) => {
            warn!(error = %e, pattern, "location.pattern_invalid");
            None
        }
    }
}

fn apply_corrections(text: &str, tables: &ConfigurationTables) -> String {
    let mut corrected = text.to_string();
    for (wrong, right) in tables.location_corrections() {
        if wrong.is_empty() {
            continue;
        }
        if let Some(re) = compile(&format!("(?i){}", regex::escape(wrong))) {
            corrected = re.replace_all(&corrected, regex::NoExpand(right.as_str())).into_owned();
        }
    }
    corrected
}

/// Fix the "bazar" typo and drop a trailing valley/area/tehsil/district qualifier.
fn clean_area(raw: &str) -> String {
    let area = raw.trim().trim_end_matches(',').trim();
    let area = bazar_re().replace(area, "Bazaar");
    qualifier_re().replace(&area, "").trim().to_string()
}

/// Three uppercase letters, or any configured code in any case.
fn code_alternation(codes: &LocationTable) -> String {
    let mut alternatives = vec![r"[A-Z]{3}".to_string()];
    alternatives.extend(
        codes
            .values()
            .filter(|c| !c.code.is_empty())
            .map(|c| format!("(?i:{})", regex::escape(&c.code))),
    );
    alternatives.join("|")
}

/// Configured spelling for a known code, upper case otherwise.
fn canonical_code(raw: &str, codes: &LocationTable) -> String {
    codes
        .values()
        .find(|c| c.code.eq_ignore_ascii_case(raw))
        .map(|c| c.code.clone())
        .unwrap_or_else(|| raw.to_uppercase())
}

fn names_longest_first(codes: &LocationTable) -> Vec<&String> {
    let mut names: Vec<&String> = codes.keys().collect();
    // Stable, so equal lengths keep configured order
    names.sort_by(|a, b| b.len().cmp(&a.len()));
    names
}

fn code_area_pattern(text: &str, codes: &LocationTable) -> Option<String> {
    let re = compile(&format!(r"\b({})-([\w\s]+)", code_alternation(codes)))?;
    let caps = re.captures(text)?;
    let area = clean_area(&caps[2]);
    Some(format!("{}, {}", area, canonical_code(&caps[1], codes)))
}

fn preposition_pattern(text: &str, codes: &LocationTable) -> Option<String> {
    let re = compile(&format!(
        r"(?i:\b(?:at|in|near))\s+([\w\s]+?)(?:,\s*|\s+)({})\b",
        code_alternation(codes)
    ))?;
    let caps = re.captures(text)?;
    let area = clean_area(&caps[1]);
    Some(format!("{}, {}", area, canonical_code(&caps[2], codes)))
}

fn movement_pattern(text: &str, codes: &LocationTable) -> Option<String> {
    let caps = movement_re().captures(text)?;
    let destination = caps[1].trim().to_lowercase();
    codes
        .iter()
        .find(|(name, _)| !name.is_empty() && destination.contains(&name.to_lowercase()))
        .map(|(_, data)| format!("en-route to {}", data.code))
}

fn area_name_pattern(text: &str, codes: &LocationTable) -> Option<String> {
    for name in names_longest_first(codes) {
        let words: Vec<String> = name.split_whitespace().map(regex::escape).collect();
        if words.is_empty() {
            continue;
        }
        let pattern = format!(
            r"(?i)([\w\s]+?),\s*{}(?:\s+(?:district|tehsil))?\b",
            words.join(r"\s+")
        );
        let Some(caps) = compile(&pattern).and_then(|re| re.captures(text)) else {
            continue;
        };
        // The capture runs from the start of the clause; keep what follows the last preposition
        let clause = &caps[1];
        let place = preposition_re()
            .find_iter(clause)
            .last()
            .map(|m| &clause[m.end()..])
            .unwrap_or(clause);
        let place = clean_area(place);
        let code = &codes[name.as_str()].code;
        if place.is_empty() {
            return Some(code.clone());
        }
        return Some(format!("{}, {}", place, code));
    }
    None
}

fn bare_code(text: &str, codes: &LocationTable) -> Option<String> {
    codes
        .values()
        .filter(|c| !c.code.is_empty())
        .find(|c| {
            compile(&format!(r"\b{}\b", regex::escape(&c.code)))
                .map_or(false, |re| re.is_match(text))
        })
        .map(|c| c.code.clone())
}

fn bare_name(text: &str, codes: &LocationTable) -> Option<String> {
    let lower = text.to_lowercase();
    names_longest_first(codes)
        .into_iter()
        .find(|name| !name.is_empty() && lower.contains(&name.to_lowercase()))
        .map(|name| codes[name.as_str()].code.clone())
}

pub fn extract_location(text: &str, tables: &ConfigurationTables, analysis: &mut AnalysisRecord) {
    let corrected = apply_corrections(text, tables);
    let codes = tables.location_codes();

    let found = code_area_pattern(&corrected, codes)
        .or_else(|| preposition_pattern(&corrected, codes))
        .or_else(|| movement_pattern(&corrected, codes))
        .or_else(|| area_name_pattern(&corrected, codes))
        .or_else(|| bare_code(&corrected, codes))
        .or_else(|| bare_name(&corrected, codes));

    if let Some(location) = found {
        analysis.location = location;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn location(text: &str) -> String {
        let tables = ConfigurationTables::defaults();
        let mut analysis = AnalysisRecord::default();
        extract_location(text, &tables, &mut analysis);
        analysis.location
    }

    #[test]
    fn test_code_area_with_correction() {
        assert_eq!(location("Militants attacked post at NWD-Dosli"), "Dosali, NWD");
        assert_eq!(location("Fire raid at SWD-Wana bazar"), "Wana Bazaar, SWD");
    }

    #[test]
    fn test_hyphenated_words_are_not_codes() {
        assert_eq!(location("follow-up op launched"), "");
    }

    #[test]
    fn test_preposition_area_code() {
        assert_eq!(
            location("TTP ambushed a security forces convoy near Miran Shah, NWD."),
            "Miran Shah, NWD"
        );
        assert_eq!(location("Blast in Tirah Valley, Khy"), "Tirah, Khy");
    }

    #[test]
    fn test_movement() {
        assert_eq!(
            location("Convoy moving from Bannu to Mir Ali, North Waziristan was ambushed"),
            "en-route to NWD"
        );
    }

    #[test]
    fn test_area_before_location_name() {
        assert_eq!(
            location("TTP attacked post in Mir Ali, North Waziristan District"),
            "Mir Ali, NWD"
        );
    }

    #[test]
    fn test_bare_code_and_name() {
        assert_eq!(location("Fire raid on post, Bxu"), "Bxu");
        assert_eq!(location("Blast in Lakki Marwat"), "Lki");
        assert_eq!(location("Nothing here"), "");
    }

    #[test]
    fn test_longest_name_first() {
        let mut tables = ConfigurationTables::defaults();
        tables.set_location("Dir", crate::models::LocationCode::new("Drx", 35.0, 71.9));
        let mut analysis = AnalysisRecord::default();
        extract_location("IED blast in Dir Upper", &tables, &mut analysis);
        assert_eq!(analysis.location, "DIU");
    }
}
