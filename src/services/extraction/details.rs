// Detail extraction
// Independent annotation rules; every matching rule adds its label

use regex::{Captures, Regex};
use std::sync::OnceLock;

use crate::models::AnalysisRecord;

/// Marker consumed by the assembler ("on alleged <target>").
pub const ALLEGED_DETAIL: &str = "alleged";
/// Hideout marker consumed by the assembler ("on CTD HO").
pub const HIDEOUT_DETAIL: &str = "HO";

type LabelFn = Box<dyn Fn(&Captures<'_>) -> String + Send + Sync>;

pub struct DetailRule {
    pattern: Regex,
    label: LabelFn,
}

impl DetailRule {
    pub fn fixed(pattern: &str, label: &'static str) -> Self {
        Self::computed(pattern, move |_| label.to_string())
    }

    /// Panics on an invalid pattern; rules are built from literals.
    pub fn computed<F>(pattern: &str, label: F) -> Self
    where
        F: Fn(&Captures<'_>) -> String + Send + Sync + 'static,
    {
        Self {
            pattern: Regex::new(pattern).expect("detail regex"),
            label: Box::new(label),
        }
    }

    pub fn apply(&self, lower_text: &str) -> Option<String> {
        self.pattern.captures(lower_text).map(|caps| (self.label)(&caps))
    }
}

fn detail_rules() -> &'static [DetailRule] {
    static RULES: OnceLock<Vec<DetailRule>> = OnceLock::new();
    RULES.get_or_init(|| {
        vec![
            DetailRule::fixed(r"\balleged(?:ly)?\b", ALLEGED_DETAIL),
            DetailRule::computed(r"as per ([\w\s]+?) intel", |caps| {
                format!("tgt as per {} intel", caps[1].trim())
            }),
            DetailRule::fixed(r"(?:intense|heavy)\s*(?:exchange of\s*)?fire", "intense EoF"),
            DetailRule::fixed(
                r"search\s*(?:and clearance\s*)?op(?:eration)?s?\s*(?:is\s*)?(?:underway|conducted|launched)",
                "search op underway",
            ),
            DetailRule::fixed(r"area\s*(?:has been\s*)?(?:cordoned|sealed)", "area cordoned"),
            DetailRule::fixed(r"attackers?\s*(?:managed to\s*)?fled|fled the area", "attackers fled"),
            DetailRule::computed(
                r"\b(house|shop|school|building)s?\s*(?:was\s*|were\s*)?set\s*on\s*fire",
                |caps| format!("{} set on fire", &caps[1]),
            ),
            DetailRule::computed(
                r"abducted\s*(?:his\s*)?(\d+)\s*(?:nephews?|pers(?:ons)?|people|men)|\b(\d+)\s*(?:pers(?:ons)?|people|men)\s*(?:were\s*)?abducted",
                |caps| {
                    let n = caps.get(1).or_else(|| caps.get(2)).map_or("", |m| m.as_str());
                    format!("{} pers abducted", n)
                },
            ),
            DetailRule::fixed(r"hideout", HIDEOUT_DETAIL),
        ]
    })
}

pub fn extract_details(text: &str, analysis: &mut AnalysisRecord) {
    let lower = text.to_lowercase();
    for rule in detail_rules() {
        if let Some(label) = rule.apply(&lower) {
            analysis.details.insert(label);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn details(text: &str) -> Vec<String> {
        let mut analysis = AnalysisRecord::default();
        extract_details(text, &mut analysis);
        analysis.details.as_slice().to_vec()
    }

    #[test]
    fn test_rules_co_occur_in_rule_order() {
        let found = details("Heavy exchange of fire, attackers fled. Search op underway and area cordoned.");
        assert_eq!(
            found,
            vec!["intense EoF", "search op underway", "area cordoned", "attackers fled"]
        );
    }

    #[test]
    fn test_computed_labels() {
        assert_eq!(details("Raid as per TTP intel"), vec!["tgt as per ttp intel"]);
        assert_eq!(details("Gunmen abducted his 3 nephews"), vec!["3 pers abducted"]);
        assert_eq!(details("2 persons abducted"), vec!["2 pers abducted"]);
        assert_eq!(details("House set on fire"), vec!["house set on fire"]);
    }

    #[test]
    fn test_markers() {
        assert_eq!(details("Raid on alleged CTD hideout"), vec![ALLEGED_DETAIL, HIDEOUT_DETAIL]);
        assert!(details("Nothing notable").is_empty());
    }
}
