// Casualty extraction
// Equipment and personnel counts, summed per category before formatting

use indexmap::IndexMap;
use regex::{Captures, Regex};
use std::sync::OnceLock;
use tracing::debug;

use crate::models::AnalysisRecord;

const KILLED_WORDS: &str = r"sh|killed|dead|martyred|shaheed";
const INJURED_WORDS: &str = r"inj|injured|wounded";
const OPPOSING_KILLED_WORDS: &str = r"sh|killed|dead|neutrali[sz]ed";

/// Personnel role rule. `explicit` is the role token regex, `label` the fragment category.
struct RoleRule {
    explicit: &'static str,
    label: &'static str,
    killed_label: &'static str,
    killed_words: &'static str,
    /// Count alone ("3 sh") is accepted and the role inferred from the target.
    role_optional: bool,
}

static ROLE_RULES: [RoleRule; 7] = [
    RoleRule {
        explicit: r"sfs?|sldrs?|soldiers?|sf\s*pers|security\s*forces?",
        label: "sldrs",
        killed_label: "sh",
        killed_words: KILLED_WORDS,
        role_optional: true,
    },
    RoleRule {
        explicit: r"pcs?|police\s*constables?|constables?",
        label: "PC",
        killed_label: "sh",
        killed_words: KILLED_WORDS,
        role_optional: false,
    },
    RoleRule {
        explicit: r"asi|assistant\s*sub[\s-]*inspector",
        label: "ASI",
        killed_label: "sh",
        killed_words: KILLED_WORDS,
        role_optional: false,
    },
    RoleRule {
        explicit: r"fc\s*pers|fc",
        label: "FC pers",
        killed_label: "sh",
        killed_words: KILLED_WORDS,
        role_optional: false,
    },
    RoleRule {
        explicit: r"ctd\s*pers|ctd",
        label: "CTD pers",
        killed_label: "sh",
        killed_words: KILLED_WORDS,
        role_optional: false,
    },
    RoleRule {
        explicit: r"leas?\s*pers|police\s*pers|policemen|policeman",
        label: "LEAs pers",
        killed_label: "sh",
        killed_words: KILLED_WORDS,
        role_optional: false,
    },
    RoleRule {
        explicit: r"ts?|ks?|terrorists?|militants?",
        label: "Ts",
        killed_label: "killed",
        killed_words: OPPOSING_KILLED_WORDS,
        role_optional: false,
    },
];

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
enum Outcome {
    Killed,
    Injured,
}

struct PersonnelPattern {
    re: Regex,
    rule: &'static RoleRule,
    outcome: Outcome,
}

fn personnel_patterns() -> &'static [PersonnelPattern] {
    static PATTERNS: OnceLock<Vec<PersonnelPattern>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        let mut patterns = Vec::new();
        for rule in ROLE_RULES.iter() {
            for outcome in [Outcome::Killed, Outcome::Injured] {
                let words = match outcome {
                    Outcome::Killed => rule.killed_words,
                    Outcome::Injured => INJURED_WORDS,
                };
                let role = if rule.role_optional {
                    format!(r"(?:({})\s*)?", rule.explicit)
                } else {
                    format!(r"({})\s*", rule.explicit)
                };
                let pattern = format!(r"\b(\d+)\s*x?\s*{}(?:{})\b", role, words);
                patterns.push(PersonnelPattern {
                    re: Regex::new(&pattern).expect("personnel casualty regex"),
                    rule,
                    outcome,
                });
            }
        }
        patterns
    })
}

enum EquipmentLabel {
    Counted(&'static str),
    Fixed(&'static str),
}

fn equipment_patterns() -> &'static [(Regex, EquipmentLabel)] {
    static PATTERNS: OnceLock<Vec<(Regex, EquipmentLabel)>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        vec![
            (
                Regex::new(r"\b(\d+)\s*x?\s*veh(?:icle)?s?\s*destr(?:oyed)?").expect("vehicle destroyed regex"),
                EquipmentLabel::Counted("vehs destr"),
            ),
            (
                Regex::new(r"\b(\d+)\s*x?\s*(?:truck|vehicle|veh)s?\s*seized").expect("vehicle seized regex"),
                EquipmentLabel::Counted("veh seized"),
            ),
            (
                Regex::new(r"qpt\s*destr").expect("equipment cache regex"),
                EquipmentLabel::Fixed("A/QC destr and seized"),
            ),
            (
                Regex::new(r"\b(?:wpns?|weapons?)\s*(?:were\s*)?seized").expect("weapons seized regex"),
                EquipmentLabel::Fixed("W&A seized"),
            ),
        ]
    })
}

fn exaggerated_claim_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"exaggerated claims?\s+of\s+(\d+)\s*x?\s*sldrs?\s+sh,?\s*(\d+)\s*x?\s*inj")
            .expect("exaggerated claim regex")
    })
}

/// Role for a bare count ("3 sh"), taken from the already extracted target.
fn infer_role(target: Option<&str>) -> &'static str {
    match target {
        Some(t) if t.contains("LEAs") || t.contains("police") => "LEAs pers",
        Some(t) if t.contains("FC") => "FC pers",
        Some(t) if t.contains("CTD") => "CTD pers",
        Some("PC") => "PC",
        Some("ASI") => "ASI",
        _ => "sldrs",
    }
}

/// Counts too large for `u32` clamp to `u32::MAX`.
fn count(caps: &Captures<'_>) -> Option<u32> {
    caps.get(1).map(|m| {
        m.as_str()
            .parse::<u64>()
            .map_or(u32::MAX, |n| n.min(u32::MAX as u64) as u32)
    })
}

/// Category -> summed count; `None` for uncounted equipment flags.
type Tally = IndexMap<String, Option<u32>>;

fn add(tally: &mut Tally, key: String, quantity: Option<u32>) {
    let entry = tally.entry(key).or_insert(None);
    *entry = match (*entry, quantity) {
        (Some(a), Some(b)) => Some(a.saturating_add(b)),
        (None, q) | (q, None) => q,
    };
}

fn personnel_key(pattern: &PersonnelPattern, caps: &Captures<'_>, target: Option<&str>) -> String {
    let role = match caps.get(2) {
        Some(_) => pattern.rule.label,
        None => infer_role(target),
    };
    let outcome = match pattern.outcome {
        Outcome::Killed => pattern.rule.killed_label,
        Outcome::Injured => "inj",
    };
    format!("{} {}", role, outcome)
}

fn generic_casualty_fragment(lower: &str) -> Option<&'static str> {
    if ["cas reported", "cas rptd", "casualties reported"].iter().any(|p| lower.contains(p)) {
        Some("multiple cas reported")
    } else if ["poss cas", "possible casualties"].iter().any(|p| lower.contains(p)) {
        Some("multiple cas likely")
    } else if lower.contains("additional cas") {
        Some("additional cas likely")
    } else {
        None
    }
}

/// Runs on the full original text, since counts may precede the source handle.
pub fn extract_casualties(text: &str, analysis: &mut AnalysisRecord) {
    let lower = text.to_lowercase();

    if let Some(caps) = exaggerated_claim_re().captures(&lower) {
        analysis
            .casualties
            .insert(format!("claims killing of {} sldrs, {} inj", &caps[1], &caps[2]));
        return;
    }

    let mut tally = Tally::new();

    for (re, label) in equipment_patterns() {
        for caps in re.captures_iter(&lower) {
            match label {
                EquipmentLabel::Counted(key) => {
                    if let Some(n) = count(&caps) {
                        add(&mut tally, key.to_string(), Some(n));
                    }
                }
                EquipmentLabel::Fixed(key) => add(&mut tally, key.to_string(), None),
            }
        }
    }

    let target = analysis.target.as_deref();
    for pattern in personnel_patterns() {
        for caps in pattern.re.captures_iter(&lower) {
            let Some(n) = count(&caps) else { continue };
            add(&mut tally, personnel_key(pattern, &caps, target), Some(n));
        }
    }

    if tally.is_empty() {
        if let Some(fragment) = generic_casualty_fragment(&lower) {
            analysis.casualties.insert(fragment);
        }
        return;
    }

    debug!(categories = tally.len(), "extract.casualties");
    for (key, quantity) in tally {
        match quantity {
            Some(n) => analysis.casualties.insert(format!("{} x {}", n, key)),
            None => analysis.casualties.insert(key),
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn casualties(text: &str, target: Option<&str>) -> Vec<String> {
        let mut analysis = AnalysisRecord::default();
        analysis.target = target.map(|t| t.to_string());
        extract_casualties(text, &mut analysis);
        analysis.casualties.as_slice().to_vec()
    }

    #[test]
    fn test_explicit_and_inferred_soldiers() {
        let found = casualties("TTP ambushed cny near Miran Shah, NWD. 2 sldrs sh, 1 inj. @TTP", Some("SFs cny"));
        assert_eq!(found, vec!["2 x sldrs sh", "1 x sldrs inj"]);
    }

    #[test]
    fn test_role_inferred_from_target() {
        assert_eq!(casualties("2 sh, 3 inj", Some("LEAs")), vec!["2 x LEAs pers sh", "3 x LEAs pers inj"]);
        assert_eq!(casualties("1 martyred", Some("FC")), vec!["1 x FC pers sh"]);
        assert_eq!(casualties("1 martyred", Some("PC")), vec!["1 x PC sh"]);
        assert_eq!(casualties("1 martyred", None), vec!["1 x sldrs sh"]);
    }

    #[test]
    fn test_counts_accumulate() {
        assert_eq!(casualties("2 x sldrs sh and later 3 sldrs killed", None), vec!["5 x sldrs sh"]);
    }

    #[test]
    fn test_bare_count_is_not_double_counted() {
        assert_eq!(casualties("3 sh", Some("CTD")), vec!["3 x CTD pers sh"]);
    }

    #[test]
    fn test_specific_roles() {
        let found = casualties("2 x pc sh, 1 asi inj, 4 x Ts killed, 1 x t inj", None);
        assert_eq!(found, vec!["2 x PC sh", "1 x ASI inj", "4 x Ts killed", "1 x Ts inj"]);
    }

    #[test]
    fn test_exaggerated_claims_short_circuit() {
        let found = casualties("TTP made exaggerated claims of 5 sldrs sh, 2 inj; 1 sldr inj", None);
        assert_eq!(found, vec!["claims killing of 5 sldrs, 2 inj"]);
    }

    #[test]
    fn test_equipment() {
        let found = casualties("2 veh destroyed, 1 vehicle destr, wpns seized, qpt destr", None);
        assert_eq!(found, vec!["3 x vehs destr", "A/QC destr and seized", "W&A seized"]);
    }

    #[test]
    fn test_generic_phrases_only_when_empty() {
        assert_eq!(casualties("Cas reported", None), vec!["multiple cas reported"]);
        assert_eq!(casualties("poss cas", None), vec!["multiple cas likely"]);
        assert_eq!(casualties("additional cas feared", None), vec!["additional cas likely"]);
        assert_eq!(casualties("1 sh, additional cas feared", None), vec!["1 x sldrs sh"]);
    }

    #[test]
    fn test_oversized_count_clamps() {
        assert_eq!(casualties("5000000000 sldrs sh", None), vec!["4294967295 x sldrs sh"]);
        assert_eq!(casualties("4294967295 sh, 1 sh", None), vec!["4294967295 x sldrs sh"]);
    }

    #[test]
    fn test_words_containing_outcome_are_ignored() {
        assert!(casualties("2 shops burnt", None).is_empty());
    }
}
