// Threat scoring
// Weighted action + target + casualty score, banded into a ThreatLevel

use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;

use crate::models::{AnalysisRecord, ThreatLevel};

const DEFAULT_ACTION_WEIGHT: i32 = 3;
const DEFAULT_TARGET_WEIGHT: i32 = 2;

fn casualty_weight_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(\d+)\s*x\s*.*\s*(sh|inj|Ts killed)").expect("casualty weight regex")
    })
}

/// Fixed per-category weights. Unknown actions/targets fall back to the defaults,
/// unknown casualty types weigh nothing.
#[derive(Debug, Clone)]
pub struct ThreatWeights {
    actions: HashMap<&'static str, i32>,
    targets: HashMap<&'static str, i32>,
    casualties: HashMap<&'static str, i32>,
}

impl Default for ThreatWeights {
    fn default() -> Self {
        Self {
            actions: HashMap::from([
                ("sb attk", 10),
                ("strike", 9),
                ("ambush", 8),
                ("blast", 7),
                ("fire raid", 6),
                ("raid", 5),
            ]),
            targets: HashMap::from([
                ("SFs cny", 8),
                ("SFs Post/CP", 7),
                ("LEAs", 6),
                ("Army", 7),
                ("SFs", 5),
            ]),
            casualties: HashMap::from([("sh", 5), ("inj", 2), ("Ts killed", -1)]),
        }
    }
}

impl ThreatWeights {
    pub fn standard() -> &'static ThreatWeights {
        static WEIGHTS: OnceLock<ThreatWeights> = OnceLock::new();
        WEIGHTS.get_or_init(ThreatWeights::default)
    }

    pub fn action_weight(&self, action: &str) -> i32 {
        self.actions.get(action).copied().unwrap_or(DEFAULT_ACTION_WEIGHT)
    }

    pub fn target_weight(&self, target: Option<&str>) -> i32 {
        target
            .and_then(|t| self.targets.get(t).copied())
            .unwrap_or(DEFAULT_TARGET_WEIGHT)
    }

    /// Count times the per-unit weight of the fragment's casualty type.
    pub fn casualty_weight(&self, fragment: &str) -> i32 {
        let Some(caps) = casualty_weight_re().captures(fragment) else {
            return 0;
        };
        // Counts beyond i32 clamp so a larger count never scores lower
        let count = caps[1]
            .parse::<u64>()
            .map_or(i32::MAX, |n| n.min(i32::MAX as u64) as i32);
        let unit = self.casualties.get(&caps[2]).copied().unwrap_or(0);
        unit.saturating_mul(count)
    }

    pub fn score(&self, analysis: &AnalysisRecord) -> i32 {
        let base = self.action_weight(&analysis.action) + self.target_weight(analysis.target.as_deref());
        analysis
            .casualties
            .iter()
            .fold(base, |acc, fragment| acc.saturating_add(self.casualty_weight(fragment)))
    }
}

pub fn threat_level(analysis: &AnalysisRecord) -> ThreatLevel {
    ThreatLevel::from_score(ThreatWeights::standard().score(analysis))
}
