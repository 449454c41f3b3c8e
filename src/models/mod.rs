// Sitrep Data Models
// Shared record types for the conversion engine, scorer, suggestions and report log

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashSet;

/// Actor sentinel used when no group can be attributed.
pub const UNKNOWN_ACTOR: &str = "Unknown Ts";
/// Action category assigned when no keyword matches.
pub const BASELINE_ACTION: &str = "raid";
/// Action category assigned to claimed incidents with no other action keyword.
pub const CLAIMED_ACTION: &str = "claimed attk";

// ============ Fragment Set ============

/// Insertion-ordered set of pre-formatted fragments.
///
/// Duplicates are rejected, display order is the order fragments were added.
#[derive(Debug, Clone, Default)]
pub struct FragmentSet {
    items: Vec<String>,
    index: HashSet<String>,
}

impl FragmentSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a fragment. Returns false if it was already present.
    pub fn insert(&mut self, fragment: impl Into<String>) -> bool {
        let fragment = fragment.into();
        if self.index.contains(&fragment) {
            return false;
        }
        self.index.insert(fragment.clone());
        self.items.push(fragment);
        true
    }

    pub fn contains(&self, fragment: &str) -> bool {
        self.index.contains(fragment)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.items
    }
}

impl PartialEq for FragmentSet {
    fn eq(&self, other: &Self) -> bool {
        self.items == other.items
    }
}

impl Eq for FragmentSet {}

impl<S: Into<String>> FromIterator<S> for FragmentSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = FragmentSet::new();
        for item in iter {
            set.insert(item);
        }
        set
    }
}

impl<'a> IntoIterator for &'a FragmentSet {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl Serialize for FragmentSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(&self.items)
    }
}

impl<'de> Deserialize<'de> for FragmentSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let items = Vec::<String>::deserialize(deserializer)?;
        Ok(items.into_iter().collect())
    }
}

// ============ Analysis Record ============

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRecord {
    pub who: String,
    pub action: String,
    #[serde(default)]
    pub target: Option<String>,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub casualties: FragmentSet,
    #[serde(default)]
    pub details: FragmentSet,
    #[serde(default)]
    pub source: String,
    /// Analyst annotation, never filled by extraction.
    #[serde(default)]
    pub notes: String,
}

impl Default for AnalysisRecord {
    fn default() -> Self {
        Self {
            who: UNKNOWN_ACTOR.to_string(),
            action: BASELINE_ACTION.to_string(),
            target: None,
            location: String::new(),
            casualties: FragmentSet::new(),
            details: FragmentSet::new(),
            source: String::new(),
            notes: String::new(),
        }
    }
}

impl AnalysisRecord {
    pub fn has_known_actor(&self) -> bool {
        !self.who.is_empty() && self.who != UNKNOWN_ACTOR
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionResult {
    pub report: String,
    pub analysis: AnalysisRecord,
}

impl ConversionResult {
    pub fn empty() -> Self {
        Self {
            report: String::new(),
            analysis: AnalysisRecord::default(),
        }
    }
}

// ============ Validated Report ============

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidatedReport {
    /// Milliseconds since the Unix epoch; also the report's identity in the store.
    pub timestamp: i64,
    pub raw_input: String,
    pub output: String,
    pub analysis: AnalysisRecord,
}

// ============ Location Codes ============

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationCode {
    pub code: String,
    pub lat: f64,
    pub lon: f64,
}

impl LocationCode {
    pub fn new(code: &str, lat: f64, lon: f64) -> Self {
        Self {
            code: code.to_string(),
            lat,
            lon,
        }
    }
}

// ============ Threat Level ============

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub enum ThreatBand {
    Low,
    Medium,
    High,
    Severe,
}

impl ThreatBand {
    pub fn from_score(score: f64) -> Self {
        if score < 8.0 {
            Self::Low
        } else if score < 15.0 {
            Self::Medium
        } else if score < 25.0 {
            Self::High
        } else {
            Self::Severe
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
            Self::Severe => "Severe",
        }
    }

    /// Display width as a percentage of a full gauge.
    pub fn width_percent(self) -> u8 {
        match self {
            Self::Low => 25,
            Self::Medium => 50,
            Self::High => 75,
            Self::Severe => 100,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreatLevel {
    pub level: ThreatBand,
    pub score: i32,
    pub width_percent: u8,
}

impl ThreatLevel {
    pub fn from_score(score: i32) -> Self {
        let level = ThreatBand::from_score(score as f64);
        Self {
            level,
            score,
            width_percent: level.width_percent(),
        }
    }

    pub fn width(&self) -> String {
        format!("{}%", self.width_percent)
    }
}

// ============ Smart Suggestions ============

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SuggestionAction {
    SetField,
    FocusField,
    HighlightPattern,
}

/// Analysis field a suggestion points at.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AnalysisField {
    Who,
    Action,
    Target,
    Location,
    Casualties,
    Details,
    Source,
    Notes,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SmartSuggestion {
    /// May contain `<strong>` emphasis around the highlighted value.
    pub text: String,
    pub action: SuggestionAction,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<AnalysisField>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

// ============ Notices & Log Events ============

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Success,
    Failure,
}

/// User-visible outcome of a collaborator call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notice {
    pub level: NoticeLevel,
    pub title: String,
    pub description: String,
}

impl Notice {
    pub fn success(title: &str, description: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            title: title.to_string(),
            description: description.into(),
        }
    }

    pub fn failure(title: &str, description: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Failure,
            title: title.to_string(),
            description: description.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.level == NoticeLevel::Success
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogEvent {
    Saved(i64),
    Deleted(i64),
}

// ============ Dashboard ============

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardKpis {
    pub total_incidents: usize,
    /// Band name, or `N/A` for an empty log.
    pub avg_threat_level: String,
    pub most_active_group: String,
    pub lethal_attacks: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityWindows {
    pub last_24h: usize,
    pub last_7d: usize,
    pub last_30d: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fragment_set_keeps_order_and_rejects_duplicates() {
        let mut set = FragmentSet::new();
        assert!(set.insert("2 x sldrs sh"));
        assert!(set.insert("1 x sldrs inj"));
        assert!(!set.insert("2 x sldrs sh"));
        assert_eq!(set.as_slice(), &["2 x sldrs sh", "1 x sldrs inj"]);
    }

    #[test]
    fn test_fragment_set_serializes_as_array() {
        let set: FragmentSet = ["b", "a", "b"].into_iter().collect();
        let json = serde_json::to_string(&set).unwrap();
        assert_eq!(json, r#"["b","a"]"#);
        let parsed: FragmentSet = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, set);
    }

    #[test]
    fn test_default_analysis() {
        let analysis = AnalysisRecord::default();
        assert_eq!(analysis.who, UNKNOWN_ACTOR);
        assert_eq!(analysis.action, BASELINE_ACTION);
        assert!(analysis.target.is_none());
        assert!(!analysis.has_known_actor());
    }

    #[test]
    fn test_band_thresholds() {
        assert_eq!(ThreatLevel::from_score(7).level, ThreatBand::Low);
        assert_eq!(ThreatLevel::from_score(8).level, ThreatBand::Medium);
        assert_eq!(ThreatLevel::from_score(14).level, ThreatBand::Medium);
        assert_eq!(ThreatLevel::from_score(15).level, ThreatBand::High);
        assert_eq!(ThreatLevel::from_score(24).level, ThreatBand::High);
        assert_eq!(ThreatLevel::from_score(25).level, ThreatBand::Severe);
        assert_eq!(ThreatLevel::from_score(25).width(), "100%");
    }
}
