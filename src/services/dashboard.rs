// Intelligence dashboard
// KPIs, short-term forecast and activity windows over the report log

use indexmap::IndexMap;

use crate::models::{ActivityWindows, DashboardKpis, ThreatBand, ThreatLevel, ValidatedReport};
use crate::services::threat::threat_level;

const HOUR_MS: i64 = 3_600_000;
const DAY_MS: i64 = 24 * HOUR_MS;
const FORECAST_WINDOW_DAYS: i64 = 7;
const FORECAST_MIN_REPORTS: usize = 3;
const NOT_AVAILABLE: &str = "N/A";
const LETHAL_MARKERS: [&str; 3] = ["sh", "killed", "martyred"];

pub const INSUFFICIENT_DATA_FORECAST: &str =
    "Insufficient recent data for reliable forecast. Need more reports from the last 7 days.";

fn mean_score(reports: &[&ValidatedReport]) -> f64 {
    if reports.is_empty() {
        return 0.0;
    }
    let total: i64 = reports.iter().map(|r| threat_level(&r.analysis).score as i64).sum();
    total as f64 / reports.len() as f64
}

fn most_active_group(reports: &[ValidatedReport]) -> Option<&str> {
    let mut counts: IndexMap<&str, usize> = IndexMap::new();
    for report in reports.iter().filter(|r| r.analysis.has_known_actor()) {
        *counts.entry(report.analysis.who.as_str()).or_insert(0) += 1;
    }
    let mut best: Option<(&str, usize)> = None;
    for (group, count) in counts {
        if best.map_or(true, |(_, top)| count > top) {
            best = Some((group, count));
        }
    }
    best.map(|(group, _)| group)
}

fn is_lethal(report: &ValidatedReport) -> bool {
    report
        .analysis
        .casualties
        .iter()
        .any(|c| LETHAL_MARKERS.iter().any(|m| c.contains(m)))
}

pub fn compute_kpis(reports: &[ValidatedReport]) -> DashboardKpis {
    if reports.is_empty() {
        return DashboardKpis {
            total_incidents: 0,
            avg_threat_level: NOT_AVAILABLE.to_string(),
            most_active_group: NOT_AVAILABLE.to_string(),
            lethal_attacks: 0,
        };
    }

    let all: Vec<&ValidatedReport> = reports.iter().collect();
    DashboardKpis {
        total_incidents: reports.len(),
        avg_threat_level: ThreatBand::from_score(mean_score(&all)).as_str().to_string(),
        most_active_group: most_active_group(reports).unwrap_or(NOT_AVAILABLE).to_string(),
        lethal_attacks: reports.iter().filter(|r| is_lethal(r)).count(),
    }
}

/// Outlook for the coming days from the last week of reports; `now_ms` in epoch milliseconds.
pub fn forecast(reports: &[ValidatedReport], now_ms: i64) -> String {
    let since = now_ms - FORECAST_WINDOW_DAYS * DAY_MS;
    let recent: Vec<&ValidatedReport> = reports.iter().filter(|r| r.timestamp >= since).collect();
    if recent.len() < FORECAST_MIN_REPORTS {
        return INSUFFICIENT_DATA_FORECAST.to_string();
    }

    let per_day = recent.len() as f64 / FORECAST_WINDOW_DAYS as f64;
    let avg = mean_score(&recent);
    let outlook = if avg < 10.0 {
        "threat levels remain relatively stable with low-to-medium risk activities expected."
    } else if avg < 18.0 {
        "moderate threat levels suggest continued militant activity with potential for escalation."
    } else {
        "high threat environment indicates elevated risk of significant incidents in the near term."
    };

    format!(
        "Based on {} incidents in the last 7 days ({:.1} per day), {}",
        recent.len(),
        per_day,
        outlook
    )
}

pub fn activity(reports: &[ValidatedReport], now_ms: i64) -> ActivityWindows {
    let within = |span: i64| reports.iter().filter(|r| r.timestamp >= now_ms - span).count();
    ActivityWindows {
        last_24h: within(DAY_MS),
        last_7d: within(7 * DAY_MS),
        last_30d: within(30 * DAY_MS),
    }
}

/// First `n` reports (the log is newest first) with their threat levels.
pub fn recent_incidents(reports: &[ValidatedReport], n: usize) -> Vec<(&ValidatedReport, ThreatLevel)> {
    reports
        .iter()
        .take(n)
        .map(|r| (r, threat_level(&r.analysis)))
        .collect()
}
