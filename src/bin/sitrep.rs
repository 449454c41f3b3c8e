use std::io::Read;
use std::path::PathBuf;

use anyhow::{bail, Context};
use serde::Serialize;
use sitrep_lib::models::{ConversionResult, SmartSuggestion, ThreatLevel, ValidatedReport};
use sitrep_lib::services::{
    activity, compute_kpis, forecast, recent_incidents, ConfigStore, JsonReportStore, ReportConverter, ReportLog,
};

const USAGE: &str = "Usage:
  sitrep <report.txt|-> [--config-dir <dir>] [--data-dir <dir>] [--notes <text>] [--save] [--out <json_path>]
  sitrep --dashboard [--data-dir <dir>]
  sitrep --export-config <json_path> [--config-dir <dir>]
  sitrep --import-config <json_path> [--config-dir <dir>]
  sitrep --reset-config [--config-dir <dir>]

Notes:
  - Reports separated by blank lines are converted one by one.
  - `-` reads the report text from stdin.
  - SITREP_CONFIG_DIR / SITREP_DATA_DIR override the default directories.";

fn parse_arg_value(args: &[String], key: &str) -> Option<String> {
    args.iter()
        .position(|a| a == key)
        .and_then(|i| args.get(i + 1))
        .cloned()
}

fn has_flag(args: &[String], key: &str) -> bool {
    args.iter().any(|a| a == key)
}

fn read_input(path: &str) -> anyhow::Result<String> {
    if path == "-" {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("read stdin failed")?;
        return Ok(text);
    }
    std::fs::read_to_string(path).with_context(|| format!("read file failed: {}", path))
}

fn config_store(args: &[String]) -> anyhow::Result<ConfigStore> {
    let dir = parse_arg_value(args, "--config-dir")
        .map(PathBuf::from)
        .or_else(ConfigStore::default_config_dir)
        .context("no config directory available; pass --config-dir")?;
    Ok(ConfigStore::new(dir))
}

fn report_log(args: &[String]) -> anyhow::Result<ReportLog<JsonReportStore>> {
    let dir = parse_arg_value(args, "--data-dir")
        .map(PathBuf::from)
        .or_else(JsonReportStore::default_data_dir)
        .context("no data directory available; pass --data-dir")?;
    Ok(ReportLog::new(JsonReportStore::new(dir)))
}

fn run_dashboard(args: &[String]) -> anyhow::Result<()> {
    let mut log = report_log(args)?;
    let notice = log.refresh();
    if !notice.is_success() {
        bail!("{}: {}", notice.title, notice.description);
    }

    let now = chrono::Utc::now().timestamp_millis();
    let reports = log.reports();
    let kpis = compute_kpis(reports);
    let windows = activity(reports, now);

    println!("Total incidents: {}", kpis.total_incidents);
    println!("Average threat: {}", kpis.avg_threat_level);
    println!("Most active group: {}", kpis.most_active_group);
    println!("Lethal attacks: {}", kpis.lethal_attacks);
    println!(
        "Activity: 24h={} 7d={} 30d={}",
        windows.last_24h, windows.last_7d, windows.last_30d
    );
    println!();
    println!("Forecast: {}", forecast(reports, now));
    println!();
    for (report, threat) in recent_incidents(reports, 5) {
        println!("[{:<6} {:>3}] {}", threat.level.as_str(), threat.score, report.output);
    }
    Ok(())
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ConvertedReport {
    raw_input: String,
    result: ConversionResult,
    threat: ThreatLevel,
    suggestions: Vec<SmartSuggestion>,
}

fn run_convert(args: &[String], input_path: &str) -> anyhow::Result<()> {
    let store = config_store(args)?;
    let converter = ReportConverter::load(&store);
    let notes = parse_arg_value(args, "--notes");
    let save = has_flag(args, "--save");
    let out_path = parse_arg_value(args, "--out");

    let mut log = report_log(args)?;
    let notice = log.refresh();
    if !notice.is_success() {
        eprintln!("{}: {}", notice.title, notice.description);
    }

    let text = read_input(input_path)?;
    let raw_reports = sitrep_lib::services::split_reports(&text);
    if raw_reports.is_empty() {
        bail!("Input Required: please provide raw report data to convert");
    }

    let now = chrono::Utc::now().timestamp_millis();
    let mut converted = Vec::new();
    for (i, raw) in raw_reports.iter().enumerate() {
        let mut result = converter.convert(raw);
        if let Some(notes) = &notes {
            result.analysis.notes = notes.clone();
            result.report = converter.rebuild(&result.analysis);
        }
        let threat = converter.threat_level(&result.analysis);
        let suggestions = converter.suggestions_at(&result.analysis, log.reports(), raw, now);

        println!("{}", result.report);
        println!("  Threat: {} ({}) {}", threat.level.as_str(), threat.score, threat.width());
        for s in &suggestions {
            println!("  Hint: {}", s.text.replace("<strong>", "").replace("</strong>", ""));
        }

        if save {
            let notice = log.save(ValidatedReport {
                timestamp: now + i as i64,
                raw_input: raw.clone(),
                output: result.report.clone(),
                analysis: result.analysis.clone(),
            });
            println!("  {}: {}", notice.title, notice.description);
        }

        converted.push(ConvertedReport {
            raw_input: raw.clone(),
            result,
            threat,
            suggestions,
        });
    }

    if let Some(out_path) = out_path {
        let json = serde_json::to_string_pretty(&converted)?;
        std::fs::write(&out_path, json).with_context(|| format!("write out failed: {}", out_path))?;
        println!();
        println!("Wrote JSON: {}", out_path);
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        eprintln!("{}", USAGE);
        return Ok(());
    }

    sitrep_lib::init_logging();

    if has_flag(&args, "--reset-config") {
        let store = config_store(&args)?;
        let mut converter = ReportConverter::load(&store);
        converter.tables_mut().reset_to_defaults(&store)?;
        println!("Configuration reset to defaults: {}", store.config_file().display());
        return Ok(());
    }

    if let Some(path) = parse_arg_value(&args, "--import-config") {
        let store = config_store(&args)?;
        let mut converter = ReportConverter::load(&store);
        let json = std::fs::read_to_string(&path).with_context(|| format!("read file failed: {}", path))?;
        converter.tables_mut().import_json(&json)?;
        converter.tables().save(&store)?;
        println!("Imported configuration from {}", path);
        return Ok(());
    }

    if let Some(path) = parse_arg_value(&args, "--export-config") {
        let store = config_store(&args)?;
        let converter = ReportConverter::load(&store);
        let json = serde_json::to_string_pretty(&converter.tables().export_configuration())?;
        std::fs::write(&path, json).with_context(|| format!("write out failed: {}", path))?;
        println!("Exported configuration to {}", path);
        return Ok(());
    }

    if has_flag(&args, "--dashboard") {
        return run_dashboard(&args);
    }

    let input_path = args[1].as_str();
    if input_path.starts_with("--") {
        eprintln!("{}", USAGE);
        bail!("missing report input");
    }
    run_convert(&args, input_path)
}
