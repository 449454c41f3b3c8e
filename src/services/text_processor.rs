// Text Processing Service
// Normalizes pasted field reports before extraction

use regex::Regex;
use std::sync::OnceLock;

fn nbsp_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[\u{3000}\u{00A0}\u{202F}]").expect("nbsp regex"))
}

fn horizontal_ws_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[ \t\x0C\x0B]+").expect("whitespace regex"))
}

fn blank_line_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\n\s*\n").expect("blank line regex"))
}

/// Normalize punctuation and spacing in a raw report
pub fn normalize_input(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    let mut s = text.to_string();

    // Replace smart quotes
    s = s.replace('\u{201c}', "\"")
         .replace('\u{201d}', "\"")
         .replace('\u{2018}', "'")
         .replace('\u{2019}', "'");

    // Replace en/em dash
    s = s.replace('\u{2013}', "-").replace('\u{2014}', "-");

    s = nbsp_re().replace_all(&s, " ").to_string();

    // Normalize line endings
    s = s.replace("\r\n", "\n").replace('\r', "\n");

    s = horizontal_ws_re().replace_all(&s, " ").to_string();

    // Strip each line
    s = s.lines()
         .map(|ln| ln.trim())
         .collect::<Vec<_>>()
         .join("\n");

    s.trim().to_string()
}

/// Split pasted input holding several reports on blank lines
pub fn split_reports(text: &str) -> Vec<String> {
    if text.trim().is_empty() {
        return vec![];
    }

    let normalized = text.replace("\r\n", "\n").replace('\r', "\n");
    blank_line_re()
        .split(&normalized)
        .map(|para| para.trim())
        .filter(|para| !para.is_empty())
        .map(|para| para.to_string())
        .collect()
}
