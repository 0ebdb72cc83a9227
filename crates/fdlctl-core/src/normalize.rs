//! Display-side log normalization.
//!
//! Raw pipeline output arrives as possibly multi-line, possibly
//! color-coded chunks. The normalizer turns each chunk into typed,
//! timestamped display lines: escape codes stripped, embedded
//! `[TAG]` markers reconciled against the record's declared kind,
//! one `NormalizedLine` per non-blank input line.
//!
//! This is pure string work - no clock access beyond the injected
//! timestamp, no I/O - so it is testable in isolation.

use std::sync::LazyLock;

use chrono::NaiveTime;
use regex::Regex;
use serde::Serialize;

use crate::record::LogKind;

/// ANSI CSI escape sequences (colors, cursor movement).
static ANSI_ESCAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\x1b\[[0-9;]*[A-Za-z]").expect("pattern compiles"));

/// Leading bracketed uppercase tag, e.g. `[CONFIG] `.
static LEADING_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\[([A-Z]+)\]\s*").expect("pattern compiles"));

/// One normalized, display-ready log line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NormalizedLine {
    /// Formatted text: `HH:MM:SS [CATEGORY] payload` (the bracket tag
    /// is omitted for plain `output` lines).
    pub text: String,
    /// Category after tag reconciliation.
    pub category: LogKind,
    /// 1-based position in the normalized stream.
    pub sequence: u64,
}

/// Stateful line normalizer. The only state is the running sequence
/// counter; everything else is a pure function of the inputs.
#[derive(Debug, Default)]
pub struct Normalizer {
    next_sequence: u64,
}

impl Normalizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalize a raw chunk using the current local time.
    pub fn normalize(&mut self, raw: &str, declared: LogKind) -> Vec<NormalizedLine> {
        self.normalize_at(raw, declared, chrono::Local::now().time())
    }

    /// Normalize a raw chunk with an explicit timestamp.
    pub fn normalize_at(
        &mut self,
        raw: &str,
        declared: LogKind,
        stamp: NaiveTime,
    ) -> Vec<NormalizedLine> {
        let mut lines = Vec::new();
        for line in raw.lines() {
            let stripped = ANSI_ESCAPE.replace_all(line, "");
            let stripped = stripped.trim();
            if stripped.is_empty() {
                continue;
            }

            // An embedded tag wins over the declared kind.
            let (category, payload) = match LEADING_TAG.captures(stripped) {
                Some(caps) => {
                    let tag = caps.get(1).map_or("", |m| m.as_str());
                    let rest = &stripped[caps.get(0).map_or(0, |m| m.end())..];
                    (category_for_tag(tag), rest)
                }
                None => (declared, stripped),
            };

            let stamp = stamp.format("%H:%M:%S");
            let text = if category == LogKind::Output {
                format!("{stamp} {payload}")
            } else {
                format!("{stamp} [{}] {payload}", category.label())
            };

            self.next_sequence += 1;
            lines.push(NormalizedLine {
                text,
                category,
                sequence: self.next_sequence,
            });
        }
        lines
    }
}

/// Fixed tag-to-category table. Unknown tags fall back to `Info`.
fn category_for_tag(tag: &str) -> LogKind {
    match tag {
        "EXECUTE" => LogKind::Execute,
        "SETUP" | "SUCCESS" => LogKind::Setup,
        "CONFIG" | "PROGRESS" | "INFO" => LogKind::Info,
        "ERROR" | "WARNING" => LogKind::Error,
        _ => LogKind::Info,
    }
}
