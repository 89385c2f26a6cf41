//! Turning matches into reply text.
//!
//! The chat platform renders `<t:EPOCH:FLAG>` markup in each reader's own
//! timezone, so the [`Style::Discord`] output only needs the epoch and a
//! style flag chosen from the match precision. [`Style::Plain`] renders the
//! same information as text in the anchor's timezone, for terminals.

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::detect::TimeMatch;
use crate::duration::{DurationUnit, Precision};

/// How reply lines are written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Style {
    /// `<t:EPOCH:FLAG>` timestamp markup.
    #[default]
    Discord,
    /// Formatted local times and "in 2 hours" hints.
    Plain,
}

impl FromStr for Style {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "discord" | "markup" => Ok(Style::Discord),
            "plain" | "text" => Ok(Style::Plain),
            _ => Err(format!("unknown style '{s}' (expected discord or plain)")),
        }
    }
}

impl fmt::Display for Style {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Style::Discord => f.write_str("discord"),
            Style::Plain => f.write_str("plain"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderOptions {
    pub style: Style,
    /// Append the raw `<t:EPOCH:f>` markup in backticks so it can be copied.
    pub include_code: bool,
}

/// Timestamp style flags for a precision; one timestamp is written per flag.
pub fn timestamp_flags(precision: Precision) -> &'static str {
    match precision {
        DurationUnit::Second => "DT",
        DurationUnit::Minute | DurationUnit::Hour => "f",
        DurationUnit::Day | DurationUnit::Week | DurationUnit::Month | DurationUnit::Year => "D",
    }
}

/// `<t:EPOCH:FLAG>`
pub fn markup(instant: &DateTime<FixedOffset>, flag: char) -> String {
    format!("<t:{}:{}>", instant.timestamp(), flag)
}

fn plain_stamp(instant: &DateTime<FixedOffset>, flag: char, now: DateTime<Utc>) -> String {
    match flag {
        'D' => instant.format("%B %-d, %Y").to_string(),
        'T' => instant.format("%-I:%M:%S %p").to_string(),
        'R' => humanize(now, instant),
        _ => instant.format("%B %-d, %Y %-I:%M %p").to_string(),
    }
}

/// One reply line: `span → stamps (notes)`.
pub fn render_match(found: &TimeMatch, now: DateTime<Utc>, options: RenderOptions) -> String {
    let stamp = |flag| match options.style {
        Style::Discord => markup(&found.instant, flag),
        Style::Plain => plain_stamp(&found.instant, flag, now),
    };

    let stamps: Vec<String> = timestamp_flags(found.precision).chars().map(&stamp).collect();

    let mut notes = Vec::new();
    if found.approximated {
        notes.push("approximated".to_string());
    }
    if !found.relative {
        notes.push(stamp('R'));
    }
    if options.include_code {
        notes.push(format!("`{}`", markup(&found.instant, 'f')));
    }

    let mut line = format!("{} \u{2192} {}", found.span, stamps.join(", "));
    if !notes.is_empty() {
        line.push_str(&format!(" ({})", notes.join("; ")));
    }
    line
}

/// The full reply for a message, or `None` when nothing was found.
pub fn render_reply(
    matches: &[TimeMatch],
    now: DateTime<Utc>,
    options: RenderOptions,
) -> Option<String> {
    if matches.is_empty() {
        return None;
    }
    let lines: Vec<String> = matches
        .iter()
        .map(|found| render_match(found, now, options))
        .collect();
    Some(lines.join("\n"))
}

// ── Humanized durations ─────────────────────────────────────────────────────

/// The distance between two instants, decomposed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DurationInfo {
    /// Total duration in seconds (negative if `to` is before `from`).
    pub total_seconds: i64,
    pub days: i64,
    /// Hours component (0-23).
    pub hours: i64,
    /// Minutes component (0-59).
    pub minutes: i64,
    /// Seconds component (0-59).
    pub seconds: i64,
}

impl DurationInfo {
    pub fn between(from: DateTime<Utc>, to: &DateTime<FixedOffset>) -> Self {
        let total_seconds = to.with_timezone(&Utc).signed_duration_since(from).num_seconds();
        let abs_seconds = total_seconds.unsigned_abs();

        let days = (abs_seconds / 86400) as i64;
        let remainder = abs_seconds % 86400;
        let hours = (remainder / 3600) as i64;
        let remainder = remainder % 3600;
        let minutes = (remainder / 60) as i64;
        let seconds = (remainder % 60) as i64;

        Self {
            total_seconds,
            days,
            hours,
            minutes,
            seconds,
        }
    }

    /// "2 days, 3 hours, 15 minutes"
    pub fn human_readable(&self) -> String {
        let mut parts = Vec::new();
        for (quantity, unit) in [
            (self.days, "day"),
            (self.hours, "hour"),
            (self.minutes, "minute"),
        ] {
            if quantity > 0 {
                parts.push(plural(quantity, unit));
            }
        }
        if self.seconds > 0 || parts.is_empty() {
            parts.push(plural(self.seconds, "second"));
        }
        parts.join(", ")
    }
}

fn plural(quantity: i64, unit: &str) -> String {
    format!("{} {}{}", quantity, unit, if quantity == 1 { "" } else { "s" })
}

/// "in 2 hours, 5 minutes", "3 days ago" or "now".
pub fn humanize(now: DateTime<Utc>, instant: &DateTime<FixedOffset>) -> String {
    let info = DurationInfo::between(now, instant);
    match info.total_seconds {
        0 => "now".to_string(),
        t if t > 0 => format!("in {}", info.human_readable()),
        _ => format!("{} ago", info.human_readable()),
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────
