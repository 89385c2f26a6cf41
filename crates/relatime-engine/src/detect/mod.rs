//! The detector battery.
//!
//! A detector is a plain function that is handed the word the driver just
//! consumed (and the byte offset it started at) and either recognizes a
//! phrase beginning there, appending exactly one match to the [`Scan`] and
//! returning `true`, or returns `false`. Detectors are grouped into
//! priority-ordered [`Rule`] tables, most specific first: see
//! [`absolute::RULES`] and [`relative::RULES`].
//!
//! Rules are always run through [`Rule::apply`], which puts the cursor back
//! where it was when a detector returns `false`, so a failed rule can never
//! leak a partial consumption into the next.

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, TimeDelta, Utc, Weekday};
use serde::Serialize;

use crate::consume::{consume_any, consume_time_of_day, TimeOfDay};
use crate::cursor::Cursor;
use crate::duration::{DurationUnit, Precision};
use crate::zone::{shift_days, Anchor};

pub mod absolute;
pub mod relative;

/// A recognized temporal expression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimeMatch {
    /// The recognized text, trimmed.
    pub span: String,
    /// Byte offset of `span` in the source.
    pub start: usize,
    /// Byte offset just past the end of `span`.
    pub end: usize,
    pub instant: DateTime<FixedOffset>,
    pub precision: Precision,
    /// The literal target did not exist and spilled into a neighbouring
    /// month or year ("5th Monday of February").
    pub approximated: bool,
    /// Computed as an offset from now rather than built from the calendar.
    pub relative: bool,
}

/// `(scan, word, start) -> matched?`
pub type Detector = fn(&mut Scan<'_>, &str, usize) -> bool;

/// A named detector.
#[derive(Clone, Copy)]
pub struct Rule {
    pub name: &'static str,
    pub detect: Detector,
}

impl Rule {
    /// Run the detector, putting the cursor back at its entry position when
    /// it does not match.
    pub fn apply(&self, scan: &mut Scan<'_>, word: &str, start: usize) -> bool {
        let entry = scan.cursor.position();
        let matched = (self.detect)(scan, word, start);
        if !matched {
            scan.cursor.seek(entry);
        }
        matched
    }
}

impl std::fmt::Debug for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rule").field("name", &self.name).finish()
    }
}

/// Per-parse state shared by all detectors: the cursor, the anchor and the
/// matches found so far.
#[derive(Debug)]
pub struct Scan<'a> {
    pub cursor: Cursor<'a>,
    anchor: Anchor,
    matches: Vec<TimeMatch>,
}

impl<'a> Scan<'a> {
    pub fn new(source: &'a str, anchor: Anchor) -> Self {
        Self {
            cursor: Cursor::new(source),
            anchor,
            matches: Vec::new(),
        }
    }

    pub fn anchor(&self) -> &Anchor {
        &self.anchor
    }

    pub fn matches(&self) -> &[TimeMatch] {
        &self.matches
    }

    pub fn into_matches(self) -> Vec<TimeMatch> {
        self.matches
    }

    /// Record a match spanning from `start` to the current position.
    pub fn emit(
        &mut self,
        start: usize,
        instant: DateTime<FixedOffset>,
        precision: Precision,
    ) -> &mut TimeMatch {
        let end = self.cursor.position();
        self.emit_between(start, end, instant, precision)
    }

    /// Record a match spanning `start..end`, with surrounding whitespace
    /// trimmed off.
    pub fn emit_between(
        &mut self,
        start: usize,
        end: usize,
        instant: DateTime<FixedOffset>,
        precision: Precision,
    ) -> &mut TimeMatch {
        let raw = self.cursor.slice(start, end);
        let leading = raw.len() - raw.trim_start().len();
        let span = raw.trim();
        let start = start + leading;
        self.matches.push(TimeMatch {
            span: span.to_string(),
            start,
            end: start + span.len(),
            instant,
            precision,
            approximated: false,
            relative: false,
        });
        let last = self.matches.len() - 1;
        &mut self.matches[last]
    }
}

// ── Shared resolution helpers ───────────────────────────────────────────────

/// Prepositions that may introduce a trailing time of day.
const TIME_PREPOSITIONS: &[&str] = &["at", "on", "around", "by"];

/// Consume `[at|on|around|by] <time of day>`, all or nothing.
pub(crate) fn consume_trailing_time(cursor: &mut Cursor<'_>) -> Option<TimeOfDay> {
    cursor.attempt(|cursor| {
        consume_any(cursor, TIME_PREPOSITIONS);
        consume_time_of_day(cursor)
    })
}

/// Local `date`, at `time` when given or else at the start of the day,
/// together with the precision that implies.
pub(crate) fn resolve_date(
    anchor: &Anchor,
    date: NaiveDate,
    time: Option<TimeOfDay>,
) -> Option<(DateTime<FixedOffset>, Precision)> {
    match time {
        Some(time) => Some((anchor.at_local(time.on(date)?)?, time.precision)),
        None => Some((anchor.start_of_day(date)?, DurationUnit::Day)),
    }
}

/// Next occurrence of `weekday` strictly after `today`, or with `forward`
/// unset the most recent one strictly before it.
pub(crate) fn relative_weekday(today: NaiveDate, weekday: Weekday, forward: bool) -> Option<NaiveDate> {
    let target = i64::from(weekday.num_days_from_sunday());
    let current = i64::from(today.weekday().num_days_from_sunday());
    if forward {
        let ahead = (target - current).rem_euclid(7);
        shift_days(today, if ahead == 0 { 7 } else { ahead })
    } else {
        let behind = (current - target).rem_euclid(7);
        shift_days(today, -(if behind == 0 { 7 } else { behind }))
    }
}

/// Offsets that specified minutes and land less than a quarter hour ahead of
/// now are shown to the second. Past instants keep their precision.
pub(crate) fn promote_precision(
    precision: Precision,
    instant: &DateTime<FixedOffset>,
    now: DateTime<Utc>,
) -> Precision {
    let ahead = instant.with_timezone(&Utc).signed_duration_since(now);
    if precision == DurationUnit::Minute
        && ahead > TimeDelta::zero()
        && ahead < TimeDelta::minutes(15)
    {
        DurationUnit::Second
    } else {
        precision
    }
}

/// Calendar constructions are never shown coarser than a day.
pub(crate) fn calendar_precision(unit: DurationUnit) -> Precision {
    unit.min(DurationUnit::Day)
}
