//! Offsets from now: "in 2 hours", "5 minutes ago", "1h30m", "next week",
//! and the "match in 15, invites in 10" shorthand.

use chrono::{DateTime, FixedOffset};

use super::absolute::relative_weekday_phrase;
use super::{promote_precision, Rule, Scan};
use crate::consume::{consume_any, is_any};
use crate::cursor::Cursor;
use crate::duration::{
    parse_compact_duration, parse_duration_chain, CompoundDuration, DurationUnit,
};

/// Relative detectors, most specific first.
pub const RULES: &[Rule] = &[
    Rule {
        name: "prefix_duration",
        detect: prefix_duration,
    },
    Rule {
        name: "postfix_duration",
        detect: postfix_duration,
    },
    Rule {
        name: "paired_shorthand",
        detect: paired_shorthand,
    },
    Rule {
        name: "relative_weekday",
        detect: relative_weekday_phrase,
    },
    Rule {
        name: "relative_unit",
        detect: relative_unit,
    },
    Rule {
        name: "bare_duration",
        detect: bare_duration,
    },
];

const PREFIX_WORDS: &[&str] = &["in", "after", "within", "give", "gimme", "just"];
const SPELLED_ONE: &[&str] = &["a", "an", "one"];

/// Record `duration` applied to now in direction `sign`.
fn emit_offset(scan: &mut Scan<'_>, start: usize, duration: &CompoundDuration, sign: i64) -> bool {
    let anchor = *scan.anchor();
    let (Some(instant), Some(unit)) = (anchor.offset_by(duration, sign), duration.smallest_unit())
    else {
        return false;
    };
    let precision = promote_precision(unit, &instant, anchor.now());
    scan.emit(start, instant, precision).relative = true;
    true
}

/// "in 5 minutes", "after 2h", "give me 10 mins", "just a second".
fn prefix_duration(scan: &mut Scan<'_>, word: &str, start: usize) -> bool {
    if !is_any(word, PREFIX_WORDS) {
        return false;
    }
    if word.eq_ignore_ascii_case("give") && consume_any(&mut scan.cursor, &["me", "us"]).is_none() {
        return false;
    }
    let Some(duration) = parse_duration_chain(&mut scan.cursor) else {
        return false;
    };
    emit_offset(scan, start, &duration, 1)
}

/// "5 minutes ago", "an hour prior", "2 days from now".
fn postfix_duration(scan: &mut Scan<'_>, word: &str, start: usize) -> bool {
    let numeric = word.starts_with(|c: char| c.is_ascii_digit());
    if !numeric && !is_any(word, SPELLED_ONE) {
        return false;
    }
    let cursor = &mut scan.cursor;
    cursor.seek(start);
    let Some(duration) = parse_duration_chain(cursor) else {
        return false;
    };
    let sign = match consume_any(cursor, &["ago", "prior", "from"]) {
        Some(postfix) if postfix.eq_ignore_ascii_case("from") => {
            if consume_any(cursor, &["now"]).is_none() {
                return false;
            }
            1
        }
        Some(_) => -1,
        None => return false,
    };
    emit_offset(scan, start, &duration, sign)
}

/// One leg of the paired shorthand: up to three filler words (at least
/// `min_fillers`), "in", and a bare number of minutes. The cursor is left
/// right after the number.
fn shorthand_leg(cursor: &mut Cursor<'_>, min_fillers: usize) -> Option<i64> {
    cursor.attempt(|cursor| {
        let mut fillers = 0;
        while consume_any(cursor, &["in"]).is_none() {
            let word = cursor.peek_word(0)?;
            if fillers == 3 || !word.chars().all(char::is_alphabetic) {
                return None;
            }
            cursor.consume_word(false);
            fillers += 1;
        }
        if fillers < min_fillers {
            return None;
        }
        let minutes = cursor.consume_numbers(true)?;
        cursor.at_boundary().then_some(minutes)
    })
}

/// "match in 15, invites in 10": two offsets in minutes, separated by a
/// comma, each reported as its own match.
fn paired_shorthand(scan: &mut Scan<'_>, _word: &str, start: usize) -> bool {
    let cursor = &mut scan.cursor;
    cursor.seek(start);
    let Some(first) = shorthand_leg(cursor, 0) else {
        return false;
    };
    let first_end = cursor.position();
    cursor.consume_whitespace(false);
    if !cursor.consume_punctuation().is_some_and(|p| p.starts_with(',')) {
        return false;
    }
    cursor.consume_whitespace(false);
    let second_start = cursor.position();
    let Some(second) = shorthand_leg(cursor, 1) else {
        return false;
    };
    let second_end = cursor.position();

    let anchor = *scan.anchor();
    let in_minutes =
        |minutes| anchor.offset_by(&CompoundDuration::single(DurationUnit::Minute, minutes), 1);
    let (Some(first_at), Some(second_at)) = (in_minutes(first), in_minutes(second)) else {
        return false;
    };
    push_minutes(scan, start, first_end, first_at);
    push_minutes(scan, second_start, second_end, second_at);
    true
}

fn push_minutes(scan: &mut Scan<'_>, start: usize, end: usize, instant: DateTime<FixedOffset>) {
    scan.emit_between(start, end, instant, DurationUnit::Minute).relative = true;
}

/// "next week", "last month", "previous hour": one unit from now.
fn relative_unit(scan: &mut Scan<'_>, word: &str, start: usize) -> bool {
    let sign = if word.eq_ignore_ascii_case("next") {
        1
    } else if is_any(word, &["last", "previous", "prior"]) {
        -1
    } else {
        return false;
    };
    let cursor = &mut scan.cursor;
    let Some(unit) = cursor.peek_word(0).and_then(DurationUnit::from_word) else {
        return false;
    };
    cursor.consume_word(false);
    emit_offset(scan, start, &CompoundDuration::single(unit, 1), sign)
}

/// A compact duration standing on its own: "1h30m", "2d4h", "15m".
///
/// A single segment only counts for sub-day units, so "2d" or "3y" in
/// passing are not taken as offsets.
fn bare_duration(scan: &mut Scan<'_>, word: &str, start: usize) -> bool {
    let Some(duration) = parse_compact_duration(word) else {
        return false;
    };
    let segments = duration.iter().count();
    let sub_day = duration.smallest_unit().is_some_and(|unit| unit < DurationUnit::Day);
    if segments < 2 && !sub_day {
        return false;
    }
    emit_offset(scan, start, &duration, 1)
}

// ── Tests ───────────────────────────────────────────────────────────────────
