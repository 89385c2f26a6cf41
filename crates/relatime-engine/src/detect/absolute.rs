//! Calendar phrases: "first day of February 2008", "2nd Tuesday of next
//! month", "next Friday at 5pm", "tomorrow at noon", "back of 8".

use chrono::{Datelike, NaiveDate, TimeDelta, Timelike, Weekday};

use super::{
    calendar_precision, consume_trailing_time, relative_weekday, resolve_date, Rule, Scan,
};
use crate::consume::{
    consume_any, consume_hour, consume_month_year, consume_time_of_day, consume_weekday, is_any,
    weekday_from_word, MonthYear, TimeOfDay,
};
use crate::cursor::Cursor;
use crate::duration::DurationUnit;
use crate::zone::shift_days;

/// Absolute detectors, most specific first.
pub const RULES: &[Rule] = &[
    Rule {
        name: "first_last_day_of",
        detect: first_and_last_days,
    },
    Rule {
        name: "nth_weekday_of",
        detect: nth_weekday_of_month,
    },
    Rule {
        name: "last_weekday_of",
        detect: last_weekday_of_month,
    },
    Rule {
        name: "weekday_relation",
        detect: weekday_with_relation,
    },
    Rule {
        name: "relative_weekday",
        detect: relative_weekday_phrase,
    },
    Rule {
        name: "ordinal_unit",
        detect: ordinal_unit,
    },
    Rule {
        name: "back_front_of_hour",
        detect: back_and_front_of_hour,
    },
    Rule {
        name: "yesterday",
        detect: yesterday,
    },
    Rule {
        name: "today",
        detect: today,
    },
    Rule {
        name: "tomorrow",
        detect: tomorrow,
    },
    Rule {
        name: "midnight",
        detect: midnight,
    },
    Rule {
        name: "preposition_time",
        detect: preposition_time,
    },
    Rule {
        name: "time_of_day",
        detect: time_of_day,
    },
];

const FORWARD_RELATIONS: &[&str] = &["next", "this", "coming", "upcoming"];
const BACKWARD_RELATIONS: &[&str] = &["last", "previous", "prior"];

/// Whether `word` points forwards (`Some(true)`) or backwards in time.
fn relation_direction(word: &str) -> Option<bool> {
    if is_any(word, FORWARD_RELATIONS) {
        Some(true)
    } else if is_any(word, BACKWARD_RELATIONS) {
        Some(false)
    } else {
        None
    }
}

/// Consume `words` in sequence, all or nothing.
fn consume_sequence(cursor: &mut Cursor<'_>, words: &[&str]) -> bool {
    cursor
        .attempt(|cursor| {
            for word in words {
                consume_any(cursor, &[*word])?;
            }
            Some(())
        })
        .is_some()
}

/// "first day of <period>" and "last day of <period>".
fn first_and_last_days(scan: &mut Scan<'_>, word: &str, start: usize) -> bool {
    let first = if word.eq_ignore_ascii_case("first") {
        true
    } else if word.eq_ignore_ascii_case("last") {
        false
    } else {
        return false;
    };
    let anchor = *scan.anchor();
    if !consume_sequence(&mut scan.cursor, &["day", "of"]) {
        return false;
    }
    let Some(period) = consume_month_year(&mut scan.cursor, anchor.today()) else {
        return false;
    };

    let day = if first {
        period.first_day()
    } else {
        period.last_day()
    };
    let Some(instant) = day.and_then(|day| anchor.start_of_day(day)) else {
        return false;
    };
    scan.emit(start, instant, DurationUnit::Day);
    true
}

/// "2nd Tuesday of March", "fifth Monday of next month", "10th Friday of 2025".
fn nth_weekday_of_month(scan: &mut Scan<'_>, _word: &str, start: usize) -> bool {
    let anchor = *scan.anchor();
    let cursor = &mut scan.cursor;
    cursor.seek(start);
    let Some(ordinal) = cursor.consume_ordinal().filter(|&n| n >= 1) else {
        return false;
    };
    let Some(weekday) = consume_weekday(cursor) else {
        return false;
    };
    if consume_any(cursor, &["of"]).is_none() {
        return false;
    }
    let Some(period) = consume_month_year(cursor, anchor.today()) else {
        return false;
    };

    let Some(target) = nth_weekday(period, weekday, ordinal) else {
        return false;
    };
    let approximated = match period.month {
        Some(month) => target.month() != month || target.year() != period.year,
        None => target.year() != period.year,
    };
    let Some(instant) = anchor.start_of_day(target) else {
        return false;
    };
    scan.emit(start, instant, DurationUnit::Day).approximated = approximated;
    true
}

/// The `ordinal`th `weekday` counted from the start of `period`, allowed to
/// run past its end.
fn nth_weekday(period: MonthYear, weekday: Weekday, ordinal: u32) -> Option<NaiveDate> {
    let first = period.first_day()?;
    let diff = (i64::from(weekday.num_days_from_sunday())
        - i64::from(first.weekday().num_days_from_sunday()))
    .rem_euclid(7);
    let weeks = i64::from(ordinal - 1).checked_mul(7)?;
    shift_days(first, diff.checked_add(weeks)?)
}

/// "last Friday of the month", "last Sunday of 2024".
fn last_weekday_of_month(scan: &mut Scan<'_>, word: &str, start: usize) -> bool {
    if !word.eq_ignore_ascii_case("last") {
        return false;
    }
    let anchor = *scan.anchor();
    let cursor = &mut scan.cursor;
    let Some(weekday) = consume_weekday(cursor) else {
        return false;
    };
    if consume_any(cursor, &["of"]).is_none() {
        return false;
    }
    let Some(last) = consume_month_year(cursor, anchor.today()).and_then(|p| p.last_day()) else {
        return false;
    };

    let back = (i64::from(last.weekday().num_days_from_sunday())
        - i64::from(weekday.num_days_from_sunday()))
    .rem_euclid(7);
    let Some(instant) = shift_days(last, -back).and_then(|day| anchor.start_of_day(day)) else {
        return false;
    };
    scan.emit(start, instant, DurationUnit::Day);
    true
}

/// "Friday", "Monday next", "Tuesday last at 3pm". A weekday on its own is
/// the next one.
fn weekday_with_relation(scan: &mut Scan<'_>, word: &str, start: usize) -> bool {
    let Some(weekday) = weekday_from_word(word) else {
        return false;
    };
    let anchor = *scan.anchor();
    let cursor = &mut scan.cursor;
    let forward = match cursor.peek_word(0).and_then(relation_direction) {
        Some(forward) => {
            cursor.consume_word(false);
            forward
        }
        None => true,
    };
    let time = consume_trailing_time(cursor);

    let Some((instant, precision)) = relative_weekday(anchor.today(), weekday, forward)
        .and_then(|day| resolve_date(&anchor, day, time))
    else {
        return false;
    };
    scan.emit(start, instant, precision);
    true
}

/// "next Friday", "last tues", "this Sunday at noon".
pub(crate) fn relative_weekday_phrase(scan: &mut Scan<'_>, word: &str, start: usize) -> bool {
    let Some(forward) = relation_direction(word) else {
        return false;
    };
    let anchor = *scan.anchor();
    let cursor = &mut scan.cursor;
    let Some(weekday) = consume_weekday(cursor) else {
        return false;
    };
    let time = consume_trailing_time(cursor);

    let Some((instant, precision)) = relative_weekday(anchor.today(), weekday, forward)
        .and_then(|day| resolve_date(&anchor, day, time))
    else {
        return false;
    };
    scan.emit(start, instant, precision);
    true
}

/// "3rd hour", "21st day", "second week": the nth unit of the enclosing
/// minute, hour, day, month or year.
fn ordinal_unit(scan: &mut Scan<'_>, _word: &str, start: usize) -> bool {
    let anchor = *scan.anchor();
    let cursor = &mut scan.cursor;
    cursor.seek(start);
    let Some(n) = cursor.consume_ordinal().filter(|&n| n >= 1) else {
        return false;
    };
    let Some(unit) = cursor.peek_word(0).and_then(DurationUnit::from_word) else {
        return false;
    };
    cursor.consume_word(false);

    let local = anchor.local_now();
    let today = local.date();
    let skip = i64::from(n - 1);
    let target = match unit {
        DurationUnit::Second => local
            .with_second(0)
            .and_then(|t| t.with_nanosecond(0))
            .and_then(|t| t.checked_add_signed(TimeDelta::try_seconds(skip)?)),
        DurationUnit::Minute => today
            .and_hms_opt(local.hour(), 0, 0)
            .and_then(|t| t.checked_add_signed(TimeDelta::try_minutes(skip)?)),
        DurationUnit::Hour => today
            .and_hms_opt(0, 0, 0)
            .and_then(|t| t.checked_add_signed(TimeDelta::try_hours(skip)?)),
        DurationUnit::Day => {
            let in_month = MonthYear {
                year: today.year(),
                month: Some(today.month()),
            }
            .last_day()
            .map(|last| last.day());
            if in_month.is_none_or(|days| n > days) {
                return false;
            }
            today
                .with_day(n)
                .and_then(|day| day.and_hms_opt(0, 0, 0))
        }
        DurationUnit::Week => today
            .with_day(1)
            .and_then(|first| shift_days(first, skip.checked_mul(7)?))
            .and_then(|day| day.and_hms_opt(0, 0, 0)),
        DurationUnit::Month => {
            if n > 12 {
                return false;
            }
            NaiveDate::from_ymd_opt(today.year(), n, 1).and_then(|day| day.and_hms_opt(0, 0, 0))
        }
        DurationUnit::Year => i32::try_from(n)
            .ok()
            .and_then(|year| NaiveDate::from_ymd_opt(year, 1, 1))
            .and_then(|day| day.and_hms_opt(0, 0, 0)),
    };

    let Some(instant) = target.and_then(|t| anchor.at_local(t)) else {
        return false;
    };
    scan.emit(start, instant, calendar_precision(unit));
    true
}

/// "back of 8" is 8:15 and "front of 8" is 7:45.
fn back_and_front_of_hour(scan: &mut Scan<'_>, word: &str, start: usize) -> bool {
    let minutes = if word.eq_ignore_ascii_case("back") {
        15
    } else if word.eq_ignore_ascii_case("front") {
        -15
    } else {
        return false;
    };
    let anchor = *scan.anchor();
    let cursor = &mut scan.cursor;
    if consume_any(cursor, &["of"]).is_none() {
        return false;
    }
    let Some(time) = consume_hour(cursor) else {
        return false;
    };

    let Some(instant) = time
        .on(anchor.today())
        .and_then(|t| t.checked_add_signed(TimeDelta::minutes(minutes)))
        .and_then(|t| anchor.at_local(t))
    else {
        return false;
    };
    scan.emit(start, instant, DurationUnit::Minute);
    true
}

/// `<keyword> [on|at|in <time>]`, or the keyword directly followed by a time.
fn keyword_day(scan: &mut Scan<'_>, word: &str, start: usize, keyword: &str, days: i64) -> bool {
    if !word.eq_ignore_ascii_case(keyword) {
        return false;
    }
    let anchor = *scan.anchor();
    let time = scan.cursor.attempt(|cursor| {
        consume_any(cursor, &["on", "at", "in"]);
        consume_time_of_day(cursor)
    });

    let Some((instant, precision)) =
        shift_days(anchor.today(), days).and_then(|day| resolve_date(&anchor, day, time))
    else {
        return false;
    };
    scan.emit(start, instant, precision);
    true
}

fn yesterday(scan: &mut Scan<'_>, word: &str, start: usize) -> bool {
    keyword_day(scan, word, start, "yesterday", -1)
}

fn today(scan: &mut Scan<'_>, word: &str, start: usize) -> bool {
    keyword_day(scan, word, start, "today", 0)
}

fn tomorrow(scan: &mut Scan<'_>, word: &str, start: usize) -> bool {
    keyword_day(scan, word, start, "tomorrow", 1)
}

/// "midnight": the start of today.
fn midnight(scan: &mut Scan<'_>, word: &str, start: usize) -> bool {
    if !word.eq_ignore_ascii_case("midnight") {
        return false;
    }
    let anchor = *scan.anchor();
    let Some(instant) = anchor.start_of_day(anchor.today()) else {
        return false;
    };
    scan.emit(start, instant, DurationUnit::Minute);
    true
}

/// "at 5pm", "around noon", "by 17:30", "about 9am".
fn preposition_time(scan: &mut Scan<'_>, word: &str, start: usize) -> bool {
    if !is_any(word, &["at", "around", "by", "about"]) {
        return false;
    }
    let Some(time) = consume_time_of_day(&mut scan.cursor) else {
        return false;
    };
    emit_time_today(scan, start, time)
}

/// A time on its own: "5pm", "17:30", or a daypart such as "noon" or
/// "evening".
fn time_of_day(scan: &mut Scan<'_>, _word: &str, start: usize) -> bool {
    scan.cursor.seek(start);
    let Some(time) = consume_time_of_day(&mut scan.cursor) else {
        return false;
    };
    emit_time_today(scan, start, time)
}

fn emit_time_today(scan: &mut Scan<'_>, start: usize, time: TimeOfDay) -> bool {
    let anchor = *scan.anchor();
    let Some((instant, precision)) = resolve_date(&anchor, anchor.today(), Some(time)) else {
        return false;
    };
    scan.emit(start, instant, precision);
    true
}

// ── Tests ───────────────────────────────────────────────────────────────────
