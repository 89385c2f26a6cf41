//! Higher-level recognizers built on [`Cursor`]: clock times, month/year
//! references and weekday names.
//!
//! Like the cursor primitives, every consumer here leaves the position
//! untouched when it returns `None`.

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use regex::Regex;
use std::sync::OnceLock;

use crate::cursor::Cursor;
use crate::duration::{DurationUnit, Precision};
use crate::zone::{shift_days, shift_months};

struct TimePatterns {
    clock: Regex,
    meridian: Regex,
    bare_hour: Regex,
    year: Regex,
}

fn time_patterns() -> &'static TimePatterns {
    static PATTERNS: OnceLock<TimePatterns> = OnceLock::new();
    PATTERNS.get_or_init(|| TimePatterns {
        clock: Regex::new(r"^([0-9]{1,2})(?::([0-9]{2})(?::([0-9]{2}))?)?").unwrap(),
        meridian: Regex::new(r"(?i)^[ \t]*([ap])(?:\.m\.?|m)").unwrap(),
        bare_hour: Regex::new(r"^[0-9]{1,2}").unwrap(),
        year: Regex::new(r"^[0-9]{4,}").unwrap(),
    })
}

/// Consume the next word if it is one of `words` (ASCII case-insensitive).
pub fn consume_any<'a>(cursor: &mut Cursor<'a>, words: &[&str]) -> Option<&'a str> {
    let word = cursor.peek_word(0)?;
    if words.iter().any(|w| word.eq_ignore_ascii_case(w)) {
        cursor.consume_word(false)
    } else {
        None
    }
}

pub(crate) fn is_any(word: &str, words: &[&str]) -> bool {
    words.iter().any(|w| word.eq_ignore_ascii_case(w))
}

// ── Time of day ─────────────────────────────────────────────────────────────

/// A wall-clock time, normalized so that overflow spills into `day_offset`
/// ("25:00" is 01:00 on the following day).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeOfDay {
    pub day_offset: i64,
    pub hour: u32,
    pub minute: u32,
    pub second: u32,
    /// How precisely the time was written: `second` when seconds were given,
    /// `minute` for minutes (and named times), `hour` for "5pm".
    pub precision: Precision,
}

impl TimeOfDay {
    pub fn new(hour: u32, minute: u32, second: u32, precision: Precision) -> Self {
        let total = u64::from(hour) * 3600 + u64::from(minute) * 60 + u64::from(second);
        let within_day = total % 86_400;
        Self {
            day_offset: (total / 86_400) as i64,
            hour: (within_day / 3600) as u32,
            minute: (within_day % 3600 / 60) as u32,
            second: (within_day % 60) as u32,
            precision,
        }
    }

    pub fn time(&self) -> NaiveTime {
        NaiveTime::from_hms_opt(self.hour, self.minute, self.second).unwrap_or(NaiveTime::MIN)
    }

    /// This time on `date`, after applying the day carry.
    pub fn on(&self, date: NaiveDate) -> Option<NaiveDateTime> {
        Some(shift_days(date, self.day_offset)?.and_time(self.time()))
    }
}

/// Consume a clock time ("5pm", "17:30", "9:05:10 a.m.") or a named time of
/// day ("noon", "evening").
pub fn consume_time_of_day(cursor: &mut Cursor<'_>) -> Option<TimeOfDay> {
    consume_clock_time(cursor).or_else(|| consume_named_time(cursor))
}

/// Consume `H[:MM[:SS]]` with an optional meridian.
///
/// A bare hour without minutes or meridian is rejected, as is any digit run
/// that does not end at a word boundary ("100:00", "16:9").
pub fn consume_clock_time(cursor: &mut Cursor<'_>) -> Option<TimeOfDay> {
    let p = time_patterns();
    cursor.attempt(|cursor| {
        let caps = p.clock.captures(cursor.rest())?;
        let numeric = caps.get(0)?.len();
        let hour: u32 = caps[1].parse().ok()?;
        let minute: Option<u32> = caps.get(2).and_then(|m| m.as_str().parse().ok());
        let second: Option<u32> = caps.get(3).and_then(|m| m.as_str().parse().ok());
        cursor.seek(cursor.position() + numeric);

        let meridian = cursor.attempt(|cursor| {
            let marker = p.meridian.captures(cursor.rest())?;
            let pm = marker[1].eq_ignore_ascii_case("p");
            cursor.seek(cursor.position() + marker.get(0)?.len());
            cursor.at_boundary().then_some(pm)
        });

        let hour = match meridian {
            Some(pm) => {
                if !(1..=12).contains(&hour) {
                    return None;
                }
                match (hour, pm) {
                    (12, false) => 0,
                    (12, true) => 12,
                    (h, true) => h + 12,
                    (h, false) => h,
                }
            }
            None => {
                if minute.is_none() || !cursor.at_boundary() || followed_by_digit_group(cursor) {
                    return None;
                }
                hour
            }
        };

        let precision = match (minute, second) {
            (_, Some(_)) => DurationUnit::Second,
            (Some(_), None) => DurationUnit::Minute,
            (None, None) => DurationUnit::Hour,
        };
        cursor.consume_whitespace(false);
        Some(TimeOfDay::new(
            hour,
            minute.unwrap_or(0),
            second.unwrap_or(0),
            precision,
        ))
    })
}

/// ":5" or ":123" left over after the clock pattern.
fn followed_by_digit_group(cursor: &Cursor<'_>) -> bool {
    let mut chars = cursor.rest().chars();
    chars.next() == Some(':') && chars.next().is_some_and(|c| c.is_ascii_digit())
}

/// Consume one of the named times of day.
pub fn consume_named_time(cursor: &mut Cursor<'_>) -> Option<TimeOfDay> {
    let hour = match cursor.peek_word(0)?.to_ascii_lowercase().as_str() {
        "midnight" => 0,
        "morning" => 6,
        "noon" => 12,
        "afternoon" => 15,
        "evening" => 18,
        _ => return None,
    };
    cursor.consume_word(false);
    Some(TimeOfDay::new(hour, 0, 0, DurationUnit::Minute))
}

/// A clock time, or a lone one- or two-digit number read as an hour.
pub fn consume_hour(cursor: &mut Cursor<'_>) -> Option<TimeOfDay> {
    consume_time_of_day(cursor).or_else(|| {
        cursor.attempt(|cursor| {
            let digits = cursor.consume_regex(&time_patterns().bare_hour)?;
            if !cursor.at_boundary() {
                return None;
            }
            let hour: u32 = digits.parse().ok()?;
            cursor.consume_whitespace(false);
            Some(TimeOfDay::new(hour, 0, 0, DurationUnit::Minute))
        })
    })
}

// ── Weekdays ────────────────────────────────────────────────────────────────

/// Recognize a weekday from its full name or any abbreviation of at least
/// three letters ("fri", "thurs", "wednes"), plus "weds".
///
/// Abbreviations are not checked against ordinary English, so "sat" and
/// "sun" in "I sat in the sun" are read as Saturday and Sunday.
pub fn weekday_from_word(word: &str) -> Option<Weekday> {
    let lower = word.to_ascii_lowercase();
    if lower == "weds" {
        return Some(Weekday::Wed);
    }
    if lower.len() < 3 {
        return None;
    }
    [
        ("sunday", Weekday::Sun),
        ("monday", Weekday::Mon),
        ("tuesday", Weekday::Tue),
        ("wednesday", Weekday::Wed),
        ("thursday", Weekday::Thu),
        ("friday", Weekday::Fri),
        ("saturday", Weekday::Sat),
    ]
    .into_iter()
    .find(|(name, _)| name.starts_with(lower.as_str()))
    .map(|(_, weekday)| weekday)
}

pub fn consume_weekday(cursor: &mut Cursor<'_>) -> Option<Weekday> {
    let weekday = weekday_from_word(cursor.peek_word(0)?)?;
    cursor.consume_word(false);
    Some(weekday)
}

// ── Months and years ────────────────────────────────────────────────────────

/// Parse a month name to number (1-12).
pub fn month_from_word(word: &str) -> Option<u32> {
    match word.to_ascii_lowercase().as_str() {
        "january" | "jan" => Some(1),
        "february" | "feb" => Some(2),
        "march" | "mar" => Some(3),
        "april" | "apr" => Some(4),
        "may" => Some(5),
        "june" | "jun" => Some(6),
        "july" | "jul" => Some(7),
        "august" | "aug" => Some(8),
        "september" | "sep" | "sept" => Some(9),
        "october" | "oct" => Some(10),
        "november" | "nov" => Some(11),
        "december" | "dec" => Some(12),
        _ => None,
    }
}

/// A calendar month, or a whole year when `month` is `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthYear {
    pub year: i32,
    pub month: Option<u32>,
}

impl MonthYear {
    pub fn precision(&self) -> Precision {
        if self.month.is_some() {
            DurationUnit::Month
        } else {
            DurationUnit::Year
        }
    }

    /// First day of the month, or January 1st.
    pub fn first_day(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month.unwrap_or(1), 1)
    }

    /// Last day of the month, or December 31st.
    pub fn last_day(&self) -> Option<NaiveDate> {
        let first = NaiveDate::from_ymd_opt(self.year, self.month.unwrap_or(12), 1)?;
        shift_months(first, 1)?.pred_opt()
    }

    /// The month containing `date` moved by `offset` months.
    fn month_of(date: NaiveDate, offset: i64) -> Option<Self> {
        let target = shift_months(date.with_day(1)?, offset)?;
        Some(Self {
            year: target.year(),
            month: Some(target.month()),
        })
    }

    /// The year containing `date` moved by `offset` years.
    fn year_of(date: NaiveDate, offset: i64) -> Option<Self> {
        let year = i64::from(date.year()).checked_add(offset)?;
        Some(Self {
            year: i32::try_from(year).ok()?,
            month: None,
        })
    }
}

const NEXT_WORDS: &[&str] = &["next", "following"];
const LAST_WORDS: &[&str] = &["last", "previous", "prior"];
const THIS_WORDS: &[&str] = &["this", "current", "now"];

/// The month offset a relation word stands for.
fn relation_offset(word: &str) -> Option<i64> {
    if is_any(word, NEXT_WORDS) {
        Some(1)
    } else if is_any(word, LAST_WORDS) {
        Some(-1)
    } else if is_any(word, THIS_WORDS) {
        Some(0)
    } else {
        None
    }
}

fn consume_relation(cursor: &mut Cursor<'_>) -> Option<i64> {
    let offset = relation_offset(cursor.peek_word(0)?)?;
    cursor.consume_word(false);
    Some(offset)
}

/// "month" or "year" as a whole word.
fn consume_period(cursor: &mut Cursor<'_>) -> Option<DurationUnit> {
    let unit = match DurationUnit::from_word(cursor.peek_word(0)?)? {
        unit @ (DurationUnit::Month | DurationUnit::Year) => unit,
        _ => return None,
    };
    cursor.consume_word(false);
    Some(unit)
}

fn consume_year(cursor: &mut Cursor<'_>) -> Option<i32> {
    cursor.attempt(|cursor| {
        let digits = cursor.consume_regex(&time_patterns().year)?;
        if !cursor.at_boundary() {
            return None;
        }
        let year = digits.parse::<i32>().ok()?;
        cursor.consume_whitespace(false);
        Some(year)
    })
}

fn consume_month_name(cursor: &mut Cursor<'_>) -> Option<u32> {
    let month = month_from_word(cursor.peek_word(0)?)?;
    cursor.consume_word(false);
    Some(month)
}

/// Consume a month or year reference, resolved against `today`.
///
/// Accepted forms, each with an optional leading "the":
///
/// - `<month> <year>`, `<year> <month>`, `<month>` (this year), `<year>`
/// - `next|last|this <month|year>` and their synonyms
/// - `<month|year> after|following|before <reference>`, e.g. "month after
///   next" or "year before last"
/// - a bare `month` / `year`, meaning the current one
pub fn consume_month_year(cursor: &mut Cursor<'_>, today: NaiveDate) -> Option<MonthYear> {
    cursor.attempt(|cursor| {
        consume_any(cursor, &["the"]);
        cursor
            .attempt(|c| consume_relative_period(c, today))
            .or_else(|| cursor.attempt(|c| consume_compound_period(c, today)))
            .or_else(|| cursor.attempt(|c| consume_named_month_year(c, today)))
    })
}

fn consume_relative_period(cursor: &mut Cursor<'_>, today: NaiveDate) -> Option<MonthYear> {
    let offset = consume_relation(cursor)?;
    resolve_period(consume_period(cursor)?, today, offset)
}

fn consume_compound_period(cursor: &mut Cursor<'_>, today: NaiveDate) -> Option<MonthYear> {
    let unit = consume_period(cursor)?;
    let connector = cursor.attempt(|cursor| {
        let step = match cursor.peek_word(0)?.to_ascii_lowercase().as_str() {
            "after" | "following" => 1,
            "before" => -1,
            _ => return None,
        };
        cursor.consume_word(false);
        Some(step + consume_relation(cursor)?)
    });
    resolve_period(unit, today, connector.unwrap_or(0))
}

fn resolve_period(unit: DurationUnit, today: NaiveDate, offset: i64) -> Option<MonthYear> {
    match unit {
        DurationUnit::Month => MonthYear::month_of(today, offset),
        _ => MonthYear::year_of(today, offset),
    }
}

fn consume_named_month_year(cursor: &mut Cursor<'_>, today: NaiveDate) -> Option<MonthYear> {
    if let Some(month) = consume_month_name(cursor) {
        let year = consume_year(cursor).unwrap_or(today.year());
        return Some(MonthYear {
            year,
            month: Some(month),
        });
    }
    let year = consume_year(cursor)?;
    Some(MonthYear {
        year,
        month: consume_month_name(cursor),
    })
}

// ── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn time(input: &str) -> Option<(u32, u32, u32, i64)> {
        consume_time_of_day(&mut Cursor::new(input))
            .map(|t| (t.hour, t.minute, t.second, t.day_offset))
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
    }

    fn month_year(input: &str) -> Option<MonthYear> {
        consume_month_year(&mut Cursor::new(input), today())
    }

    fn month(year: i32, month: u32) -> Option<MonthYear> {
        Some(MonthYear {
            year,
            month: Some(month),
        })
    }

    #[test]
    fn test_clock_times() {
        assert_eq!(time("1:30pm"), Some((13, 30, 0, 0)));
        assert_eq!(time("17:45"), Some((17, 45, 0, 0)));
        assert_eq!(time("9:05:10 a.m."), Some((9, 5, 10, 0)));
        assert_eq!(time("12am"), Some((0, 0, 0, 0)));
        assert_eq!(time("12 PM"), Some((12, 0, 0, 0)));
        assert_eq!(time("5 p.m"), Some((17, 0, 0, 0)));
    }

    #[test]
    fn test_clock_overflow_carries_into_next_day() {
        assert_eq!(time("25:00"), Some((1, 0, 0, 1)));
        assert_eq!(time("23:59:60"), Some((0, 0, 0, 1)));
        assert_eq!(time("10:75"), Some((11, 15, 0, 0)));
    }

    #[test]
    fn test_clock_rejects_malformed() {
        for input in ["100:1", "16:9", "4:3", "100:00", "00:100", "13pm", "0am", "5", "5 amazing"] {
            let mut cursor = Cursor::new(input);
            assert_eq!(consume_time_of_day(&mut cursor), None, "{input}");
            assert_eq!(cursor.position(), 0, "{input}");
        }
    }

    #[test]
    fn test_time_precision() {
        let at = |s| consume_time_of_day(&mut Cursor::new(s)).unwrap().precision;
        assert_eq!(at("5pm"), DurationUnit::Hour);
        assert_eq!(at("5:30pm"), DurationUnit::Minute);
        assert_eq!(at("5:30:15"), DurationUnit::Second);
        assert_eq!(at("noon"), DurationUnit::Minute);
    }

    #[test]
    fn test_named_times() {
        assert_eq!(time("noon"), Some((12, 0, 0, 0)));
        assert_eq!(time("Midnight"), Some((0, 0, 0, 0)));
        assert_eq!(time("afternoon"), Some((15, 0, 0, 0)));
        assert_eq!(time("evening"), Some((18, 0, 0, 0)));
        assert_eq!(time("tonight"), None);
    }

    #[test]
    fn test_consume_hour_accepts_bare_numbers() {
        let mut cursor = Cursor::new("5 o'clock");
        assert_eq!(consume_hour(&mut cursor).map(|t| t.hour), Some(5));
        assert_eq!(cursor.rest(), "o'clock");
        assert!(consume_hour(&mut Cursor::new("12something")).is_none());
        assert!(consume_hour(&mut Cursor::new("123")).is_none());
    }

    #[test]
    fn test_weekday_abbreviations() {
        assert_eq!(weekday_from_word("Monday"), Some(Weekday::Mon));
        assert_eq!(weekday_from_word("mon"), Some(Weekday::Mon));
        assert_eq!(weekday_from_word("mond"), Some(Weekday::Mon));
        assert_eq!(weekday_from_word("weds"), Some(Weekday::Wed));
        assert_eq!(weekday_from_word("thurs"), Some(Weekday::Thu));
        assert_eq!(weekday_from_word("Sat"), Some(Weekday::Sat));
        assert_eq!(weekday_from_word("sun"), Some(Weekday::Sun));
        assert_eq!(weekday_from_word("mo"), None);
        assert_eq!(weekday_from_word("mondays"), None);
        assert_eq!(weekday_from_word("sunny"), None);
    }

    #[test]
    fn test_named_month_and_year() {
        assert_eq!(month_year("February 2008"), month(2008, 2));
        assert_eq!(month_year("2008 feb"), month(2008, 2));
        assert_eq!(month_year("december"), month(2024, 12));
        assert_eq!(
            month_year("1999"),
            Some(MonthYear {
                year: 1999,
                month: None
            })
        );
        assert_eq!(month_year("99"), None);
    }

    #[test]
    fn test_relative_months() {
        assert_eq!(month_year("next month"), month(2024, 4));
        assert_eq!(month_year("the next month"), month(2024, 4));
        assert_eq!(month_year("the current month"), month(2024, 3));
        assert_eq!(month_year("now month"), month(2024, 3));
        assert_eq!(month_year("previous month"), month(2024, 2));
        assert_eq!(month_year("the month"), month(2024, 3));
    }

    #[test]
    fn test_relative_years() {
        let year = |y| {
            Some(MonthYear {
                year: y,
                month: None,
            })
        };
        assert_eq!(month_year("last year"), year(2023));
        assert_eq!(month_year("this year"), year(2024));
        assert_eq!(month_year("year after next"), year(2026));
    }

    #[test]
    fn test_compound_months() {
        assert_eq!(month_year("month after last"), month(2024, 3));
        assert_eq!(month_year("month before last"), month(2024, 1));
        assert_eq!(month_year("month following following"), month(2024, 5));
        assert_eq!(month_year("the month after next"), month(2024, 5));
    }

    #[test]
    fn test_month_crosses_year_boundary() {
        let jan = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
        let found = consume_month_year(&mut Cursor::new("last month"), jan);
        assert_eq!(found, month(2023, 12));
    }

    #[test]
    fn test_month_year_bounds() {
        let feb = month_year("february 2024").unwrap();
        assert_eq!(feb.precision(), DurationUnit::Month);
        assert_eq!(feb.first_day(), NaiveDate::from_ymd_opt(2024, 2, 1));
        assert_eq!(feb.last_day(), NaiveDate::from_ymd_opt(2024, 2, 29));

        let year = month_year("2023").unwrap();
        assert_eq!(year.precision(), DurationUnit::Year);
        assert_eq!(year.last_day(), NaiveDate::from_ymd_opt(2023, 12, 31));
    }

    #[test]
    fn test_month_year_failure_restores() {
        let mut cursor = Cursor::new("the meeting");
        assert_eq!(consume_month_year(&mut cursor, today()), None);
        assert_eq!(cursor.position(), 0);
    }
}
