//! Duration units and compound durations.
//!
//! The seven [`DurationUnit`]s double as the display precision of a match.
//! Each unit carries a nominal length (a month is 30 days, a year 365) that
//! is only ever used to order units and to measure "how far from now" a
//! result landed; offsets themselves are applied on the calendar by
//! [`Anchor::offset_by`](crate::zone::Anchor::offset_by).

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::OnceLock;

use crate::cursor::Cursor;

/// A unit of time, ordered from shortest to longest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DurationUnit {
    Second,
    Minute,
    Hour,
    Day,
    Week,
    Month,
    Year,
}

/// The coarsest unit an expression specified; governs how a match is displayed.
pub type Precision = DurationUnit;

impl DurationUnit {
    pub const ALL: [DurationUnit; 7] = [
        DurationUnit::Second,
        DurationUnit::Minute,
        DurationUnit::Hour,
        DurationUnit::Day,
        DurationUnit::Week,
        DurationUnit::Month,
        DurationUnit::Year,
    ];

    /// Approximate length in seconds, for ordering only.
    pub fn nominal_seconds(self) -> i64 {
        match self {
            DurationUnit::Second => 1,
            DurationUnit::Minute => 60,
            DurationUnit::Hour => 60 * 60,
            DurationUnit::Day => 60 * 60 * 24,
            DurationUnit::Week => 60 * 60 * 24 * 7,
            DurationUnit::Month => 60 * 60 * 24 * 30,
            DurationUnit::Year => 60 * 60 * 24 * 365,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            DurationUnit::Second => "second",
            DurationUnit::Minute => "minute",
            DurationUnit::Hour => "hour",
            DurationUnit::Day => "day",
            DurationUnit::Week => "week",
            DurationUnit::Month => "month",
            DurationUnit::Year => "year",
        }
    }

    fn index(self) -> usize {
        self as usize
    }

    /// Match a token against the full-word pattern of every unit
    /// ("minutes", "Hour", ...). Case-insensitive.
    pub fn from_word(token: &str) -> Option<Self> {
        let p = unit_patterns();
        Self::ALL
            .into_iter()
            .find(|unit| p.full[unit.index()].is_match(token))
    }

    /// Match a token against the shorthand pattern of every unit
    /// ("m", "hr", "mo", ...). Case-sensitive, so "M" is not a minute.
    pub fn from_shorthand(token: &str) -> Option<Self> {
        let p = unit_patterns();
        Self::ALL
            .into_iter()
            .find(|unit| p.shorthand[unit.index()].is_match(token))
    }

    /// Full-word or shorthand spelling of a unit.
    pub fn from_token(token: &str) -> Option<Self> {
        Self::from_word(token).or_else(|| Self::from_shorthand(token))
    }
}

impl fmt::Display for DurationUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Order two units by nominal length.
pub fn compare_units(a: DurationUnit, b: DurationUnit) -> Ordering {
    a.nominal_seconds().cmp(&b.nominal_seconds())
}

/// The finer of two units.
pub fn finer_unit(a: DurationUnit, b: DurationUnit) -> DurationUnit {
    match compare_units(a, b) {
        Ordering::Greater => b,
        _ => a,
    }
}

// ── Recognition patterns ────────────────────────────────────────────────────

struct UnitPatterns {
    shorthand: [Regex; 7],
    full: [Regex; 7],
    token: Regex,
    compact_segment: Regex,
}

fn unit_patterns() -> &'static UnitPatterns {
    static PATTERNS: OnceLock<UnitPatterns> = OnceLock::new();
    PATTERNS.get_or_init(UnitPatterns::new)
}

impl UnitPatterns {
    fn new() -> Self {
        let exact = |source: &str| Regex::new(&format!("^(?:{source})$")).unwrap();
        Self {
            shorthand: [
                exact("s|secs?"),
                exact("m|mins?"),
                exact("h|hrs?"),
                exact("d|dy"),
                exact("w|wks?"),
                exact("mo|mos|mon"),
                exact("y|yrs?"),
            ],
            full: [
                exact("(?i)seconds?"),
                exact("(?i)minutes?"),
                exact("(?i)hours?"),
                exact("(?i)days?"),
                exact("(?i)weeks?"),
                exact("(?i)months?"),
                exact("(?i)years?"),
            ],
            // Letters only, so "1h30m" yields "h" and leaves "30m" for the next segment.
            token: Regex::new(r"^[A-Za-z]+").unwrap(),
            compact_segment: Regex::new(r"([0-9]+)([A-Za-z]+)").unwrap(),
        }
    }
}

// ── Compound durations ──────────────────────────────────────────────────────

/// Quantities keyed by unit, e.g. `{hour: 2, minute: 30}` for "2h30m".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CompoundDuration {
    parts: BTreeMap<DurationUnit, i64>,
}

impl CompoundDuration {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(unit: DurationUnit, quantity: i64) -> Self {
        let mut duration = Self::new();
        duration.add(unit, quantity);
        duration
    }

    /// Add `quantity` of `unit`, summing with anything already present.
    pub fn add(&mut self, unit: DurationUnit, quantity: i64) {
        let entry = self.parts.entry(unit).or_insert(0);
        *entry = entry.saturating_add(quantity);
    }

    pub fn merge(&mut self, other: &CompoundDuration) {
        for (&unit, &quantity) in &other.parts {
            self.add(unit, quantity);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Quantity recorded for `unit`, zero when absent.
    pub fn get(&self, unit: DurationUnit) -> i64 {
        self.parts.get(&unit).copied().unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (DurationUnit, i64)> + '_ {
        self.parts.iter().map(|(&unit, &quantity)| (unit, quantity))
    }

    pub fn smallest_unit(&self) -> Option<DurationUnit> {
        self.parts.keys().copied().min_by(|a, b| compare_units(*a, *b))
    }

    /// Total nominal length in seconds, saturating on overflow.
    pub fn nominal_seconds(&self) -> i64 {
        self.iter().fold(0i64, |total, (unit, quantity)| {
            total.saturating_add(quantity.saturating_mul(unit.nominal_seconds()))
        })
    }
}

/// The finest unit present in `duration`.
pub fn smallest_unit(duration: &CompoundDuration) -> Option<DurationUnit> {
    duration.smallest_unit()
}

// ── Consumers ───────────────────────────────────────────────────────────────

/// Quantity words that stand for 1.
const SPELLED_ONE: &[&str] = &["a", "an", "one"];

fn peek_unit_token<'a>(cursor: &Cursor<'a>) -> Option<&'a str> {
    cursor.peek_regex(&unit_patterns().token)
}

/// Consume one `<quantity> <unit>` pair such as "5 minutes", "an hour" or
/// the "1h" of "1h30m".
///
/// After a numeral, one interjected word may sit between the quantity and
/// the unit ("5 whole minutes"). On failure nothing is consumed.
pub fn parse_duration(cursor: &mut Cursor<'_>) -> Option<CompoundDuration> {
    cursor.attempt(|cursor| {
        let spelled = cursor
            .peek_word(0)
            .is_some_and(|word| SPELLED_ONE.iter().any(|s| word.eq_ignore_ascii_case(s)));
        let quantity = if spelled {
            cursor.consume_word(false);
            1
        } else {
            cursor.consume_numbers(false)?
        };

        let unit = match peek_unit_token(cursor).and_then(DurationUnit::from_token) {
            Some(unit) => {
                cursor.consume_regex(&unit_patterns().token);
                unit
            }
            None if !spelled => skip_interjection(cursor)?,
            None => return None,
        };

        cursor.consume_whitespace(false);
        Some(CompoundDuration::single(unit, quantity))
    })
}

/// Skip a single alphabetic word followed by a unit.
fn skip_interjection(cursor: &mut Cursor<'_>) -> Option<DurationUnit> {
    let word = cursor.peek_word(0)?;
    if !word.chars().all(|c| c.is_alphabetic()) {
        return None;
    }
    cursor.consume_word(false)?;
    let unit = DurationUnit::from_token(peek_unit_token(cursor)?)?;
    cursor.consume_regex(&unit_patterns().token);
    Some(unit)
}

/// Consume as many consecutive durations as possible ("2d4h15m",
/// "2 hours 30 minutes"). `None` when not even one was found.
pub fn parse_duration_chain(cursor: &mut Cursor<'_>) -> Option<CompoundDuration> {
    let mut total = CompoundDuration::new();
    while let Some(segment) = parse_duration(cursor) {
        total.merge(&segment);
    }
    (!total.is_empty()).then_some(total)
}

/// Read a word made up entirely of digit+shorthand segments, e.g. "2d4h15m".
pub fn parse_compact_duration(word: &str) -> Option<CompoundDuration> {
    let mut total = CompoundDuration::new();
    let mut covered = 0;
    for caps in unit_patterns().compact_segment.captures_iter(word) {
        let whole = caps.get(0)?;
        if whole.start() != covered {
            return None;
        }
        covered = whole.end();
        let quantity = caps[1].parse::<i64>().ok()?;
        let unit = DurationUnit::from_shorthand(&caps[2])?;
        total.add(unit, quantity);
    }
    (covered == word.len() && !total.is_empty()).then_some(total)
}

// ── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn seconds(input: &str) -> Option<i64> {
        parse_duration(&mut Cursor::new(input)).map(|d| d.nominal_seconds())
    }

    #[test]
    fn test_units_ordered_by_length() {
        for pair in DurationUnit::ALL.windows(2) {
            assert_eq!(compare_units(pair[0], pair[1]), Ordering::Less);
            assert!(pair[0] < pair[1]);
        }
        assert_eq!(finer_unit(DurationUnit::Day, DurationUnit::Minute), DurationUnit::Minute);
    }

    #[test]
    fn test_shorthand_is_case_sensitive() {
        assert_eq!(DurationUnit::from_token("m"), Some(DurationUnit::Minute));
        assert_eq!(DurationUnit::from_token("M"), None);
        assert_eq!(DurationUnit::from_token("mo"), Some(DurationUnit::Month));
        assert_eq!(DurationUnit::from_token("mon"), Some(DurationUnit::Month));
        assert_eq!(DurationUnit::from_token("Minutes"), Some(DurationUnit::Minute));
        assert_eq!(DurationUnit::from_token("hr"), Some(DurationUnit::Hour));
        assert_eq!(DurationUnit::from_token("moo"), None);
    }

    #[test]
    fn test_parse_shorthand_duration() {
        assert_eq!(seconds("5h"), Some(18000));
    }

    #[test]
    fn test_parse_full_duration() {
        assert_eq!(seconds("2 hours"), Some(7200));
    }

    #[test]
    fn test_parse_spelled_quantity() {
        assert_eq!(seconds("an hour"), Some(3600));
        assert_eq!(seconds("One week"), Some(604800));
    }

    #[test]
    fn test_invalid_duration_restores_position() {
        let mut cursor = Cursor::new("durf hours");
        assert!(parse_duration(&mut cursor).is_none());
        assert_eq!(cursor.position(), 0);

        let mut cursor = Cursor::new("just a");
        cursor.consume_word(false);
        assert!(parse_duration(&mut cursor).is_none());
        assert_eq!(cursor.position(), 5);
    }

    #[test]
    fn test_interjection_skipped_after_numeral() {
        let mut cursor = Cursor::new("5 whole minutes left");
        let duration = parse_duration(&mut cursor).unwrap();
        assert_eq!(duration.get(DurationUnit::Minute), 5);
        assert_eq!(cursor.rest(), "left");
    }

    #[test]
    fn test_interjection_not_skipped_after_article() {
        assert_eq!(seconds("a few minutes"), None);
        assert_eq!(seconds("5 10 minutes"), None);
    }

    #[test]
    fn test_chain_accumulates_units() {
        let mut cursor = Cursor::new("2d4h15m");
        let chain = parse_duration_chain(&mut cursor).unwrap();
        assert_eq!(chain.get(DurationUnit::Day), 2);
        assert_eq!(chain.get(DurationUnit::Hour), 4);
        assert_eq!(chain.get(DurationUnit::Minute), 15);
        assert_eq!(chain.smallest_unit(), Some(DurationUnit::Minute));
        assert!(cursor.is_empty());
    }

    #[test]
    fn test_chain_with_spaces_stops_at_non_duration() {
        let mut cursor = Cursor::new("2 hours 30 minutes 10 people");
        let chain = parse_duration_chain(&mut cursor).unwrap();
        assert_eq!(chain.nominal_seconds(), 2 * 3600 + 30 * 60);
        assert_eq!(cursor.rest(), "10 people");
    }

    #[test]
    fn test_chain_empty_is_none() {
        let mut cursor = Cursor::new("hours 2");
        assert!(parse_duration_chain(&mut cursor).is_none());
        assert_eq!(cursor.position(), 0);
    }

    #[test]
    fn test_compact_duration() {
        let d = parse_compact_duration("1h30m").unwrap();
        assert_eq!(d.nominal_seconds(), 5400);
        assert!(parse_compact_duration("1h30").is_none());
        assert!(parse_compact_duration("h30m").is_none());
        assert!(parse_compact_duration("5km").is_none());
    }

    #[test]
    fn test_smallest_unit_of_empty_is_none() {
        assert_eq!(smallest_unit(&CompoundDuration::new()), None);
    }

    #[test]
    fn test_precision_serializes_lowercase() {
        let json = serde_json::to_string(&DurationUnit::Minute).unwrap();
        assert_eq!(json, "\"minute\"");
    }
}
