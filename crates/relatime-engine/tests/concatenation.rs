//! Joining expressions with ", " must not change how each one parses.
//!
//! Regression guard for detectors that read past the end of their own
//! phrase: every expression is parsed on its own and as part of one long
//! comma-separated message, and the two results have to agree.

use relatime_engine::{parse, Anchor, ParseModes, TimeMatch};

const ABSOLUTE: &[&str] = &[
    "today",
    "yesterday",
    "tomorrow at 9am",
    "midnight",
    "noon",
    "morning",
    "afternoon",
    "evening",
    "at 5pm",
    "17:30",
    "back of 8",
    "front of 9pm",
    "first day of February 2008",
    "last day of next month",
    "2nd Tuesday of March",
    "last Friday of the month",
    "next Friday",
    "last tues",
    "Monday",
    "Wednesday at 5:30pm",
    "3rd hour",
    "21st day",
    "this saturday around noon",
];

const RELATIVE: &[&str] = &[
    "in 5 minutes",
    "in 2 hours",
    "after 30 minutes",
    "within 3 days",
    "give me 10 minutes",
    "gimme 2h",
    "just a second",
    "5 minutes ago",
    "2 days from now",
    "an hour prior",
    "1h30m",
    "2d4h",
    "next week",
    "last month",
    "in 1h 30m",
];

fn anchor() -> Anchor {
    Anchor::parse("2024-03-15T10:00:00Z", "Europe/London").unwrap()
}

/// The parts of a match that do not depend on where it sits in the text.
fn essence(m: &TimeMatch) -> (String, String, String, bool, bool) {
    (
        m.span.clone(),
        m.instant.to_rfc3339(),
        m.precision.to_string(),
        m.approximated,
        m.relative,
    )
}

fn assert_concatenation_stable(expressions: &[&str], modes: ParseModes) {
    let anchor = anchor();
    let mut expected = Vec::new();
    for expression in expressions {
        let found = parse(expression, &anchor, modes);
        assert_eq!(found.len(), 1, "{expression:?} on its own: {found:?}");
        assert_eq!(found[0].span, *expression);
        expected.push(essence(&found[0]));
    }

    let message = expressions.join(", ");
    let found = parse(&message, &anchor, modes);
    let actual: Vec<_> = found.iter().map(essence).collect();
    assert_eq!(actual, expected, "in {message:?}");
    for m in &found {
        assert_eq!(&message[m.start..m.end], m.span);
    }
}

#[test]
fn test_absolute_concatenation() {
    assert_concatenation_stable(ABSOLUTE, ParseModes::ABSOLUTE);
}

#[test]
fn test_relative_concatenation() {
    assert_concatenation_stable(RELATIVE, ParseModes::RELATIVE);
}

#[test]
fn test_reversed_order() {
    let reversed: Vec<&str> = ABSOLUTE.iter().rev().copied().collect();
    assert_concatenation_stable(&reversed, ParseModes::ABSOLUTE);
    let reversed: Vec<&str> = RELATIVE.iter().rev().copied().collect();
    assert_concatenation_stable(&reversed, ParseModes::RELATIVE);
}
