//! Property tests for the driver and the detector tables.

use proptest::prelude::*;
use relatime_engine::detect::{absolute, relative};
use relatime_engine::{parse, parse_with_diagnostics, Anchor, ParseModes, Scan};

/// Words the detectors care about, mixed into otherwise random text so the
/// generated messages actually reach deep into the rules.
const VOCABULARY: &[&str] = &[
    "in", "at", "on", "by", "around", "after", "within", "give", "me", "gimme", "just", "ago",
    "prior", "from", "now", "next", "last", "this", "previous", "first", "2nd", "third",
    "twenty-first", "day", "of", "the", "month", "year", "week", "hour", "minutes", "a", "an",
    "today", "tomorrow", "yesterday", "midnight", "noon", "back", "front", "Friday", "tues",
    "March", "2024", "5pm", "17:30", "9:15am", "1h30m", "2d", "15", "10", ",", ".", "!", "\n",
    "é", "🎉",
];

fn anchor() -> Anchor {
    Anchor::parse("2024-03-15T10:00:00Z", "America/New_York").unwrap()
}

fn message() -> impl Strategy<Value = String> {
    let token = prop_oneof![
        3 => proptest::sample::select(VOCABULARY).prop_map(str::to_string),
        1 => "\\PC{0,6}",
    ];
    let separator = prop_oneof![Just(" "), Just(", "), Just(""), Just("\t")];
    proptest::collection::vec((token, separator), 0..24).prop_map(|parts| {
        parts
            .into_iter()
            .map(|(token, separator)| format!("{token}{separator}"))
            .collect()
    })
}

fn modes() -> impl Strategy<Value = ParseModes> {
    prop_oneof![
        Just(ParseModes::ALL),
        Just(ParseModes::ABSOLUTE),
        Just(ParseModes::RELATIVE),
    ]
}

proptest! {
    #[test]
    fn test_parse_always_advances(text in message(), modes in modes()) {
        let mut stalls = 0;
        parse_with_diagnostics(&text, &anchor(), modes, |_| stalls += 1);
        prop_assert_eq!(stalls, 0);
    }

    #[test]
    fn test_matches_are_ordered_and_disjoint(text in message(), modes in modes()) {
        let found = parse(&text, &anchor(), modes);
        for m in &found {
            prop_assert!(m.start < m.end);
            prop_assert_eq!(&text[m.start..m.end], m.span.as_str());
        }
        for pair in found.windows(2) {
            prop_assert!(pair[0].start < pair[1].start);
            prop_assert!(pair[0].end <= pair[1].start);
        }
    }

    #[test]
    fn test_arbitrary_text_never_panics(text in "\\PC{0,200}") {
        let _ = parse(&text, &anchor(), ParseModes::ALL);
    }

    #[test]
    fn test_garbage_has_no_matches(text in "[xzqjk]{1,8}( [xzqjk]{1,8}){0,6}") {
        prop_assert!(parse(&text, &anchor(), ParseModes::ALL).is_empty());
    }

    #[test]
    fn test_failed_rules_leave_cursor_alone(text in message()) {
        let anchor = anchor();
        for rule in absolute::RULES.iter().chain(relative::RULES) {
            let mut scan = Scan::new(&text, anchor);
            scan.cursor.consume_non_word();
            let start = scan.cursor.position();
            let Some(word) = scan.cursor.consume_word(false) else {
                continue;
            };
            let entry = scan.cursor.position();
            if rule.apply(&mut scan, word, start) {
                prop_assert!(!scan.matches().is_empty(), "{} matched nothing", rule.name);
            } else {
                prop_assert_eq!(scan.cursor.position(), entry, "{} moved the cursor", rule.name);
                prop_assert!(scan.matches().is_empty(), "{} left a match behind", rule.name);
            }
        }
    }
}
