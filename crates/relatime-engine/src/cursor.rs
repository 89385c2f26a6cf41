//! Scanning primitives over an immutable source string.
//!
//! A [`Cursor`] owns nothing but a byte offset into the text it was created
//! for. Every `consume_*` method advances that offset only when it succeeds;
//! on failure the position is left exactly where it was. Backtracking is an
//! absolute [`Cursor::seek`] to a previously observed position, or the scoped
//! [`Cursor::attempt`], which restores the position whenever its closure
//! yields `None`.
//!
//! Words are maximal runs of characters that are neither whitespace nor
//! Unicode punctuation, so `"5:30pm"` scans as the words `5` and `30pm`
//! separated by the punctuation `:`.

use regex::Regex;
use std::sync::OnceLock;

/// Compiled scanning patterns, shared by every cursor.
struct Patterns {
    word: Regex,
    punctuation: Regex,
    whitespace: Regex,
    simple_whitespace: Regex,
    non_word: Regex,
    number: Regex,
    digit_ordinal: Regex,
    hyphen_or_space: Regex,
}

fn patterns() -> &'static Patterns {
    static PATTERNS: OnceLock<Patterns> = OnceLock::new();
    PATTERNS.get_or_init(Patterns::new)
}

impl Patterns {
    fn new() -> Self {
        Self {
            word: Regex::new(r"^[^\s\p{P}]+").unwrap(),
            punctuation: Regex::new(r"^\p{P}+").unwrap(),
            whitespace: Regex::new(r"^\s+").unwrap(),
            simple_whitespace: Regex::new(r"^[ \t]+").unwrap(),
            non_word: Regex::new(r"^[\s\p{P}]+").unwrap(),
            number: Regex::new(r"^[0-9]+").unwrap(),
            digit_ordinal: Regex::new(r"(?i)^([0-9]+)(?:st|nd|rd|th)").unwrap(),
            hyphen_or_space: Regex::new(r"^(?:-|[ \t]+)").unwrap(),
        }
    }
}

/// Ordinal words that stand on their own.
const ORDINAL_WORDS: &[(&str, u32)] = &[
    ("first", 1),
    ("second", 2),
    ("third", 3),
    ("fourth", 4),
    ("fifth", 5),
    ("sixth", 6),
    ("seventh", 7),
    ("eighth", 8),
    ("ninth", 9),
    ("tenth", 10),
    ("eleventh", 11),
    ("twelfth", 12),
    ("thirteenth", 13),
    ("fourteenth", 14),
    ("fifteenth", 15),
    ("sixteenth", 16),
    ("seventeenth", 17),
    ("eighteenth", 18),
    ("nineteenth", 19),
    ("twentieth", 20),
    ("thirtieth", 30),
    ("fortieth", 40),
    ("fiftieth", 50),
    ("sixtieth", 60),
    ("seventieth", 70),
    ("eightieth", 80),
    ("ninetieth", 90),
];

/// Cardinal tens that prefix a unit ordinal ("twenty-first").
const TENS_PREFIXES: &[(&str, u32)] = &[
    ("twenty", 20),
    ("thirty", 30),
    ("forty", 40),
    ("fifty", 50),
    ("sixty", 60),
    ("seventy", 70),
    ("eighty", 80),
    ("ninety", 90),
];

fn unit_ordinal(word: &str) -> Option<u32> {
    ORDINAL_WORDS[..9]
        .iter()
        .find(|(name, _)| word.eq_ignore_ascii_case(name))
        .map(|&(_, n)| n)
}

fn ordinal_word(word: &str) -> Option<u32> {
    ORDINAL_WORDS
        .iter()
        .find(|(name, _)| word.eq_ignore_ascii_case(name))
        .map(|&(_, n)| n)
}

fn tens_prefix(word: &str) -> Option<u32> {
    TENS_PREFIXES
        .iter()
        .find(|(name, _)| word.eq_ignore_ascii_case(name))
        .map(|&(_, n)| n)
}

/// "twentyfirst" written as a single word.
fn fused_ordinal(word: &str) -> Option<u32> {
    let lower = word.to_ascii_lowercase();
    TENS_PREFIXES.iter().find_map(|&(prefix, tens)| {
        let rest = lower.strip_prefix(prefix)?;
        unit_ordinal(rest).map(|unit| tens + unit)
    })
}

/// Whether `c` can be part of a word.
pub fn is_word_char(c: char) -> bool {
    let mut buf = [0u8; 4];
    patterns().word.is_match(c.encode_utf8(&mut buf))
}

/// A position-tracking scanner over `source`.
#[derive(Debug, Clone)]
pub struct Cursor<'a> {
    source: &'a str,
    position: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            position: 0,
        }
    }

    /// The complete, unmodified input.
    pub fn source(&self) -> &'a str {
        self.source
    }

    /// Current byte offset into [`Cursor::source`].
    pub fn position(&self) -> usize {
        self.position
    }

    /// Input that has not been consumed yet.
    pub fn rest(&self) -> &'a str {
        &self.source[self.position..]
    }

    /// The source text between two byte offsets.
    pub fn slice(&self, start: usize, end: usize) -> &'a str {
        &self.source[start..end]
    }

    pub fn is_empty(&self) -> bool {
        self.position >= self.source.len()
    }

    /// Move to an absolute byte offset.
    ///
    /// # Panics
    ///
    /// Panics if `index` is past the end of the source or not on a character
    /// boundary. Offsets obtained from [`Cursor::position`] are always valid.
    pub fn seek(&mut self, index: usize) {
        assert!(
            self.source.is_char_boundary(index),
            "seek to {index} outside of source (len {})",
            self.source.len()
        );
        self.position = index;
    }

    pub fn reset(&mut self) {
        self.position = 0;
    }

    /// Run `f`, restoring the position if it yields `None`.
    pub fn attempt<T>(&mut self, f: impl FnOnce(&mut Self) -> Option<T>) -> Option<T> {
        let checkpoint = self.position;
        let result = f(self);
        if result.is_none() {
            self.position = checkpoint;
        }
        result
    }

    pub fn peek_char(&self) -> Option<char> {
        self.rest().chars().next()
    }

    /// Consume a single character regardless of its class.
    pub fn consume_char(&mut self) -> Option<char> {
        let c = self.peek_char()?;
        self.position += c.len_utf8();
        Some(c)
    }

    /// Whether the cursor sits at the end of a word (or of the input).
    pub fn at_boundary(&self) -> bool {
        self.peek_char().map_or(true, |c| !is_word_char(c))
    }

    /// The `n`th upcoming word, without consuming anything.
    ///
    /// Word 0 must start at the current position. Later words must be
    /// separated from the previous one by spaces or tabs only; any punctuation
    /// or line break in between ends the lookahead.
    pub fn peek_word(&self, n: usize) -> Option<&'a str> {
        let p = patterns();
        let mut rest = self.rest();
        for i in 0..=n {
            let word = p.word.find(rest)?.as_str();
            if i == n {
                return Some(word);
            }
            rest = &rest[word.len()..];
            let gap = p.simple_whitespace.find(rest)?.len();
            rest = &rest[gap..];
        }
        None
    }

    /// Consume the next word, then any spaces after it unless
    /// `keep_trailing_space` is set.
    pub fn consume_word(&mut self, keep_trailing_space: bool) -> Option<&'a str> {
        let word = self.consume_pattern(&patterns().word)?;
        if !keep_trailing_space {
            self.consume_whitespace(false);
        }
        Some(word)
    }

    /// Consume a run of ASCII digits as an integer.
    pub fn consume_numbers(&mut self, keep_trailing_space: bool) -> Option<i64> {
        let digits = patterns().number.find(self.rest())?.as_str();
        let value = digits.parse::<i64>().ok()?;
        self.position += digits.len();
        if !keep_trailing_space {
            self.consume_whitespace(false);
        }
        Some(value)
    }

    /// Consume an ordinal number such as `21st`, `third` or `twenty-first`.
    pub fn consume_ordinal(&mut self) -> Option<u32> {
        let value = self.attempt(|cursor| {
            if let Some(caps) = patterns().digit_ordinal.captures(cursor.rest()) {
                let whole = caps.get(0)?.len();
                let value = caps[1].parse::<u32>().ok()?;
                cursor.position += whole;
                return cursor.at_boundary().then_some(value);
            }

            let word = cursor.peek_word(0)?;
            if let Some(value) = ordinal_word(word).or_else(|| fused_ordinal(word)) {
                cursor.consume_word(true);
                return Some(value);
            }

            let tens = tens_prefix(word)?;
            cursor.consume_word(true);
            cursor.consume_regex(&patterns().hyphen_or_space)?;
            let unit = unit_ordinal(cursor.peek_word(0)?)?;
            cursor.consume_word(true);
            Some(tens + unit)
        })?;
        self.consume_whitespace(false);
        Some(value)
    }

    /// Consume spaces and tabs, or every kind of whitespace when
    /// `include_newlines` is set.
    pub fn consume_whitespace(&mut self, include_newlines: bool) -> Option<&'a str> {
        let p = patterns();
        if include_newlines {
            self.consume_pattern(&p.whitespace)
        } else {
            self.consume_pattern(&p.simple_whitespace)
        }
    }

    pub fn consume_punctuation(&mut self) -> Option<&'a str> {
        self.consume_pattern(&patterns().punctuation)
    }

    /// Consume everything up to the next word: punctuation and whitespace,
    /// line breaks included.
    pub fn consume_non_word(&mut self) -> Option<&'a str> {
        self.consume_pattern(&patterns().non_word)
    }

    /// Consume text matching `pattern` at the current position.
    ///
    /// Matches that would start further ahead are ignored, so the pattern
    /// does not need to be anchored with `^`.
    pub fn consume_regex(&mut self, pattern: &Regex) -> Option<&'a str> {
        self.consume_pattern(pattern)
    }

    /// Text matching `pattern` at the current position, without consuming it.
    pub fn peek_regex(&self, pattern: &Regex) -> Option<&'a str> {
        let rest = self.rest();
        pattern
            .find(rest)
            .filter(|m| m.start() == 0 && !m.as_str().is_empty())
            .map(|m| m.as_str())
    }

    fn consume_pattern(&mut self, pattern: &Regex) -> Option<&'a str> {
        let matched = self.peek_regex(pattern)?;
        self.position += matched.len();
        Some(matched)
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_consume_word_sequence() {
        let mut cursor = Cursor::new("Hello world!");
        assert_eq!(cursor.consume_word(false), Some("Hello"));
        assert_eq!(cursor.consume_word(false), Some("world"));
        assert_eq!(cursor.consume_word(false), None);
        assert_eq!(cursor.consume_punctuation(), Some("!"));
        assert!(cursor.is_empty());
    }

    #[test]
    fn test_consume_word_keeps_trailing_space() {
        let mut cursor = Cursor::new("one two");
        assert_eq!(cursor.consume_word(true), Some("one"));
        assert_eq!(cursor.position(), 3);
        assert_eq!(cursor.consume_word(false), None);
    }

    #[test]
    fn test_no_word_in_whitespace() {
        let mut cursor = Cursor::new("   ");
        assert_eq!(cursor.consume_word(false), None);
        assert_eq!(cursor.position(), 0);
    }

    #[test]
    fn test_consume_numbers() {
        let mut cursor = Cursor::new("123 456");
        assert_eq!(cursor.consume_numbers(false), Some(123));
        assert_eq!(cursor.consume_numbers(false), Some(456));
        assert!(cursor.is_empty());
    }

    #[test]
    fn test_consume_numbers_rejects_letters() {
        let mut cursor = Cursor::new("abc");
        assert_eq!(cursor.consume_numbers(false), None);
        assert_eq!(cursor.position(), 0);
    }

    #[test]
    fn test_consume_numbers_overflow_leaves_position() {
        let mut cursor = Cursor::new("99999999999999999999999 days");
        assert_eq!(cursor.consume_numbers(false), None);
        assert_eq!(cursor.position(), 0);
    }

    #[test]
    fn test_consume_ordinal_words() {
        let mut cursor = Cursor::new("first second");
        assert_eq!(cursor.consume_ordinal(), Some(1));
        assert_eq!(cursor.consume_ordinal(), Some(2));
    }

    #[test]
    fn test_consume_ordinal_digits() {
        let mut cursor = Cursor::new("21st, 3RD 12th");
        assert_eq!(cursor.consume_ordinal(), Some(21));
        assert_eq!(cursor.consume_punctuation(), Some(","));
        cursor.consume_whitespace(false);
        assert_eq!(cursor.consume_ordinal(), Some(3));
        assert_eq!(cursor.consume_ordinal(), Some(12));
    }

    #[test]
    fn test_consume_ordinal_compound_forms() {
        assert_eq!(Cursor::new("twenty-first").consume_ordinal(), Some(21));
        assert_eq!(Cursor::new("thirty second").consume_ordinal(), Some(32));
        assert_eq!(Cursor::new("fortyninth").consume_ordinal(), Some(49));
        assert_eq!(Cursor::new("ninetieth").consume_ordinal(), Some(90));
        assert_eq!(Cursor::new("Eleventh").consume_ordinal(), Some(11));
    }

    #[test]
    fn test_consume_ordinal_rejects_cardinals() {
        let mut cursor = Cursor::new("twenty something");
        assert_eq!(cursor.consume_ordinal(), None);
        assert_eq!(cursor.position(), 0);

        let mut cursor = Cursor::new("21stuff");
        assert_eq!(cursor.consume_ordinal(), None);
        assert_eq!(cursor.position(), 0);

        let mut cursor = Cursor::new("firstly");
        assert_eq!(cursor.consume_ordinal(), None);
    }

    #[test]
    fn test_consume_punctuation() {
        let mut cursor = Cursor::new("!@#abc");
        assert_eq!(cursor.consume_punctuation(), Some("!@#"));
        let mut cursor = Cursor::new("abc");
        assert_eq!(cursor.consume_punctuation(), None);
    }

    #[test]
    fn test_consume_whitespace_modes() {
        let mut cursor = Cursor::new("   \tx");
        assert_eq!(cursor.consume_whitespace(false), Some("   \t"));

        let mut cursor = Cursor::new(" \n x");
        assert_eq!(cursor.consume_whitespace(false), Some(" "));
        assert_eq!(cursor.consume_whitespace(false), None);
        assert_eq!(cursor.consume_whitespace(true), Some("\n "));
    }

    #[test]
    fn test_consume_non_word_crosses_lines() {
        let mut cursor = Cursor::new(", \n- next");
        assert_eq!(cursor.consume_non_word(), Some(", \n- "));
        assert_eq!(cursor.consume_word(false), Some("next"));
    }

    #[test]
    fn test_consume_regex() {
        let letters = Regex::new(r"^[a-z]+").unwrap();
        let digits = Regex::new(r"[0-9]+").unwrap();
        let mut cursor = Cursor::new("abc123");
        assert_eq!(cursor.consume_regex(&digits), None);
        assert_eq!(cursor.consume_regex(&letters), Some("abc"));
        assert_eq!(cursor.consume_regex(&digits), Some("123"));
    }

    #[test]
    fn test_peek_word_lookahead() {
        let cursor = Cursor::new("first day of, February");
        assert_eq!(cursor.peek_word(0), Some("first"));
        assert_eq!(cursor.peek_word(1), Some("day"));
        assert_eq!(cursor.peek_word(2), Some("of"));
        assert_eq!(cursor.peek_word(3), None);
        assert_eq!(cursor.position(), 0);
    }

    #[test]
    fn test_reset_and_seek() {
        let mut cursor = Cursor::new("Hello world!");
        cursor.consume_word(false);
        cursor.reset();
        assert_eq!(cursor.consume_word(false), Some("Hello"));
        cursor.seek(6);
        assert_eq!(cursor.consume_word(false), Some("world"));
    }

    #[test]
    fn test_attempt_restores_on_none() {
        let mut cursor = Cursor::new("in two hours");
        let result: Option<()> = cursor.attempt(|c| {
            c.consume_word(false);
            c.consume_numbers(false).map(|_| ())
        });
        assert!(result.is_none());
        assert_eq!(cursor.position(), 0);
    }

    #[test]
    fn test_is_empty() {
        assert!(Cursor::new("").is_empty());
        assert!(!Cursor::new("Hello").is_empty());
    }

    #[test]
    fn test_multibyte_text() {
        let mut cursor = Cursor::new("héllo — wörld");
        assert_eq!(cursor.consume_word(false), Some("héllo"));
        assert_eq!(cursor.consume_non_word(), Some("— "));
        assert_eq!(cursor.consume_word(false), Some("wörld"));
        assert!(cursor.is_empty());
    }
}
