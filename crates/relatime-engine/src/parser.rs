//! The parse driver.
//!
//! Walks the source word by word. At each word the absolute rules are tried,
//! then the relative rules, and the first rule that matches wins. A call
//! always returns a complete, position-ordered list of non-overlapping
//! matches; there is no failure mode once an [`Anchor`] exists.

use std::fmt;
use std::str::FromStr;

use crate::detect::{absolute, relative, Rule, Scan, TimeMatch};
use crate::error::{EngineError, Result};
use crate::zone::Anchor;

/// Which rule families a parse runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseModes {
    pub absolute: bool,
    pub relative: bool,
}

impl ParseModes {
    pub const ABSOLUTE: ParseModes = ParseModes {
        absolute: true,
        relative: false,
    };
    pub const RELATIVE: ParseModes = ParseModes {
        absolute: false,
        relative: true,
    };
    pub const ALL: ParseModes = ParseModes {
        absolute: true,
        relative: true,
    };

    /// The rule tables to run, in order.
    fn tables(self) -> impl Iterator<Item = &'static Rule> {
        let absolute = if self.absolute { absolute::RULES } else { &[] };
        let relative = if self.relative { relative::RULES } else { &[] };
        absolute.iter().chain(relative.iter())
    }
}

impl Default for ParseModes {
    fn default() -> Self {
        ParseModes::ALL
    }
}

impl FromStr for ParseModes {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "absolute" => Ok(ParseModes::ABSOLUTE),
            "relative" => Ok(ParseModes::RELATIVE),
            "both" | "all" => Ok(ParseModes::ALL),
            _ => Err(EngineError::InvalidMode(format!(
                "'{s}' (expected absolute, relative or both)"
            ))),
        }
    }
}

impl fmt::Display for ParseModes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.absolute, self.relative) {
            (true, true) => f.write_str("both"),
            (true, false) => f.write_str("absolute"),
            (false, true) => f.write_str("relative"),
            (false, false) => f.write_str("none"),
        }
    }
}

/// Reported when the driver had to skip a character to keep moving.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StallWarning {
    /// Byte offset at which no progress was made.
    pub position: usize,
    /// The word being scanned there, if any.
    pub word: Option<String>,
}

/// Find every temporal expression in `text`.
pub fn parse(text: &str, anchor: &Anchor, modes: ParseModes) -> Vec<TimeMatch> {
    parse_with_diagnostics(text, anchor, modes, |_| {})
}

/// [`parse`], invoking `on_stall` whenever the forward-progress fallback
/// fires. The callback never changes the result.
pub fn parse_with_diagnostics(
    text: &str,
    anchor: &Anchor,
    modes: ParseModes,
    mut on_stall: impl FnMut(&StallWarning),
) -> Vec<TimeMatch> {
    let mut scan = Scan::new(text, *anchor);

    while !scan.cursor.is_empty() {
        let start = scan.cursor.position();
        let word = scan.cursor.consume_word(false);

        match word {
            Some(word) => {
                for rule in modes.tables() {
                    if rule.apply(&mut scan, word, start) {
                        tracing::trace!(
                            rule = rule.name,
                            span = %scan.matches().last().map_or("", |m| m.span.as_str()),
                            "matched"
                        );
                        break;
                    }
                }
            }
            None => {
                scan.cursor.consume_non_word();
            }
        }

        if scan.cursor.position() <= start {
            let warning = StallWarning {
                position: start,
                word: word.map(str::to_string),
            };
            tracing::warn!(
                position = warning.position,
                word = warning.word.as_deref().unwrap_or(""),
                "parser did not advance, skipping a character"
            );
            on_stall(&warning);
            scan.cursor.seek(start);
            scan.cursor.consume_char();
        }
    }

    scan.into_matches()
}

// ── Tests ───────────────────────────────────────────────────────────────────
