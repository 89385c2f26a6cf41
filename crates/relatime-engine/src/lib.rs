//! # relatime-engine
//!
//! Finds dates, times and durations in chat messages and anchors them to
//! concrete, timezone-aware instants.
//!
//! The engine turns phrases like "next Friday at 5pm", "in 2 hours" or
//! "first day of last month" into a [`TimeMatch`] carrying the recognized
//! span, the instant it denotes and the precision it should be shown at.
//! It is a hand-written scanner with backtracking: no grammar library, no
//! I/O, and no ambient clock. "Now" and the timezone arrive in an [`Anchor`].
//!
//! ```
//! use relatime_engine::{parse, Anchor, ParseModes};
//!
//! let anchor = Anchor::parse("2024-03-15T10:00:00Z", "UTC").unwrap();
//! let found = parse("call me in 2 hours", &anchor, ParseModes::ALL);
//! assert_eq!(found[0].span, "in 2 hours");
//! assert_eq!(found[0].instant.to_rfc3339(), "2024-03-15T12:00:00+00:00");
//! ```
//!
//! ## Modules
//!
//! - [`cursor`]: scanning primitives over the source text
//! - [`duration`]: units, compound durations and duration consumers
//! - [`consume`]: clock times, weekdays, months and years
//! - [`detect`]: the absolute and relative detector tables
//! - [`parser`]: the driver loop and parse modes
//! - [`zone`]: timezones and the parse anchor
//! - [`render`]: timestamp markup, reply lines, humanized durations
//! - [`error`]: Error types

pub mod consume;
pub mod cursor;
pub mod detect;
pub mod duration;
pub mod error;
pub mod parser;
pub mod render;
pub mod zone;

pub use cursor::Cursor;
pub use detect::{Detector, Rule, Scan, TimeMatch};
pub use duration::{
    compare_units, parse_duration, parse_duration_chain, smallest_unit, CompoundDuration,
    DurationUnit, Precision,
};
pub use error::EngineError;
pub use parser::{parse, parse_with_diagnostics, ParseModes, StallWarning};
pub use render::{humanize, render_match, render_reply, RenderOptions, Style};
pub use zone::{Anchor, Zone};
