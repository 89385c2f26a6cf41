//! Timezones and the anchor every parse is resolved against.
//!
//! Nothing in the engine reads the system clock or a process-wide timezone:
//! the caller hands an [`Anchor`] (a "now" instant plus a [`Zone`]) to each
//! parse, which keeps results reproducible and the engine safe to call from
//! many request handlers at once.

use chrono::{
    DateTime, Days, FixedOffset, LocalResult, Months, NaiveDate, NaiveDateTime, Offset, TimeDelta,
    TimeZone, Utc,
};
use chrono_tz::Tz;
use regex::Regex;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use crate::duration::{CompoundDuration, DurationUnit};
use crate::error::{EngineError, Result};

/// A user's timezone: an IANA zone, or a fixed offset from UTC with minute
/// resolution (for people who just say "UTC+5:30").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Zone {
    Named(Tz),
    Fixed(FixedOffset),
}

fn offset_regex() -> &'static Regex {
    static OFFSET: OnceLock<Regex> = OnceLock::new();
    OFFSET.get_or_init(|| {
        Regex::new(r"(?i)^(?:utc|gmt)?\s*([+-])\s*([0-9]{1,2})(?::?([0-9]{2}))?$").unwrap()
    })
}

impl Zone {
    pub const UTC: Zone = Zone::Named(Tz::UTC);

    /// Parse an IANA name (`"America/New_York"`) or an offset (`"+05:30"`,
    /// `"UTC-8"`, `"GMT+0530"`).
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidTimezone`] for anything else, including
    /// offsets of 24 hours or more.
    pub fn parse(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        if let Ok(tz) = trimmed.parse::<Tz>() {
            return Ok(Zone::Named(tz));
        }

        let invalid = || EngineError::InvalidTimezone(format!("'{s}'"));
        let caps = offset_regex().captures(trimmed).ok_or_else(invalid)?;
        let hours: i32 = caps[2].parse().map_err(|_| invalid())?;
        let minutes: i32 = caps
            .get(3)
            .map_or(Ok(0), |m| m.as_str().parse())
            .map_err(|_| invalid())?;
        if hours > 23 || minutes > 59 {
            return Err(invalid());
        }
        let seconds = (hours * 3600 + minutes * 60) * if &caps[1] == "-" { -1 } else { 1 };
        FixedOffset::east_opt(seconds)
            .map(Zone::Fixed)
            .ok_or_else(invalid)
    }

    /// A fixed offset given in fractional hours, e.g. `5.3` for UTC+05:18.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidTimezone`] when the offset is not finite
    /// or not strictly within ±24 hours.
    pub fn from_hours(hours: f64) -> Result<Self> {
        let seconds = (hours * 60.0).round() * 60.0;
        if !seconds.is_finite() || seconds.abs() >= 86_400.0 {
            return Err(EngineError::InvalidTimezone(format!("{hours} hours")));
        }
        FixedOffset::east_opt(seconds as i32)
            .map(Zone::Fixed)
            .ok_or_else(|| EngineError::InvalidTimezone(format!("{hours} hours")))
    }

    /// Wall-clock time in this zone at `instant`.
    pub fn local(&self, instant: DateTime<Utc>) -> NaiveDateTime {
        match self {
            Zone::Named(tz) => instant.with_timezone(tz).naive_local(),
            Zone::Fixed(offset) => instant.with_timezone(offset).naive_local(),
        }
    }

    /// `instant` expressed with this zone's offset at that moment.
    pub fn instant(&self, instant: DateTime<Utc>) -> DateTime<FixedOffset> {
        match self {
            Zone::Named(tz) => instant.with_timezone(tz).fixed_offset(),
            Zone::Fixed(offset) => instant.with_timezone(offset),
        }
    }

    /// The instant a wall-clock time denotes in this zone.
    ///
    /// Ambiguous times (DST fall-back) take the earlier instant; times that
    /// do not exist (DST spring-forward) are moved one hour later.
    pub fn resolve(&self, local: NaiveDateTime) -> Option<DateTime<FixedOffset>> {
        match self {
            Zone::Fixed(offset) => offset.from_local_datetime(&local).single(),
            Zone::Named(tz) => {
                let resolved = match tz.from_local_datetime(&local) {
                    LocalResult::Single(dt) => dt,
                    LocalResult::Ambiguous(earliest, _) => earliest,
                    LocalResult::None => {
                        let shifted = local.checked_add_signed(TimeDelta::hours(1))?;
                        tz.from_local_datetime(&shifted).earliest()?
                    }
                };
                Some(resolved.fixed_offset())
            }
        }
    }

    /// The UTC offset at `instant`, e.g. `"-05:00"`.
    pub fn utc_offset(&self, instant: DateTime<Utc>) -> String {
        format_utc_offset(self.instant(instant).offset().fix().local_minus_utc())
    }
}

impl Default for Zone {
    fn default() -> Self {
        Zone::UTC
    }
}

impl FromStr for Zone {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        Zone::parse(s)
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Zone::Named(tz) => f.write_str(tz.name()),
            Zone::Fixed(offset) => write!(f, "UTC{}", format_utc_offset(offset.local_minus_utc())),
        }
    }
}

/// Format an offset in seconds as `"+HH:MM"`.
fn format_utc_offset(offset_secs: i32) -> String {
    let sign = if offset_secs >= 0 { "+" } else { "-" };
    let abs_secs = offset_secs.unsigned_abs();
    let hours = abs_secs / 3600;
    let minutes = (abs_secs % 3600) / 60;
    format!("{sign}{hours:02}:{minutes:02}")
}

// ── Anchor ──────────────────────────────────────────────────────────────────

/// The "now" and timezone a parse is resolved against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Anchor {
    now: DateTime<Utc>,
    zone: Zone,
}

impl Anchor {
    pub fn new(now: DateTime<Utc>, zone: Zone) -> Self {
        Self { now, zone }
    }

    /// Anchor at the current system time.
    pub fn current(zone: Zone) -> Self {
        Self::new(Utc::now(), zone)
    }

    /// Build an anchor from an RFC 3339 "now" and a timezone identifier.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidDatetime`] or
    /// [`EngineError::InvalidTimezone`] for malformed input.
    pub fn parse(now: &str, timezone: &str) -> Result<Self> {
        let now = DateTime::parse_from_rfc3339(now.trim())
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| EngineError::InvalidDatetime(format!("'{now}': {e}")))?;
        Ok(Self::new(now, Zone::parse(timezone)?))
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }

    pub fn zone(&self) -> Zone {
        self.zone
    }

    /// "now" in the anchor's zone.
    pub fn zoned_now(&self) -> DateTime<FixedOffset> {
        self.zone.instant(self.now)
    }

    pub fn local_now(&self) -> NaiveDateTime {
        self.zone.local(self.now)
    }

    pub fn today(&self) -> NaiveDate {
        self.local_now().date()
    }

    pub fn at_local(&self, local: NaiveDateTime) -> Option<DateTime<FixedOffset>> {
        self.zone.resolve(local)
    }

    /// Local midnight starting `date`.
    pub fn start_of_day(&self, date: NaiveDate) -> Option<DateTime<FixedOffset>> {
        self.zone.resolve(date.and_hms_opt(0, 0, 0)?)
    }

    /// Move "now" by `duration`, forwards when `sign` is positive.
    ///
    /// Years, months, weeks and days shift the local calendar date and keep
    /// the wall-clock time (months clamp to the end of shorter months).
    /// Hours, minutes and seconds are then added as elapsed time. `None` on
    /// overflow.
    pub fn offset_by(
        &self,
        duration: &CompoundDuration,
        sign: i64,
    ) -> Option<DateTime<FixedOffset>> {
        let months = duration
            .get(DurationUnit::Year)
            .checked_mul(12)?
            .checked_add(duration.get(DurationUnit::Month))?
            .checked_mul(sign)?;
        let days = duration
            .get(DurationUnit::Week)
            .checked_mul(7)?
            .checked_add(duration.get(DurationUnit::Day))?
            .checked_mul(sign)?;
        let seconds = duration
            .get(DurationUnit::Hour)
            .checked_mul(3600)?
            .checked_add(duration.get(DurationUnit::Minute).checked_mul(60)?)?
            .checked_add(duration.get(DurationUnit::Second))?
            .checked_mul(sign)?;

        let base = if months == 0 && days == 0 {
            self.now
        } else {
            let local = self.local_now();
            let date = shift_months(local.date(), months)?;
            let date = shift_days(date, days)?;
            self.zone.resolve(date.and_time(local.time()))?.with_timezone(&Utc)
        };

        let shifted = base.checked_add_signed(TimeDelta::try_seconds(seconds)?)?;
        Some(self.zone.instant(shifted))
    }
}

/// Add a signed number of months, clamping the day of month.
pub(crate) fn shift_months(date: NaiveDate, months: i64) -> Option<NaiveDate> {
    let magnitude = u32::try_from(months.unsigned_abs()).ok()?;
    if months >= 0 {
        date.checked_add_months(Months::new(magnitude))
    } else {
        date.checked_sub_months(Months::new(magnitude))
    }
}

/// Add a signed number of days.
pub(crate) fn shift_days(date: NaiveDate, days: i64) -> Option<NaiveDate> {
    if days >= 0 {
        date.checked_add_days(Days::new(days.unsigned_abs()))
    } else {
        date.checked_sub_days(Days::new(days.unsigned_abs()))
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────
