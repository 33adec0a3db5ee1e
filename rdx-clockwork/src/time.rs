//! The `ClockTime` value type: a validated, calendar-free time of day.
//!
//! A `ClockTime` carries hours, minutes, seconds, and milliseconds, each held
//! within its valid range at all times. Arithmetic returns new values and
//! wraps around midnight in both directions; comparisons go through the
//! canonical scalar (total milliseconds since midnight), which the derived
//! field ordering agrees with.

use chrono::{DateTime, Local, NaiveTime, TimeZone, Timelike};
use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Milliseconds in one 24-hour day.
pub const MILLIS_PER_DAY: i64 = 24 * 3_600_000;

/// Errors raised by `ClockTime` construction, mutation, and parsing.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TimeError {
    /// A field was assigned a value outside its valid range.
    ///
    /// `max` is exclusive: valid values are `0..max`.
    #[error("time field `{field}` out of range: {value} (valid: 0..{max})")]
    FieldOutOfRange {
        field: &'static str,
        value: i64,
        max: u32,
    },

    /// The input string does not match `HH:MM[:SS][.mmm]` or `THH:MM:SS.mmmZ`.
    #[error("unparseable time string: {input:?}")]
    Parse { input: String },
}

/// A time of day with millisecond precision and no calendar date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClockTime {
    hours: u32,
    minutes: u32,
    seconds: u32,
    millis: u32,
}

impl ClockTime {
    /// Creates a `ClockTime` from explicit fields, validating each range.
    pub fn new(hours: u32, minutes: u32, seconds: u32, millis: u32) -> Result<Self, TimeError> {
        check_field("hours", hours, 24)?;
        check_field("minutes", minutes, 60)?;
        check_field("seconds", seconds, 60)?;
        check_field("milliseconds", millis, 1000)?;
        Ok(Self {
            hours,
            minutes,
            seconds,
            millis,
        })
    }

    /// Snapshot of the current local wall clock.
    pub fn now() -> Self {
        Self::from(Local::now().time())
    }

    /// Extracts the time-of-day components of a timezone-aware datetime.
    pub fn from_datetime<Tz: TimeZone>(dt: &DateTime<Tz>) -> Self {
        Self::from(dt.time())
    }

    /// Reconstructs a `ClockTime` from total milliseconds since midnight.
    ///
    /// Values outside `0..MILLIS_PER_DAY` wrap with Euclidean modulo, so a
    /// negative total lands at the end of the previous day:
    /// `from_millis(-1)` is `23:59:59.999`.
    pub fn from_millis(total: i64) -> Self {
        let wrapped = total.rem_euclid(MILLIS_PER_DAY);
        Self {
            hours: (wrapped / 3_600_000) as u32,
            minutes: (wrapped % 3_600_000 / 60_000) as u32,
            seconds: (wrapped % 60_000 / 1000) as u32,
            millis: (wrapped % 1000) as u32,
        }
    }

    // --- Field access ---

    pub fn hours(&self) -> u32 {
        self.hours
    }

    pub fn minutes(&self) -> u32 {
        self.minutes
    }

    pub fn seconds(&self) -> u32 {
        self.seconds
    }

    pub fn millis(&self) -> u32 {
        self.millis
    }

    /// Sets the hours field in place, revalidating it.
    pub fn set_hours(&mut self, hours: u32) -> Result<(), TimeError> {
        check_field("hours", hours, 24)?;
        self.hours = hours;
        Ok(())
    }

    /// Sets the minutes field in place, revalidating it.
    pub fn set_minutes(&mut self, minutes: u32) -> Result<(), TimeError> {
        check_field("minutes", minutes, 60)?;
        self.minutes = minutes;
        Ok(())
    }

    /// Sets the seconds field in place, revalidating it.
    pub fn set_seconds(&mut self, seconds: u32) -> Result<(), TimeError> {
        check_field("seconds", seconds, 60)?;
        self.seconds = seconds;
        Ok(())
    }

    /// Sets the milliseconds field in place, revalidating it.
    pub fn set_millis(&mut self, millis: u32) -> Result<(), TimeError> {
        check_field("milliseconds", millis, 1000)?;
        self.millis = millis;
        Ok(())
    }

    /// Returns a copy with the hours field replaced.
    pub fn with_hours(mut self, hours: u32) -> Result<Self, TimeError> {
        self.set_hours(hours)?;
        Ok(self)
    }

    /// Returns a copy with the minutes field replaced.
    pub fn with_minutes(mut self, minutes: u32) -> Result<Self, TimeError> {
        self.set_minutes(minutes)?;
        Ok(self)
    }

    /// Returns a copy with the seconds field replaced.
    pub fn with_seconds(mut self, seconds: u32) -> Result<Self, TimeError> {
        self.set_seconds(seconds)?;
        Ok(self)
    }

    /// Returns a copy with the milliseconds field replaced.
    pub fn with_millis(mut self, millis: u32) -> Result<Self, TimeError> {
        self.set_millis(millis)?;
        Ok(self)
    }

    // --- Canonical scalar and arithmetic ---

    /// Total milliseconds elapsed since midnight.
    ///
    /// This is the canonical scalar: all comparisons and arithmetic reduce
    /// to it.
    pub fn total_millis(&self) -> i64 {
        i64::from(self.hours) * 3_600_000
            + i64::from(self.minutes) * 60_000
            + i64::from(self.seconds) * 1000
            + i64::from(self.millis)
    }

    /// Returns a new value shifted by `delta` milliseconds, wrapping at
    /// midnight.
    pub fn add_millis(&self, delta: i64) -> Self {
        Self::from_millis(self.total_millis() + delta)
    }

    /// Returns a new value shifted by `delta` seconds.
    pub fn add_seconds(&self, delta: i64) -> Self {
        self.add_millis(delta * 1000)
    }

    /// Returns a new value shifted by `delta` minutes.
    pub fn add_minutes(&self, delta: i64) -> Self {
        self.add_millis(delta * 60_000)
    }

    /// Returns a new value shifted by `delta` hours.
    pub fn add_hours(&self, delta: i64) -> Self {
        self.add_millis(delta * 3_600_000)
    }

    /// Returns a new value shifted backwards by `delta` milliseconds.
    pub fn sub_millis(&self, delta: i64) -> Self {
        self.add_millis(-delta)
    }

    // --- Comparison ---

    /// True if `self` falls earlier in the day than `other`.
    pub fn is_before(&self, other: &Self) -> bool {
        self.total_millis() < other.total_millis()
    }

    /// True if `self` falls later in the day than `other`.
    pub fn is_after(&self, other: &Self) -> bool {
        self.total_millis() > other.total_millis()
    }

    // --- String forms ---

    /// ISO-like form: `THH:MM:SS.mmmZ`.
    pub fn to_iso_string(&self) -> String {
        format!(
            "T{:02}:{:02}:{:02}.{:03}Z",
            self.hours, self.minutes, self.seconds, self.millis
        )
    }
}

impl From<NaiveTime> for ClockTime {
    fn from(t: NaiveTime) -> Self {
        Self {
            hours: t.hour(),
            minutes: t.minute(),
            seconds: t.second(),
            // Leap seconds surface as nanos >= 1s; clamp into range.
            millis: (t.nanosecond() / 1_000_000).min(999),
        }
    }
}

/// Zero-padded `HH:MM:SS` (milliseconds are not rendered).
impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}:{:02}:{:02}",
            self.hours, self.minutes, self.seconds
        )
    }
}

impl FromStr for ClockTime {
    type Err = TimeError;

    /// Parses `HH:MM`, `HH:MM:SS`, `HH:MM:SS.mmm`, or the ISO-like
    /// `THH:MM:SS.mmmZ` form. Structurally malformed input fails with
    /// `TimeError::Parse`; fields that parse but fall out of range fail with
    /// `TimeError::FieldOutOfRange`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parse_err = || TimeError::Parse {
            input: s.to_string(),
        };

        let mut core = s;
        if let Some(stripped) = core.strip_prefix('T') {
            core = stripped.strip_suffix('Z').ok_or_else(parse_err)?;
        }

        let (clock, millis_part) = match core.split_once('.') {
            Some((clock, millis)) => (clock, Some(millis)),
            None => (core, None),
        };

        let mut parts = clock.split(':');
        let hours = parse_component(parts.next(), 2).ok_or_else(parse_err)?;
        let minutes = parse_component(parts.next(), 2).ok_or_else(parse_err)?;
        let seconds = match parts.next() {
            Some(sec) => parse_component(Some(sec), 2).ok_or_else(parse_err)?,
            None => 0,
        };
        if parts.next().is_some() {
            return Err(parse_err());
        }
        let millis = match millis_part {
            Some(ms) => parse_component(Some(ms), 3).ok_or_else(parse_err)?,
            None => 0,
        };

        Self::new(hours, minutes, seconds, millis)
    }
}

/// Accepts exactly `width` ASCII digits.
fn parse_component(part: Option<&str>, width: usize) -> Option<u32> {
    let part = part?;
    if part.len() != width || !part.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    part.parse().ok()
}

fn check_field(field: &'static str, value: u32, max: u32) -> Result<(), TimeError> {
    if value >= max {
        return Err(TimeError::FieldOutOfRange {
            field,
            value: i64::from(value),
            max,
        });
    }
    Ok(())
}

impl Serialize for ClockTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_iso_string())
    }
}

impl<'de> Deserialize<'de> for ClockTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(D::Error::custom)
    }
}
