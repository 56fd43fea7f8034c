//! Day-level date handling.
//!
//! Every date that reaches the grid or the store goes through [`DayNormalizer`]
//! and comes out as a [`CanonicalDay`]: a calendar day pinned to wall-clock noon
//! in one reference timezone. Noon keeps every serialized form at least twelve
//! hours away from either day boundary.

use chrono::{
    DateTime, Datelike, Days, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Utc, Weekday,
};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use thiserror::Error;

pub const DEFAULT_TIMEZONE: Tz = chrono_tz::Australia::Melbourne;

/// Days keep four-digit years so every key stays `yyyy-mm-dd`.
const FIRST_YEAR: i32 = 1;
const LAST_YEAR: i32 = 9999;

const KEY_FORMAT: &str = "%Y-%m-%d";
const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DateError {
    #[error("invalid date: {0:?}")]
    Invalid(String),
    #[error("unknown timezone: {0:?}")]
    UnknownTimezone(String),
    #[error("date out of range: {0}")]
    OutOfRange(String),
}

/// A calendar day in the reference timezone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CanonicalDay(NaiveDate);

impl CanonicalDay {
    fn new(date: NaiveDate) -> Result<Self, DateError> {
        if (FIRST_YEAR..=LAST_YEAR).contains(&date.year()) {
            Ok(Self(date))
        } else {
            Err(DateError::OutOfRange(date.to_string()))
        }
    }

    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).and_then(|date| Self::new(date).ok())
    }

    pub fn at_noon(self) -> NaiveDateTime {
        self.0.and_time(noon())
    }

    pub fn weekday(self) -> Weekday {
        self.0.weekday()
    }

    /// Monday on or before this day. 0001-01-01 is a Monday, so this never
    /// leaves the supported range.
    pub fn week_start(self) -> Self {
        let back = Days::new(u64::from(self.0.weekday().num_days_from_monday()));
        self.0.checked_sub_days(back).map_or(self, Self)
    }

    pub fn add_days(self, n: i64) -> Result<Self, DateError> {
        let days = Days::new(n.unsigned_abs());
        let shifted = if n >= 0 {
            self.0.checked_add_days(days)
        } else {
            self.0.checked_sub_days(days)
        };
        shifted
            .ok_or_else(|| DateError::OutOfRange(format!("{self} {n:+} days")))
            .and_then(Self::new)
    }

    /// `yyyy-mm-dd` built from the calendar fields.
    pub fn day_key(self) -> String {
        self.0.format(KEY_FORMAT).to_string()
    }

    /// `yyyy-mm-ddT12:00:00`, deliberately without an offset.
    pub fn to_storage_timestamp(self) -> String {
        format!("{}T12:00:00", self.day_key())
    }

    pub fn week_label(self) -> String {
        let iso = self.0.iso_week();
        format!("{}-W{:02}", iso.year(), iso.week())
    }

    pub fn display(self) -> String {
        self.0.format("%d/%m/%Y").to_string()
    }

    /// Column header such as `Mon 4`.
    pub fn day_header(self) -> String {
        format!("{} {}", self.0.format("%a"), self.0.day())
    }
}

impl fmt::Display for CanonicalDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.day_key())
    }
}

impl FromStr for CanonicalDay {
    type Err = DateError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        NaiveDate::parse_from_str(value.trim(), KEY_FORMAT)
            .map_err(|_| DateError::Invalid(value.to_string()))
            .and_then(Self::new)
    }
}

impl TryFrom<String> for CanonicalDay {
    type Error = DateError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CanonicalDay> for String {
    fn from(day: CanonicalDay) -> Self {
        day.day_key()
    }
}

/// Anything the normalizer accepts.
#[derive(Debug, Clone, Copy)]
pub enum DateInput<'a> {
    Day(CanonicalDay),
    Instant(DateTime<FixedOffset>),
    Text(&'a str),
}

impl From<CanonicalDay> for DateInput<'_> {
    fn from(day: CanonicalDay) -> Self {
        DateInput::Day(day)
    }
}

impl From<DateTime<FixedOffset>> for DateInput<'_> {
    fn from(instant: DateTime<FixedOffset>) -> Self {
        DateInput::Instant(instant)
    }
}

impl From<DateTime<Utc>> for DateInput<'_> {
    fn from(instant: DateTime<Utc>) -> Self {
        DateInput::Instant(instant.fixed_offset())
    }
}

impl<'a> From<&'a str> for DateInput<'a> {
    fn from(text: &'a str) -> Self {
        DateInput::Text(text)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayNormalizer {
    tz: Tz,
}

impl Default for DayNormalizer {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEZONE)
    }
}

impl DayNormalizer {
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }

    pub fn from_name(name: &str) -> Result<Self, DateError> {
        name.parse::<Tz>()
            .map(Self::new)
            .map_err(|_| DateError::UnknownTimezone(name.to_string()))
    }

    pub fn timezone(&self) -> Tz {
        self.tz
    }

    pub fn canonicalize<'a>(&self, input: impl Into<DateInput<'a>>) -> Result<CanonicalDay, DateError> {
        match input.into() {
            DateInput::Day(day) => Ok(day),
            DateInput::Instant(instant) => self.day_of_instant(instant),
            DateInput::Text(text) => self.parse_text(text),
        }
    }

    pub fn today(&self) -> CanonicalDay {
        CanonicalDay(Utc::now().with_timezone(&self.tz).date_naive())
    }

    fn day_of_instant(&self, instant: DateTime<FixedOffset>) -> Result<CanonicalDay, DateError> {
        CanonicalDay::new(instant.with_timezone(&self.tz).date_naive())
    }

    fn parse_text(&self, text: &str) -> Result<CanonicalDay, DateError> {
        let trimmed = text.trim();
        // A bare date is a calendar day, never an instant.
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, KEY_FORMAT) {
            return CanonicalDay::new(date);
        }
        if let Ok(instant) = DateTime::parse_from_rfc3339(trimmed) {
            return self.day_of_instant(instant);
        }
        NAIVE_FORMATS
            .iter()
            .find_map(|format| NaiveDateTime::parse_from_str(trimmed, format).ok())
            .ok_or_else(|| DateError::Invalid(text.to_string()))
            .and_then(|wall_clock| CanonicalDay::new(wall_clock.date()))
    }
}

fn noon() -> NaiveTime {
    NaiveTime::from_hms_opt(12, 0, 0).unwrap_or(NaiveTime::MIN)
}
