//! Assemble a candidate recovery instant from calendar and time-of-day input.
//!
//! The picker owns a selected UTC day plus hour, minute, and second fields.
//! Each field is clamped to its range on its own before the instant is built,
//! so a stray `"75"` in the minutes box becomes `59` rather than rolling over
//! into the next hour.

use chrono::{NaiveDate, NaiveTime, Timelike};

use crate::timeline::Timeline;
use crate::timestamp::AbsoluteTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Candidate {
    day: NaiveDate,
    hour: u32,
    minute: u32,
    second: u32,
}

impl Candidate {
    /// Build from numeric fields, clamping hour to 0..=23 and minute and
    /// second to 0..=59.
    pub fn new(day: NaiveDate, hour: i64, minute: i64, second: i64) -> Self {
        Self {
            day,
            hour: clamp_field(hour, 23),
            minute: clamp_field(minute, 59),
            second: clamp_field(second, 59),
        }
    }

    /// Build from raw text-box contents. Each field is read as its leading
    /// integer (`"07"` → 7, `"12abc"` → 12); anything without one reads as 0.
    pub fn from_text_fields(day: NaiveDate, hour: &str, minute: &str, second: &str) -> Self {
        Self::new(
            day,
            leading_integer(hour),
            leading_integer(minute),
            leading_integer(second),
        )
    }

    /// The picker's position for `instant`, dropping sub-second precision.
    pub fn from_instant(instant: AbsoluteTime) -> Self {
        Self {
            day: instant.date_naive(),
            hour: instant.hour(),
            minute: instant.minute(),
            second: instant.second(),
        }
    }

    /// Initial selection for a freshly loaded window: the latest recoverable
    /// whole second. An interval too short to hold a whole second is skipped
    /// in favour of an earlier one; `None` when no interval holds one.
    pub fn default_for(timeline: &Timeline) -> Option<Self> {
        timeline.intervals().iter().rev().find_map(|iv| {
            let candidate = Self::from_instant(iv.end);
            (candidate.instant() >= iv.start).then_some(candidate)
        })
    }

    /// Same time of day on another date.
    pub fn with_day(self, day: NaiveDate) -> Self {
        Self { day, ..self }
    }

    /// Same date, new (clamped) time of day.
    pub fn with_time(self, hour: i64, minute: i64, second: i64) -> Self {
        Self::new(self.day, hour, minute, second)
    }

    pub fn day(&self) -> NaiveDate {
        self.day
    }

    pub fn hour(&self) -> u32 {
        self.hour
    }

    pub fn minute(&self) -> u32 {
        self.minute
    }

    pub fn second(&self) -> u32 {
        self.second
    }

    /// The assembled UTC instant.
    pub fn instant(&self) -> AbsoluteTime {
        // Fields are clamped on construction, so the time always exists.
        let time = NaiveTime::from_hms_opt(self.hour, self.minute, self.second)
            .unwrap_or(NaiveTime::MIN);
        self.day.and_time(time).and_utc()
    }

    /// `YYYY-MM-DD` of the selected day, for display.
    pub fn day_label(&self) -> String {
        self.day.format("%Y-%m-%d").to_string()
    }
}

fn clamp_field(value: i64, max: u32) -> u32 {
    value.clamp(0, i64::from(max)) as u32
}

/// Optional sign followed by ASCII digits at the start of `s`, after leading
/// whitespace. Saturates instead of overflowing.
fn leading_integer(s: &str) -> i64 {
    let s = s.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };

    let magnitude = digits
        .bytes()
        .take_while(u8::is_ascii_digit)
        .fold(0i64, |acc, b| {
            acc.saturating_mul(10).saturating_add(i64::from(b - b'0'))
        });

    if negative {
        -magnitude
    } else {
        magnitude
    }
}
