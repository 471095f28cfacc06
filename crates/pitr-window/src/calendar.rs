//! Calendar-facing bounds queries over a [`Timeline`].
//!
//! Two notions are kept deliberately apart here:
//!
//! - **Navigable**: a day whose span touches the overall window
//!   `[earliest, latest]`. The calendar lets the user land on it even if it
//!   sits entirely inside a gap.
//! - **Recoverable**: an instant inside some interval. Only
//!   [`validate`](fn@crate::validate) decides this.
//!
//! All days are UTC civil dates. A day spans `00:00:00` through `23:59:59`.

use std::fmt;

use chrono::{DateTime, Datelike, Days, Months, NaiveDate, NaiveTime, Utc};
use serde::Serialize;

use crate::error::{PitrError, Result};
use crate::options::WeekStartDay;
use crate::timeline::Timeline;
use crate::timestamp::{serialize_iso, AbsoluteTime};

/// Cells in a month grid: six full weeks.
pub const GRID_CELLS: usize = 42;

const SECONDS_IN_DAY_SPAN: i64 = 86_399;

// ── Day bounds ──────────────────────────────────────────────────────────────

/// `[00:00:00, 23:59:59]` of `day`, in UTC.
pub fn day_bounds(day: NaiveDate) -> (AbsoluteTime, AbsoluteTime) {
    let start = day.and_time(NaiveTime::MIN).and_utc();
    (start, start + chrono::Duration::seconds(SECONDS_IN_DAY_SPAN))
}

/// One contiguous recoverable span within a single day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AllowedRange {
    #[serde(serialize_with = "serialize_iso")]
    pub min: AbsoluteTime,
    #[serde(serialize_with = "serialize_iso")]
    pub max: AbsoluteTime,
}

/// Intersect every timeline interval with `day`, clipped to the day's
/// bounds. Display only; validity is decided by [`validate`](fn@crate::validate).
pub fn allowed_ranges_for_day(day: NaiveDate, timeline: &Timeline) -> Vec<AllowedRange> {
    let (day_start, day_end) = day_bounds(day);
    timeline
        .intervals()
        .iter()
        .filter(|iv| iv.start <= day_end && iv.end >= day_start)
        .map(|iv| AllowedRange {
            min: iv.start.max(day_start),
            max: iv.end.min(day_end),
        })
        .collect()
}

/// Whether the day's span touches the overall window. Gaps are ignored, so a
/// day with no recoverable second can still be navigable. An empty timeline
/// has no window and no navigable days.
pub fn is_day_within_window(day: NaiveDate, timeline: &Timeline) -> bool {
    let (day_start, day_end) = day_bounds(day);
    timeline
        .bounds()
        .is_some_and(|(earliest, latest)| day_start <= latest && day_end >= earliest)
}

/// Human-readable label for a day's allowed ranges, e.g.
/// `"00:00:00 - 12:30:00 UTC, 14:00:00 - 23:59:59 UTC"`.
pub fn allowed_ranges_label(ranges: &[AllowedRange]) -> String {
    if ranges.is_empty() {
        return "No recoverable time on this day".to_string();
    }
    ranges
        .iter()
        .map(|r| {
            format!(
                "{} - {} UTC",
                r.min.format("%H:%M:%S"),
                r.max.format("%H:%M:%S")
            )
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Parse a `YYYY-MM-DD` calendar day.
///
/// # Errors
///
/// Returns [`PitrError::InvalidDate`] when `s` is not a valid date.
pub fn parse_day(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|e| PitrError::InvalidDate(format!("'{}': {}", s, e)))
}

// ── Month navigation ────────────────────────────────────────────────────────

/// A displayed calendar month, identified by its first day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CalendarMonth {
    first: NaiveDate,
}

impl CalendarMonth {
    /// Returns `None` for an out-of-range year or a month outside 1 to 12.
    pub fn new(year: i32, month: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, 1).map(|first| Self { first })
    }

    /// The month containing `date`.
    pub fn containing(date: NaiveDate) -> Self {
        Self {
            first: date - Days::new(u64::from(date.day0())),
        }
    }

    /// The month containing `instant`'s UTC date.
    pub fn containing_instant(instant: DateTime<Utc>) -> Self {
        Self::containing(instant.date_naive())
    }

    /// Parse `YYYY-MM`.
    ///
    /// # Errors
    ///
    /// Returns [`PitrError::InvalidDate`] when `s` is not a valid month.
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        NaiveDate::parse_from_str(&format!("{s}-01"), "%Y-%m-%d")
            .map(|first| Self { first })
            .map_err(|e| PitrError::InvalidDate(format!("'{}': {}", s, e)))
    }

    pub fn year(&self) -> i32 {
        self.first.year()
    }

    pub fn month(&self) -> u32 {
        self.first.month()
    }

    pub fn first_day(&self) -> NaiveDate {
        self.first
    }

    pub fn previous(&self) -> Option<Self> {
        self.first
            .checked_sub_months(Months::new(1))
            .map(|first| Self { first })
    }

    pub fn next(&self) -> Option<Self> {
        self.first
            .checked_add_months(Months::new(1))
            .map(|first| Self { first })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        Self::containing(date) == *self
    }
}

impl fmt::Display for CalendarMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.first.format("%Y-%m"))
    }
}

/// Whether the calendar may step back from `displayed`: only while its first
/// day is strictly after the first day of the month holding the earliest
/// recoverable instant. Unrestricted for an empty timeline.
pub fn can_go_previous(displayed: CalendarMonth, timeline: &Timeline) -> bool {
    match timeline.earliest() {
        None => true,
        Some(earliest) => displayed > CalendarMonth::containing_instant(earliest),
    }
}

/// Mirror of [`can_go_previous`] against the latest recoverable instant.
pub fn can_go_next(displayed: CalendarMonth, timeline: &Timeline) -> bool {
    match timeline.latest() {
        None => true,
        Some(latest) => displayed < CalendarMonth::containing_instant(latest),
    }
}

// ── Month grid ──────────────────────────────────────────────────────────────

/// Flags for one cell of the month grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarDay {
    pub date: NaiveDate,
    /// Belongs to the displayed month rather than the padding.
    pub in_month: bool,
    /// Navigable; see [`is_day_within_window`].
    pub in_range: bool,
    pub is_selected: bool,
    pub is_today: bool,
}

/// The 42-cell grid for `displayed`, starting on the `week_start` day on or
/// before the 1st. `today` comes from the caller; nothing here reads a clock.
pub fn month_grid(
    displayed: CalendarMonth,
    timeline: &Timeline,
    selected: Option<NaiveDate>,
    today: NaiveDate,
    week_start: WeekStartDay,
) -> Vec<CalendarDay> {
    let first = displayed.first_day();
    let lead = week_start.days_from_start(first.weekday());
    let grid_start = first
        .checked_sub_days(Days::new(u64::from(lead)))
        .unwrap_or(first);

    grid_start
        .iter_days()
        .take(GRID_CELLS)
        .map(|date| CalendarDay {
            date,
            in_month: displayed.contains(date),
            in_range: is_day_within_window(date, timeline),
            is_selected: selected == Some(date),
            is_today: date == today,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timeline::{build_timeline, RawInterval};
    use crate::validate;
    use chrono::{TimeZone, Weekday};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> AbsoluteTime {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
    }

    /// Recoverable Jan 10 06:00 to Jan 12 18:00, then Jan 20 to Feb 3 12:00.
    fn timeline() -> Timeline {
        build_timeline(
            &[
                RawInterval::new("2024-01-10T06:00:00Z", "2024-01-12T18:00:00Z"),
                RawInterval::new("2024-01-20T00:00:00Z", "2024-02-03T12:00:00Z"),
            ],
            None,
            None,
        )
    }

    // ── day bounds and ranges ───────────────────────────────────────────

    #[test]
    fn test_day_bounds_span() {
        let (start, end) = day_bounds(date(2024, 1, 10));
        assert_eq!(start, utc(2024, 1, 10, 0, 0, 0));
        assert_eq!(end, utc(2024, 1, 10, 23, 59, 59));
    }

    #[test]
    fn test_allowed_ranges_clipped_to_day() {
        let ranges = allowed_ranges_for_day(date(2024, 1, 10), &timeline());
        assert_eq!(
            ranges,
            vec![AllowedRange {
                min: utc(2024, 1, 10, 6, 0, 0),
                max: utc(2024, 1, 10, 23, 59, 59),
            }]
        );

        let ranges = allowed_ranges_for_day(date(2024, 1, 12), &timeline());
        assert_eq!(ranges[0].min, utc(2024, 1, 12, 0, 0, 0));
        assert_eq!(ranges[0].max, utc(2024, 1, 12, 18, 0, 0));
    }

    #[test]
    fn test_allowed_ranges_multiple_in_one_day() {
        let timeline = build_timeline(
            &[
                RawInterval::new("2024-05-01T00:00:00Z", "2024-05-01T08:00:00Z"),
                RawInterval::new("2024-05-01T12:00:00Z", "2024-05-01T20:00:00Z"),
            ],
            None,
            None,
        );
        let ranges = allowed_ranges_for_day(date(2024, 5, 1), &timeline);
        assert_eq!(ranges.len(), 2);
        assert_eq!(
            allowed_ranges_label(&ranges),
            "00:00:00 - 08:00:00 UTC, 12:00:00 - 20:00:00 UTC"
        );
    }

    #[test]
    fn test_allowed_ranges_empty_in_gap_day() {
        let ranges = allowed_ranges_for_day(date(2024, 1, 15), &timeline());
        assert!(ranges.is_empty());
        assert_eq!(allowed_ranges_label(&ranges), "No recoverable time on this day");
    }

    // ── navigable vs recoverable ────────────────────────────────────────

    #[test]
    fn test_gap_day_is_navigable_but_not_recoverable() {
        let timeline = timeline();
        let gap_day = date(2024, 1, 15);
        assert!(is_day_within_window(gap_day, &timeline));
        assert!(allowed_ranges_for_day(gap_day, &timeline).is_empty());
        assert!(!validate(utc(2024, 1, 15, 12, 0, 0), &timeline).is_valid);
    }

    #[test]
    fn test_days_outside_window_not_navigable() {
        let timeline = timeline();
        assert!(!is_day_within_window(date(2024, 1, 9), &timeline));
        assert!(is_day_within_window(date(2024, 1, 10), &timeline));
        assert!(is_day_within_window(date(2024, 2, 3), &timeline));
        assert!(!is_day_within_window(date(2024, 2, 4), &timeline));
    }

    #[test]
    fn test_empty_timeline_has_no_navigable_days() {
        assert!(!is_day_within_window(date(2024, 1, 10), &Timeline::default()));
    }

    // ── month navigation ────────────────────────────────────────────────

    #[test]
    fn test_month_navigation_bounds() {
        let timeline = timeline();
        let jan = CalendarMonth::new(2024, 1).unwrap();
        let feb = CalendarMonth::new(2024, 2).unwrap();
        assert!(!can_go_previous(jan, &timeline));
        assert!(can_go_next(jan, &timeline));
        assert!(can_go_previous(feb, &timeline));
        assert!(!can_go_next(feb, &timeline));
    }

    #[test]
    fn test_month_navigation_unrestricted_when_empty() {
        let month = CalendarMonth::new(2024, 6).unwrap();
        assert!(can_go_previous(month, &Timeline::default()));
        assert!(can_go_next(month, &Timeline::default()));
    }

    #[test]
    fn test_month_arithmetic_across_year() {
        let dec = CalendarMonth::new(2023, 12).unwrap();
        assert_eq!(dec.next(), CalendarMonth::new(2024, 1));
        assert_eq!(CalendarMonth::new(2024, 1).unwrap().previous(), Some(dec));
        assert_eq!(CalendarMonth::containing(date(2024, 2, 29)).to_string(), "2024-02");
    }

    #[test]
    fn test_month_parse() {
        let month = CalendarMonth::parse("2024-03").unwrap();
        assert_eq!((month.year(), month.month()), (2024, 3));
        assert!(CalendarMonth::parse("2024-13").is_err());
        assert!(CalendarMonth::new(2024, 0).is_none());
    }

    #[test]
    fn test_parse_day_errors() {
        assert_eq!(parse_day("2024-02-29").unwrap(), date(2024, 2, 29));
        let err = parse_day("2023-02-29").unwrap_err();
        assert!(err.to_string().contains("Invalid date"), "got: {err}");
    }

    // ── month grid ──────────────────────────────────────────────────────

    #[test]
    fn test_grid_monday_start() {
        // Jan 1 2024 is a Monday, so there is no leading padding.
        let grid = month_grid(
            CalendarMonth::new(2024, 1).unwrap(),
            &timeline(),
            None,
            date(2024, 1, 15),
            WeekStartDay::Monday,
        );
        assert_eq!(grid.len(), GRID_CELLS);
        assert_eq!(grid[0].date, date(2024, 1, 1));
        assert_eq!(grid[0].date.weekday(), Weekday::Mon);
        assert!(grid[30].in_month);
        assert!(!grid[31].in_month);
    }

    #[test]
    fn test_grid_sunday_start_pads_previous_month() {
        let grid = month_grid(
            CalendarMonth::new(2024, 1).unwrap(),
            &timeline(),
            Some(date(2024, 1, 20)),
            date(2024, 1, 15),
            WeekStartDay::Sunday,
        );
        assert_eq!(grid[0].date, date(2023, 12, 31));
        assert!(!grid[0].in_month);
        assert_eq!(grid[0].date.weekday(), Weekday::Sun);

        let selected: Vec<_> = grid.iter().filter(|d| d.is_selected).collect();
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].date, date(2024, 1, 20));

        let today = grid.iter().find(|d| d.is_today).unwrap();
        assert_eq!(today.date, date(2024, 1, 15));
        assert!(today.in_range);
    }

    #[test]
    fn test_grid_in_range_flags_follow_window() {
        let grid = month_grid(
            CalendarMonth::new(2024, 1).unwrap(),
            &timeline(),
            None,
            date(2024, 6, 1),
            WeekStartDay::Monday,
        );
        let in_range: Vec<u32> = grid
            .iter()
            .filter(|d| d.in_range && d.in_month)
            .map(|d| d.date.day())
            .collect();
        assert_eq!(in_range, (10..=31).collect::<Vec<u32>>());
        assert!(grid.iter().all(|d| !d.is_today));
    }
}
