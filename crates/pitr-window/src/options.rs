//! Tunables shared by the timeline and calendar computations.

use chrono::Weekday;
use serde::{Deserialize, Serialize};

/// Gap, in milliseconds, below which two reported intervals are treated as
/// one continuous range. Backup chains often abut with sub-second rounding
/// noise that should not read as a hole in the window.
pub const DEFAULT_MERGE_TOLERANCE_MS: i64 = 1000;

/// Which day begins a week in the calendar grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeekStartDay {
    /// ISO 8601 standard (Monday = day 0 of the week).
    #[default]
    Monday,
    /// US/Canada convention (Sunday = day 0 of the week).
    Sunday,
}

impl WeekStartDay {
    /// How many days `weekday` is from the week-start day.
    pub fn days_from_start(self, weekday: Weekday) -> u32 {
        match self {
            WeekStartDay::Monday => weekday.num_days_from_monday(),
            WeekStartDay::Sunday => weekday.num_days_from_sunday(),
        }
    }
}

/// Options for [`build_timeline_with_options`](crate::build_timeline_with_options)
/// and the calendar helpers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WindowOptions {
    /// Maximum gap, in milliseconds, still treated as continuous. Negative
    /// values behave as 0.
    pub merge_tolerance_ms: i64,
    /// Which day starts the week in [`month_grid`](crate::calendar::month_grid).
    pub week_start: WeekStartDay,
}

impl Default for WindowOptions {
    fn default() -> Self {
        Self {
            merge_tolerance_ms: DEFAULT_MERGE_TOLERANCE_MS,
            week_start: WeekStartDay::default(),
        }
    }
}

impl WindowOptions {
    /// The merge tolerance as a `chrono` duration, floored at zero.
    pub fn merge_tolerance(&self) -> chrono::Duration {
        chrono::Duration::milliseconds(self.merge_tolerance_ms.max(0))
    }
}
