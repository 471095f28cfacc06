//! # pitr-window
//!
//! Point-in-time recovery window engine for a managed PostgreSQL platform.
//!
//! The backup subsystem reports recoverable ranges per backup chain: unsorted,
//! possibly overlapping, and often separated by sub-second rounding noise.
//! This crate turns those reports into a canonical timeline and answers the
//! questions a restore dialog asks of it. Every operation is a pure function
//! of its inputs; callers rebuild the timeline whenever the reports change
//! and hold the result as an immutable snapshot.
//!
//! ## Modules
//!
//! - [`timestamp`] — Text → UTC instant, assuming UTC when no offset is given
//! - [`timeline`] — Merge raw intervals into a sorted, gap-aware [`Timeline`]
//! - [`validate`](mod@validate) — Decide whether a candidate instant is recoverable
//! - [`calendar`] — Day ranges, navigable days, month bounds, and the month grid
//! - [`candidate`] — Assemble a candidate from a picked day and clamped time fields
//! - [`window`] — The backup API's window descriptor
//! - [`options`] — Merge tolerance and week-start configuration
//! - [`error`] — Error types

pub mod calendar;
pub mod candidate;
pub mod error;
pub mod options;
pub mod timeline;
pub mod timestamp;
pub mod validate;
pub mod window;

pub use calendar::{
    allowed_ranges_for_day, allowed_ranges_label, can_go_next, can_go_previous,
    is_day_within_window, month_grid, AllowedRange, CalendarDay, CalendarMonth,
};
pub use candidate::Candidate;
pub use error::PitrError;
pub use options::{WeekStartDay, WindowOptions, DEFAULT_MERGE_TOLERANCE_MS};
pub use timeline::{
    build_timeline, build_timeline_with_options, RawInterval, RecoveryGap, RecoveryInterval,
    Timeline, WindowStatus,
};
pub use timestamp::{parse_timestamp, to_iso_string, AbsoluteTime, TimestampShape};
pub use validate::{restore_target_time, validate, Rejection, ValidationResult};
pub use window::PitrWindow;
