//! Check a candidate recovery instant against a [`Timeline`].
//!
//! Validation is a pure function of the candidate and the timeline snapshot.
//! It never errors: every outcome is a [`ValidationResult`] the caller can
//! render directly and use to enable or disable the restore action.

use std::fmt;

use serde::Serialize;

use crate::error::{PitrError, Result};
use crate::timeline::Timeline;
use crate::timestamp::{to_iso_string, AbsoluteTime};

/// Why a candidate was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// The timeline is empty.
    Unavailable,
    /// Earlier than the start of the first interval.
    BeforeEarliest { earliest: AbsoluteTime },
    /// Later than the end of the last interval.
    AfterLatest { latest: AbsoluteTime },
    /// Inside the overall window but strictly between two intervals.
    InGap {
        after: AbsoluteTime,
        before: AbsoluteTime,
    },
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::Unavailable => write!(
                f,
                "Point-in-time recovery is unavailable: no recoverable intervals"
            ),
            Rejection::BeforeEarliest { earliest } => write!(
                f,
                "Selected time is before the earliest recoverable time ({})",
                to_iso_string(*earliest)
            ),
            Rejection::AfterLatest { latest } => write!(
                f,
                "Selected time is after the latest recoverable time ({})",
                to_iso_string(*latest)
            ),
            Rejection::InGap { after, before } => write!(
                f,
                "Selected time falls in a non-recoverable gap between {} and {}",
                to_iso_string(*after),
                to_iso_string(*before)
            ),
        }
    }
}

/// Outcome of [`validate`]. `message` is `None` exactly when `is_valid`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub is_valid: bool,
    pub message: Option<String>,
    #[serde(skip)]
    pub rejection: Option<Rejection>,
}

impl ValidationResult {
    fn valid() -> Self {
        Self {
            is_valid: true,
            message: None,
            rejection: None,
        }
    }

    fn rejected(rejection: Rejection) -> Self {
        Self {
            is_valid: false,
            message: Some(rejection.to_string()),
            rejection: Some(rejection),
        }
    }
}

/// Decide whether `candidate` is recoverable under `timeline`.
///
/// Checks run in a fixed order: empty timeline, before the first start,
/// after the last end. A candidate that passes the bounds checks is valid
/// when some interval holds it (both ends inclusive) and otherwise sits in a
/// gap.
///
/// # Examples
///
/// ```
/// use pitr_window::{build_timeline, parse_timestamp, validate, RawInterval};
///
/// let timeline = build_timeline(
///     &[RawInterval::new("2024-01-01T00:00:00Z", "2024-01-02T00:00:00Z")],
///     None,
///     None,
/// );
/// let end = parse_timestamp("2024-01-02T00:00:00Z").unwrap();
/// assert!(validate(end, &timeline).is_valid);
/// ```
pub fn validate(candidate: AbsoluteTime, timeline: &Timeline) -> ValidationResult {
    let Some((earliest, latest)) = timeline.bounds() else {
        return ValidationResult::rejected(Rejection::Unavailable);
    };

    if candidate < earliest {
        return ValidationResult::rejected(Rejection::BeforeEarliest { earliest });
    }
    if candidate > latest {
        return ValidationResult::rejected(Rejection::AfterLatest { latest });
    }
    // Inside the overall bounds, an instant is either in an interval or in
    // exactly one gap.
    match timeline.gap_containing(candidate) {
        Some(gap) => ValidationResult::rejected(Rejection::InGap {
            after: gap.after,
            before: gap.before,
        }),
        None => ValidationResult::valid(),
    }
}

/// The canonical restore-target string for `candidate`, suitable for a
/// restore request body.
///
/// # Errors
///
/// Returns [`PitrError::NotRecoverable`] carrying the validation message when
/// `candidate` is not recoverable under `timeline`.
pub fn restore_target_time(candidate: AbsoluteTime, timeline: &Timeline) -> Result<String> {
    let result = validate(candidate, timeline);
    match result.message {
        None => Ok(to_iso_string(candidate)),
        Some(message) => Err(PitrError::NotRecoverable(message)),
    }
}
