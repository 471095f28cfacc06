//! Normalize reported recovery intervals into a canonical timeline.
//!
//! The backup subsystem reports one recoverable range per backup chain. The
//! ranges arrive unsorted, may overlap, and neighbouring chains often abut
//! with sub-second rounding noise. [`build_timeline`] parses them, drops the
//! malformed ones, sorts by start, and sweeps once to coalesce anything that
//! overlaps or sits within the merge tolerance of its predecessor.
//!
//! The resulting [`Timeline`] is an immutable snapshot. Callers rebuild it
//! from scratch whenever the reported intervals change.

use serde::{Deserialize, Deserializer, Serialize};
use tracing::debug;

use crate::options::WindowOptions;
use crate::timestamp::{
    parse_optional, parse_timestamp, serialize_iso, to_iso_string, AbsoluteTime,
};

// ── Types ───────────────────────────────────────────────────────────────────

/// A recovery interval exactly as reported by the backup subsystem.
///
/// A missing or `null` end decodes as an empty string, which the builder
/// discards along with any other unparseable interval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawInterval {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub start_time: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub end_time: String,
}

fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Option::<String>::deserialize(deserializer).map(Option::unwrap_or_default)
}

impl RawInterval {
    pub fn new(start_time: impl Into<String>, end_time: impl Into<String>) -> Self {
        Self {
            start_time: start_time.into(),
            end_time: end_time.into(),
        }
    }
}

/// A parsed, well-ordered recovery interval. Both ends are recoverable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct RecoveryInterval {
    #[serde(serialize_with = "serialize_iso")]
    pub start: AbsoluteTime,
    #[serde(serialize_with = "serialize_iso")]
    pub end: AbsoluteTime,
}

impl RecoveryInterval {
    /// Returns `None` when `start > end`.
    pub fn new(start: AbsoluteTime, end: AbsoluteTime) -> Option<Self> {
        (start <= end).then_some(Self { start, end })
    }

    /// Inclusive on both ends.
    pub fn contains(&self, instant: AbsoluteTime) -> bool {
        self.start <= instant && instant <= self.end
    }

    fn from_raw(raw: &RawInterval) -> Option<Self> {
        let start = parse_timestamp(&raw.start_time)?;
        let end = parse_timestamp(&raw.end_time)?;
        Self::new(start, end)
    }
}

/// A span between two consecutive intervals in which no instant is
/// recoverable. Both `after` and `before` are themselves recoverable; the gap
/// is the open span between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RecoveryGap {
    #[serde(serialize_with = "serialize_iso")]
    pub after: AbsoluteTime,
    #[serde(serialize_with = "serialize_iso")]
    pub before: AbsoluteTime,
}

/// Shape of the recovery window, matching the status strings the backup API
/// reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowStatus {
    /// Exactly one merged interval.
    Continuous,
    /// Two or more merged intervals separated by gaps.
    Segmented,
    /// No recoverable intervals at all.
    Unavailable,
}

impl WindowStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            WindowStatus::Continuous => "continuous",
            WindowStatus::Segmented => "segmented",
            WindowStatus::Unavailable => "unavailable",
        }
    }
}

/// Sorted, non-overlapping recovery intervals, each separated from the next
/// by more than the merge tolerance. An empty timeline means PITR is
/// unavailable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Timeline {
    intervals: Vec<RecoveryInterval>,
}

impl Timeline {
    pub fn intervals(&self) -> &[RecoveryInterval] {
        &self.intervals
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    /// Start of the first interval.
    pub fn earliest(&self) -> Option<AbsoluteTime> {
        self.intervals.first().map(|iv| iv.start)
    }

    /// End of the last interval.
    pub fn latest(&self) -> Option<AbsoluteTime> {
        self.intervals.last().map(|iv| iv.end)
    }

    /// Overall window `[earliest, latest]`, ignoring gaps.
    pub fn bounds(&self) -> Option<(AbsoluteTime, AbsoluteTime)> {
        self.earliest().zip(self.latest())
    }

    /// The interval containing `instant`, if any. Binary search over the
    /// sorted starts.
    pub fn interval_containing(&self, instant: AbsoluteTime) -> Option<&RecoveryInterval> {
        let idx = self.intervals.partition_point(|iv| iv.start <= instant);
        idx.checked_sub(1)
            .map(|i| &self.intervals[i])
            .filter(|iv| iv.contains(instant))
    }

    /// The gap strictly containing `instant`, if any.
    pub fn gap_containing(&self, instant: AbsoluteTime) -> Option<RecoveryGap> {
        let idx = self.intervals.partition_point(|iv| iv.start <= instant);
        let next = self.intervals.get(idx)?;
        let prev = self.intervals.get(idx.checked_sub(1)?)?;
        (prev.end < instant).then_some(RecoveryGap {
            after: prev.end,
            before: next.start,
        })
    }

    pub fn status(&self) -> WindowStatus {
        match self.intervals.len() {
            0 => WindowStatus::Unavailable,
            1 => WindowStatus::Continuous,
            _ => WindowStatus::Segmented,
        }
    }

    pub fn gaps(&self) -> Vec<RecoveryGap> {
        self.intervals
            .windows(2)
            .map(|pair| RecoveryGap {
                after: pair[0].end,
                before: pair[1].start,
            })
            .collect()
    }

    /// Render the timeline back into the wire shape, using canonical ISO
    /// strings for both ends.
    pub fn to_raw_intervals(&self) -> Vec<RawInterval> {
        self.intervals
            .iter()
            .map(|iv| RawInterval::new(to_iso_string(iv.start), to_iso_string(iv.end)))
            .collect()
    }
}

// ── build_timeline ──────────────────────────────────────────────────────────

/// Build a [`Timeline`] using the default merge tolerance (1000 ms).
///
/// See [`build_timeline_with_options`].
///
/// # Examples
///
/// ```
/// use pitr_window::{build_timeline, RawInterval};
///
/// let raw = vec![
///     RawInterval::new("2024-01-01T00:00:00Z", "2024-01-05T00:00:00Z"),
///     RawInterval::new("2024-01-05T00:00:00.200Z", "2024-01-10T00:00:00Z"),
/// ];
/// let timeline = build_timeline(&raw, None, None);
/// assert_eq!(timeline.len(), 1);
/// ```
pub fn build_timeline(
    raw: &[RawInterval],
    fallback_earliest: Option<&str>,
    fallback_latest: Option<&str>,
) -> Timeline {
    build_timeline_with_options(
        raw,
        fallback_earliest,
        fallback_latest,
        &WindowOptions::default(),
    )
}

/// Build a [`Timeline`] from reported intervals.
///
/// 1. Parse both ends of every raw interval; drop it if either end does not
///    parse or if it starts after it ends.
/// 2. Only when nothing survives, synthesize one interval from the fallback
///    earliest/latest pair, provided both parse and are ordered.
/// 3. Sort by start and sweep once, folding each interval into the running
///    one when it starts no later than `running.end + tolerance`.
///
/// The fallback pair is never combined with a non-empty reported set.
pub fn build_timeline_with_options(
    raw: &[RawInterval],
    fallback_earliest: Option<&str>,
    fallback_latest: Option<&str>,
    options: &WindowOptions,
) -> Timeline {
    let mut intervals: Vec<RecoveryInterval> = raw
        .iter()
        .filter_map(|r| {
            let parsed = RecoveryInterval::from_raw(r);
            if parsed.is_none() {
                debug!(
                    start_time = %r.start_time,
                    end_time = %r.end_time,
                    "discarding unusable recovery interval"
                );
            }
            parsed
        })
        .collect();

    if intervals.is_empty() {
        let fallback = parse_optional(fallback_earliest)
            .zip(parse_optional(fallback_latest))
            .and_then(|(start, end)| RecoveryInterval::new(start, end));
        if let Some(interval) = fallback {
            debug!(
                start = %to_iso_string(interval.start),
                end = %to_iso_string(interval.end),
                "no usable intervals reported; using earliest/latest fallback"
            );
            intervals.push(interval);
        }
    }

    if intervals.is_empty() {
        debug!("no recoverable intervals; point-in-time recovery unavailable");
        return Timeline::default();
    }

    let reported = intervals.len();
    intervals.sort_by_key(|iv| (iv.start, iv.end));

    let tolerance = options.merge_tolerance();
    let mut merged: Vec<RecoveryInterval> = Vec::with_capacity(intervals.len());
    for interval in intervals {
        if let Some(running) = merged.last_mut() {
            // An end so late that adding the tolerance overflows reaches everything.
            let within_reach = running
                .end
                .checked_add_signed(tolerance)
                .map_or(true, |reach| interval.start <= reach);
            if within_reach {
                running.end = running.end.max(interval.end);
                continue;
            }
        }
        merged.push(interval);
    }

    debug!(reported, merged = merged.len(), "built recovery timeline");
    Timeline { intervals: merged }
}
