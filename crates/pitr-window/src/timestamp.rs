//! Timestamp parsing and canonical formatting.
//!
//! Backup tooling reports recovery boundaries in several textual shapes,
//! some with an explicit UTC offset and some without. The recovery window is
//! a server-side UTC concept, so any timestamp that lacks an offset is read
//! as UTC, never as the caller's local time.
//!
//! Parsing never fails loudly: text that cannot be read yields `None`, and
//! whichever computation needed the value simply goes without it.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, SubsecRound, Utc};
use serde::Serializer;

/// An instant on the recovery timeline, held at millisecond resolution.
pub type AbsoluteTime = DateTime<Utc>;

const NAIVE_SPACE_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";
const NAIVE_T_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// The textual shape of a timestamp, decided before any parsing happens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimestampShape {
    /// Ends in `Z` or carries a numeric offset such as `+02:00`.
    WithOffset,
    /// `YYYY-MM-DD HH:MM:SS[.fraction]` with no offset.
    SpaceSeparatedNaive,
    /// `YYYY-MM-DDTHH:MM:SS[.fraction]` with no offset.
    TSeparatedNaive,
    /// Anything else. Handed to the lenient parsers verbatim.
    Other,
}

impl TimestampShape {
    /// Classify `text` (already trimmed) by its date/time layout.
    pub fn classify(text: &str) -> Self {
        let bytes = text.as_bytes();
        if bytes.len() < 19 || !has_datetime_skeleton(bytes) {
            return Self::Other;
        }

        let time = &bytes[11..];
        let has_offset = time.last().is_some_and(|&b| b == b'Z' || b == b'z')
            || time.iter().any(|&b| b == b'+' || b == b'-');
        if has_offset {
            return Self::WithOffset;
        }

        match bytes[10] {
            b' ' => Self::SpaceSeparatedNaive,
            b'T' | b't' => Self::TSeparatedNaive,
            _ => Self::Other,
        }
    }
}

/// Parse a timestamp into an [`AbsoluteTime`].
///
/// Empty or whitespace-only input yields `None`, as does anything that no
/// parser recognizes. Fractional seconds beyond millisecond precision are
/// truncated.
///
/// # Examples
///
/// ```
/// use pitr_window::timestamp::parse_timestamp;
///
/// let naive = parse_timestamp("2026-01-20 14:30:00").unwrap();
/// let zulu = parse_timestamp("2026-01-20T14:30:00Z").unwrap();
/// assert_eq!(naive, zulu);
/// assert!(parse_timestamp("yesterday-ish").is_none());
/// ```
pub fn parse_timestamp(text: &str) -> Option<AbsoluteTime> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    let parsed = match TimestampShape::classify(text) {
        TimestampShape::WithOffset => parse_with_offset(text),
        TimestampShape::SpaceSeparatedNaive => parse_naive_as_utc(text, NAIVE_SPACE_FORMAT),
        TimestampShape::TSeparatedNaive => {
            parse_naive_as_utc(&text.replacen('t', "T", 1), NAIVE_T_FORMAT)
        }
        TimestampShape::Other => parse_other(text),
    };

    parsed.map(|dt| dt.trunc_subsecs(3))
}

/// Parse an optional timestamp field, treating `None` like empty text.
pub fn parse_optional(text: Option<&str>) -> Option<AbsoluteTime> {
    text.and_then(parse_timestamp)
}

/// Format an instant as a canonical ISO-8601 UTC string with millisecond
/// precision and a `Z` suffix, e.g. `2024-01-10T00:00:00.000Z`.
pub fn to_iso_string(time: AbsoluteTime) -> String {
    time.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// `serialize_with` adapter emitting [`to_iso_string`].
pub(crate) fn serialize_iso<S: Serializer>(
    time: &AbsoluteTime,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&to_iso_string(*time))
}

// ── Internal helpers ────────────────────────────────────────────────────────

/// `YYYY-MM-DD?HH:MM:SS` laid out at the expected byte positions.
fn has_datetime_skeleton(bytes: &[u8]) -> bool {
    let digits = [0, 1, 2, 3, 5, 6, 8, 9, 11, 12, 14, 15, 17, 18];
    digits.iter().all(|&i| bytes[i].is_ascii_digit())
        && bytes[4] == b'-'
        && bytes[7] == b'-'
        && bytes[13] == b':'
        && bytes[16] == b':'
}

fn parse_with_offset(text: &str) -> Option<AbsoluteTime> {
    DateTime::parse_from_rfc3339(text)
        .or_else(|_| DateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f%#z"))
        .or_else(|_| DateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f%#z"))
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
}

fn parse_naive_as_utc(text: &str, format: &str) -> Option<AbsoluteTime> {
    NaiveDateTime::parse_from_str(text, format)
        .map(|naive| naive.and_utc())
        .ok()
}

/// Lenient passthrough: full RFC 3339, then minute-precision times with an
/// offset (`2024-01-01T12:00Z`), then a bare `YYYY-MM-DD` date read as
/// midnight UTC.
fn parse_other(text: &str) -> Option<AbsoluteTime> {
    DateTime::parse_from_rfc3339(text)
        .or_else(|_| DateTime::parse_from_str(text, "%Y-%m-%dT%H:%M%#z"))
        .or_else(|_| DateTime::parse_from_str(text, "%Y-%m-%d %H:%M%#z"))
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
                .map(|naive| naive.and_utc())
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> AbsoluteTime {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
    }

    // ── classification ──────────────────────────────────────────────────

    #[test]
    fn test_classify_zulu_suffix() {
        assert_eq!(
            TimestampShape::classify("2024-01-01T00:00:00Z"),
            TimestampShape::WithOffset
        );
    }

    #[test]
    fn test_classify_numeric_offsets() {
        assert_eq!(
            TimestampShape::classify("2024-01-01T00:00:00+02:00"),
            TimestampShape::WithOffset
        );
        assert_eq!(
            TimestampShape::classify("2024-01-01 00:00:00.123-05:30"),
            TimestampShape::WithOffset
        );
    }

    #[test]
    fn test_classify_naive_shapes() {
        assert_eq!(
            TimestampShape::classify("2024-01-01 12:00:00"),
            TimestampShape::SpaceSeparatedNaive
        );
        assert_eq!(
            TimestampShape::classify("2024-01-01T12:00:00.5"),
            TimestampShape::TSeparatedNaive
        );
    }

    #[test]
    fn test_classify_other_shapes() {
        assert_eq!(TimestampShape::classify("2024-01-01"), TimestampShape::Other);
        assert_eq!(TimestampShape::classify("not a timestamp at all"), TimestampShape::Other);
        assert_eq!(TimestampShape::classify("2024/01/01 12:00:00"), TimestampShape::Other);
    }

    #[test]
    fn test_classify_multibyte_input_does_not_panic() {
        assert_eq!(
            TimestampShape::classify("2024-01-01é12:00:00"),
            TimestampShape::Other
        );
    }

    // ── parse_timestamp ─────────────────────────────────────────────────

    #[test]
    fn test_parse_space_separated_assumes_utc() {
        let naive = parse_timestamp("2026-01-20 14:30:00").unwrap();
        let zulu = parse_timestamp("2026-01-20T14:30:00Z").unwrap();
        assert_eq!(naive, zulu);
        assert_eq!(naive, utc(2026, 1, 20, 14, 30, 0));
    }

    #[test]
    fn test_parse_t_separated_assumes_utc() {
        let parsed = parse_timestamp("2026-01-20T14:30:00").unwrap();
        assert_eq!(parsed, utc(2026, 1, 20, 14, 30, 0));
    }

    #[test]
    fn test_parse_explicit_offset_converted_to_utc() {
        let parsed = parse_timestamp("2026-01-20T14:30:00+02:00").unwrap();
        assert_eq!(parsed, utc(2026, 1, 20, 12, 30, 0));
    }

    #[test]
    fn test_parse_postgres_style_short_offset() {
        let parsed = parse_timestamp("2026-01-20 14:30:00+00").unwrap();
        assert_eq!(parsed, utc(2026, 1, 20, 14, 30, 0));
    }

    #[test]
    fn test_parse_fraction_truncated_to_millis() {
        let parsed = parse_timestamp("2024-01-05 00:00:00.200987").unwrap();
        assert_eq!(to_iso_string(parsed), "2024-01-05T00:00:00.200Z");
    }

    #[test]
    fn test_parse_bare_date_is_utc_midnight() {
        let parsed = parse_timestamp("2024-03-01").unwrap();
        assert_eq!(parsed, utc(2024, 3, 1, 0, 0, 0));
    }

    #[test]
    fn test_parse_minute_precision_with_offset() {
        assert_eq!(
            parse_timestamp("2024-01-01T12:00Z").unwrap(),
            utc(2024, 1, 1, 12, 0, 0)
        );
        assert_eq!(
            parse_timestamp("2024-01-01 12:00+02:00").unwrap(),
            utc(2024, 1, 1, 10, 0, 0)
        );
    }

    #[test]
    fn test_parse_empty_and_blank_are_none() {
        assert!(parse_timestamp("").is_none());
        assert!(parse_timestamp("   ").is_none());
        assert!(parse_optional(None).is_none());
    }

    #[test]
    fn test_parse_garbage_is_none() {
        assert!(parse_timestamp("next tuesday").is_none());
        assert!(parse_timestamp("2024-13-45 99:99:99").is_none());
        assert!(parse_timestamp("2024-01-01T25:00:00Z").is_none());
    }

    #[test]
    fn test_parse_surrounding_whitespace_ignored() {
        let parsed = parse_timestamp("  2024-01-01T00:00:00Z\n").unwrap();
        assert_eq!(parsed, utc(2024, 1, 1, 0, 0, 0));
    }

    // ── to_iso_string ───────────────────────────────────────────────────

    #[test]
    fn test_iso_string_has_millis_and_zulu() {
        assert_eq!(
            to_iso_string(utc(2024, 1, 10, 0, 0, 0)),
            "2024-01-10T00:00:00.000Z"
        );
    }

    #[test]
    fn test_iso_string_round_trips_through_parser() {
        let original = parse_timestamp("2026-06-30 23:59:59.999").unwrap();
        let reparsed = parse_timestamp(&to_iso_string(original)).unwrap();
        assert_eq!(original, reparsed);
    }
}
