//! The PITR window descriptor as served by the backup API.
//!
//! Only `intervals` and the `earliestPitrTime`/`latestPitrTime` fallback feed
//! the engine. `available`, `status`, and `unavailableReason` are carried
//! through untouched for the caller to show as-is.

use serde::{Deserialize, Serialize};

use crate::error::{PitrError, Result};
use crate::options::WindowOptions;
use crate::timeline::{build_timeline_with_options, RawInterval, Timeline};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PitrWindow {
    pub available: bool,
    pub earliest_pitr_time: Option<String>,
    pub latest_pitr_time: Option<String>,
    pub intervals: Vec<RawInterval>,
    pub status: Option<String>,
    pub unavailable_reason: Option<String>,
}

impl PitrWindow {
    /// Decode a descriptor from its JSON form. Missing fields take their
    /// defaults; `null` intervals read as an empty list.
    ///
    /// # Errors
    ///
    /// Returns [`PitrError::InvalidDescriptor`] for malformed JSON or fields
    /// of the wrong type.
    pub fn from_json(json: &str) -> Result<Self> {
        #[derive(Default, Deserialize)]
        #[serde(default, rename_all = "camelCase")]
        struct Wire {
            available: Option<bool>,
            earliest_pitr_time: Option<String>,
            latest_pitr_time: Option<String>,
            intervals: Option<Vec<RawInterval>>,
            status: Option<String>,
            unavailable_reason: Option<String>,
        }

        let wire: Wire = serde_json::from_str(json)
            .map_err(|e| PitrError::InvalidDescriptor(e.to_string()))?;

        Ok(Self {
            available: wire.available.unwrap_or(false),
            earliest_pitr_time: wire.earliest_pitr_time,
            latest_pitr_time: wire.latest_pitr_time,
            intervals: wire.intervals.unwrap_or_default(),
            status: wire.status,
            unavailable_reason: wire.unavailable_reason,
        })
    }

    /// The merged timeline for this descriptor.
    pub fn timeline(&self, options: &WindowOptions) -> Timeline {
        build_timeline_with_options(
            &self.intervals,
            self.earliest_pitr_time.as_deref(),
            self.latest_pitr_time.as_deref(),
            options,
        )
    }
}
