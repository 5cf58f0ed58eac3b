//! Calendar-month frame identity.

use std::fmt;

use crate::foundation::error::{LapseError, LapseResult};

/// Sentinel bucket for the synthetic title frame. Lexically precedes every
/// real `YYYY-MM` value, so ascending bucket order keeps it first.
pub const TITLE_BUCKET: &str = "0000-00";

/// A `"YYYY-MM"` key identifying one frame of the animation.
///
/// Lexical order on the key is also chronological order, an invariant the
/// whole pipeline relies on.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Bucket(String);

impl Bucket {
    /// Derive a bucket from a feature timestamp.
    ///
    /// Accepts RFC 3339 (the native OSM format), a naive
    /// `YYYY-MM-DDTHH:MM:SS` and a bare `YYYY-MM-DD`. A timestamp matching
    /// none of these is a fatal [`LapseError::Timestamp`]: swallowing it
    /// would silently corrupt bucket assignment.
    pub fn from_timestamp(timestamp: &str) -> LapseResult<Self> {
        let ts = timestamp.trim();
        if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(ts) {
            return Ok(Self(dt.format("%Y-%m").to_string()));
        }
        if let Ok(dt) = chrono::NaiveDateTime::parse_from_str(ts, "%Y-%m-%dT%H:%M:%S") {
            return Ok(Self(dt.format("%Y-%m").to_string()));
        }
        if let Ok(d) = chrono::NaiveDate::parse_from_str(ts, "%Y-%m-%d") {
            return Ok(Self(d.format("%Y-%m").to_string()));
        }
        Err(LapseError::timestamp(format!(
            "cannot normalize timestamp '{timestamp}'"
        )))
    }

    /// The title-frame sentinel bucket.
    pub fn title() -> Self {
        Self(TITLE_BUCKET.to_string())
    }

    /// The `"YYYY-MM"` key.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
