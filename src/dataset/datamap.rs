//! Snapped coordinate lines.
//!
//! The `snap` capability emits one line per feature: whitespace-separated
//! `lat,lon` pairs followed by a comment suffix `// id=<id>;k=v;...`. The
//! only structure this crate depends on is the embedded feature id, which is
//! recovered at this narrow parsing boundary.

use std::sync::LazyLock;

use regex::Regex;

use crate::foundation::error::{LapseError, LapseResult};

static FEATURE_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"//\s*id=(\d+)").expect("feature id pattern"));

/// One line of `snap` output with its embedded feature id.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CoordinateLine {
    feature_id: String,
    text: String,
}

impl CoordinateLine {
    /// Parse one snapped line. A line with no `// id=<digits>` suffix is a
    /// typed error, never "a line belonging to no bucket".
    pub fn parse(line: &str) -> LapseResult<Self> {
        let captures = FEATURE_ID.captures(line).ok_or_else(|| {
            LapseError::datamap(format!("no feature id in snapped line '{line}'"))
        })?;
        Ok(Self {
            feature_id: captures[1].to_string(),
            text: line.to_string(),
        })
    }

    /// Id of the feature this line was snapped from.
    pub fn feature_id(&self) -> &str {
        &self.feature_id
    }

    /// The full line as emitted by `snap`, without the trailing newline.
    pub fn text(&self) -> &str {
        &self.text
    }
}

/// Parse a whole datamap document, skipping blank lines.
pub fn parse_datamap(text: &str) -> LapseResult<Vec<CoordinateLine>> {
    text.lines()
        .filter(|line| !line.trim().is_empty())
        .map(CoordinateLine::parse)
        .collect()
}
