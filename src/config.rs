//! Pipeline configuration.
//!
//! One explicit [`Config`] is constructed at startup and passed by reference
//! into the dataset loader, frame builder and animator. Values come from
//! defaults, an optional JSON file, `EDITLAPSE_*` environment overrides and
//! CLI flags, applied in that order.

use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::foundation::error::{LapseError, LapseResult};

/// Settings shared by every pipeline component.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Config {
    /// Working root holding one staging subdirectory per frame.
    pub work_root: PathBuf,
    /// Output root holding the final animation.
    pub out_root: PathBuf,
    /// Directory containing the `datamaps` binaries (`snap`, `encode`,
    /// `render`). Empty means "resolve from PATH".
    pub bin_dir: PathBuf,
    /// Zoom level passed to `encode` and `render`.
    pub zoom: u32,
    /// Canonical canvas width in pixels; wider raw images are scaled down to
    /// exactly this width.
    pub canvas_width: u32,
    /// Per-frame display delay in centiseconds.
    pub frame_delay_cs: u32,
    /// Display duration of the final frame in centiseconds.
    pub final_hold_cs: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            work_root: std::env::temp_dir().join("editlapse"),
            out_root: std::env::temp_dir(),
            bin_dir: PathBuf::new(),
            zoom: 16,
            canvas_width: 940,
            frame_delay_cs: 20,
            final_hold_cs: 500,
        }
    }
}

impl Config {
    /// Load a configuration from a JSON file. Missing keys keep their
    /// defaults.
    pub fn from_path(path: &Path) -> LapseResult<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read config '{}'", path.display()))?;
        serde_json::from_str(&text)
            .map_err(|e| LapseError::config(format!("parse config '{}': {e}", path.display())))
    }

    /// Apply `EDITLAPSE_*` environment overrides in place.
    pub fn apply_env(&mut self) -> LapseResult<()> {
        if let Ok(v) = std::env::var("EDITLAPSE_WORK_ROOT") {
            self.work_root = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("EDITLAPSE_OUT_ROOT") {
            self.out_root = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("EDITLAPSE_BIN_DIR") {
            self.bin_dir = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("EDITLAPSE_ZOOM") {
            self.zoom = parse_env_u32("EDITLAPSE_ZOOM", &v)?;
        }
        if let Ok(v) = std::env::var("EDITLAPSE_CANVAS_WIDTH") {
            self.canvas_width = parse_env_u32("EDITLAPSE_CANVAS_WIDTH", &v)?;
        }
        if let Ok(v) = std::env::var("EDITLAPSE_FRAME_DELAY_CS") {
            self.frame_delay_cs = parse_env_u32("EDITLAPSE_FRAME_DELAY_CS", &v)?;
        }
        if let Ok(v) = std::env::var("EDITLAPSE_FINAL_HOLD_CS") {
            self.final_hold_cs = parse_env_u32("EDITLAPSE_FINAL_HOLD_CS", &v)?;
        }
        Ok(())
    }

    /// Reject configurations the pipeline cannot run with.
    pub fn validate(&self) -> LapseResult<()> {
        if self.canvas_width == 0 {
            return Err(LapseError::config("canvas_width must be non-zero"));
        }
        if self.frame_delay_cs == 0 {
            return Err(LapseError::config("frame_delay_cs must be non-zero"));
        }
        Ok(())
    }
}

fn parse_env_u32(var: &str, value: &str) -> LapseResult<u32> {
    value
        .trim()
        .parse::<u32>()
        .map_err(|_| LapseError::config(format!("{var} must be an integer, got '{value}'")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let cfg = Config::default();
        cfg.validate().unwrap();
        assert_eq!(cfg.canvas_width, 940);
        assert_eq!(cfg.frame_delay_cs, 20);
        assert_eq!(cfg.final_hold_cs, 500);
    }

    #[test]
    fn json_overrides_only_named_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "zoom": 14, "canvas_width": 800 }"#).unwrap();

        let cfg = Config::from_path(&path).unwrap();
        assert_eq!(cfg.zoom, 14);
        assert_eq!(cfg.canvas_width, 800);
        assert_eq!(cfg.frame_delay_cs, Config::default().frame_delay_cs);
    }

    #[test]
    fn malformed_config_file_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = Config::from_path(&path).unwrap_err();
        assert!(matches!(err, LapseError::Config(_)));
    }

    #[test]
    fn non_numeric_env_value_is_rejected() {
        let err = parse_env_u32("EDITLAPSE_ZOOM", "high").unwrap_err();
        assert!(err.to_string().contains("EDITLAPSE_ZOOM"));
    }

    #[test]
    fn zero_canvas_width_is_rejected() {
        let cfg = Config {
            canvas_width: 0,
            ..Config::default()
        };
        assert!(cfg.validate().is_err());
    }
}
