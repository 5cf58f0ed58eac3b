//! Seven-stage per-bucket frame pipeline.
//!
//! Filter, encode, render, measure, resize, label, composite. Stages are
//! threaded through explicit values rather than "file absent means skip"
//! branching: a skip carries its reason in the returned [`FrameOutcome`],
//! and a toolchain failure aborts the build instead of leaving a silently
//! incomplete frame behind.

use std::path::PathBuf;

use anyhow::Context as _;
use tracing::debug;

use crate::config::Config;
use crate::dataset::{Bucket, Dataset};
use crate::foundation::error::LapseResult;
use crate::staging::FramePaths;
use crate::toolchain::Toolchain;

/// Fixed height of the bucket-id banner, in pixels.
pub const BANNER_HEIGHT_PX: u32 = 50;

/// The pipeline stages, in execution order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Write the bucket's coordinate lines to `ways.txt`.
    Filter,
    /// Encode the coordinates into the bundle.
    Encode,
    /// Render the bundle into the raw image.
    Render,
    /// Measure the raw image.
    Measure,
    /// Scale the image down to the canonical canvas width.
    Resize,
    /// Render the bucket-id banner.
    Label,
    /// Stack image over banner into the composed frame.
    Composite,
}

impl Stage {
    fn index(self) -> usize {
        match self {
            Self::Filter => 0,
            Self::Encode => 1,
            Self::Render => 2,
            Self::Measure => 3,
            Self::Resize => 4,
            Self::Label => 5,
            Self::Composite => 6,
        }
    }
}

/// Why a stage did not run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SkipReason {
    /// The source document carried no bounds, so nothing can be rendered.
    NoBounds,
    /// An earlier skip left no raw image to operate on.
    NoImage,
    /// The raw image is already at or under the canonical canvas width.
    WidthWithinCanvas,
}

/// Outcome of one stage.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StageStatus {
    /// The stage executed.
    Ran,
    /// The stage was skipped, with its reason.
    Skipped(SkipReason),
}

/// Build record for one frame.
#[derive(Debug)]
pub struct FrameOutcome {
    /// The bucket this frame renders.
    pub bucket: Bucket,
    /// Staging paths the artifacts were written to.
    pub paths: FramePaths,
    /// Number of coordinate lines written by the filter stage.
    pub coordinate_count: usize,
    /// Raw image size measured before any resize, when rendering ran.
    pub measured_size: Option<(u32, u32)>,
    /// The composed frame image, when the full pipeline ran.
    pub composed: Option<PathBuf>,
    statuses: [StageStatus; 7],
}

impl FrameOutcome {
    /// Status of `stage` in this build.
    pub fn status(&self, stage: Stage) -> StageStatus {
        self.statuses[stage.index()]
    }
}

/// Executes the per-bucket pipeline against a loaded dataset.
pub struct FrameBuilder<'a> {
    cfg: &'a Config,
    toolchain: &'a dyn Toolchain,
}

impl<'a> FrameBuilder<'a> {
    /// Create a builder borrowing the run's configuration and toolchain.
    pub fn new(cfg: &'a Config, toolchain: &'a dyn Toolchain) -> Self {
        Self { cfg, toolchain }
    }

    /// Build the frame for `bucket`.
    pub fn build(&self, dataset: &Dataset, bucket: &Bucket) -> LapseResult<FrameOutcome> {
        let paths = FramePaths::resolve(&self.cfg.work_root, bucket)?;

        // Filter: truncate-and-write, an empty bucket writes an empty file.
        let lines = dataset.coordinates_for(bucket);
        let mut text = lines
            .iter()
            .map(|line| line.text())
            .collect::<Vec<_>>()
            .join("\n");
        if !text.is_empty() {
            text.push('\n');
        }
        std::fs::write(&paths.ways, text)
            .with_context(|| format!("write coordinates '{}'", paths.ways.display()))?;

        self.toolchain
            .encode(&paths.ways, &paths.encoded, self.cfg.zoom)?;

        let Some(bounds) = dataset.bounds() else {
            debug!(bucket = %bucket, "no bounds in source document, skipping render");
            return Ok(FrameOutcome {
                bucket: bucket.clone(),
                paths,
                coordinate_count: lines.len(),
                measured_size: None,
                composed: None,
                statuses: [
                    StageStatus::Ran,
                    StageStatus::Ran,
                    StageStatus::Skipped(SkipReason::NoBounds),
                    StageStatus::Skipped(SkipReason::NoImage),
                    StageStatus::Skipped(SkipReason::NoImage),
                    StageStatus::Skipped(SkipReason::NoImage),
                    StageStatus::Skipped(SkipReason::NoImage),
                ],
            });
        };

        self.toolchain
            .render(&paths.encoded, bounds, self.cfg.zoom, &paths.image)?;

        let (width, height) = self.toolchain.dimensions(&paths.image)?;

        let (banner_width, resize_status) = if width > self.cfg.canvas_width {
            self.toolchain.resize(&paths.image, self.cfg.canvas_width)?;
            (self.cfg.canvas_width, StageStatus::Ran)
        } else {
            (width, StageStatus::Skipped(SkipReason::WidthWithinCanvas))
        };

        self.toolchain
            .label(bucket.as_str(), banner_width, BANNER_HEIGHT_PX, &paths.label)?;
        self.toolchain
            .composite(&paths.image, &paths.label, &paths.frame)?;

        debug!(
            bucket = %bucket,
            coordinates = lines.len(),
            width,
            height,
            "frame built"
        );
        Ok(FrameOutcome {
            bucket: bucket.clone(),
            composed: Some(paths.frame.clone()),
            paths,
            coordinate_count: lines.len(),
            measured_size: Some((width, height)),
            statuses: [
                StageStatus::Ran,
                StageStatus::Ran,
                StageStatus::Ran,
                StageStatus::Ran,
                resize_status,
                StageStatus::Ran,
                StageStatus::Ran,
            ],
        })
    }
}
