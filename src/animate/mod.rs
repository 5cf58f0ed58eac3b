//! Animation orchestration.
//!
//! Drives the dataset loader once and the frame builder once per bucket in
//! ascending order, synthesizes the leading title frame, and assembles the
//! looping animation. Owns the top-level cache check: an existing animation
//! file short-circuits the whole run.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::dataset::{Bucket, Dataset};
use crate::foundation::error::{LapseError, LapseResult};
use crate::frame::{BANNER_HEIGHT_PX, FrameBuilder, FrameOutcome};
use crate::staging::FramePaths;
use crate::toolchain::Toolchain;

/// Builds one animation per source document.
pub struct Animator<'a> {
    cfg: &'a Config,
    toolchain: &'a dyn Toolchain,
}

impl<'a> Animator<'a> {
    /// Create an animator borrowing the run's configuration and toolchain.
    pub fn new(cfg: &'a Config, toolchain: &'a dyn Toolchain) -> Self {
        Self { cfg, toolchain }
    }

    /// Deterministic animation path for `source`:
    /// `<out_root>/<basename>.gif`.
    pub fn output_path(&self, source: &Path) -> LapseResult<PathBuf> {
        let stem = source
            .file_stem()
            .and_then(|stem| stem.to_str())
            .ok_or_else(|| {
                LapseError::pipeline(format!(
                    "source document '{}' has no usable file stem",
                    source.display()
                ))
            })?;
        Ok(self.cfg.out_root.join(format!("{stem}.gif")))
    }

    /// Render `source` into its animation, returning the animation path.
    ///
    /// The animation is built, or short-circuited as already cached, exactly
    /// once per invocation. An empty dataset (missing document) or one that
    /// yields no renderable frames (no bounds) returns the deterministic
    /// path without writing an animation.
    pub fn run(&self, source: &Path) -> LapseResult<PathBuf> {
        self.cfg.validate()?;
        let animation = self.output_path(source)?;
        if animation.exists() {
            info!(animation = %animation.display(), "animation already built, skipping");
            return Ok(animation);
        }

        info!(source = %source.display(), "building animation");
        let dataset = Dataset::load(source, self.toolchain, self.cfg)?;
        let buckets = dataset.buckets();
        if buckets.is_empty() {
            warn!(source = %source.display(), "dataset is empty, nothing to render");
            return Ok(animation);
        }

        let builder = FrameBuilder::new(self.cfg, self.toolchain);
        let mut outcomes: Vec<FrameOutcome> = Vec::with_capacity(buckets.len());
        for bucket in &buckets {
            debug!(bucket = %bucket, "building frame");
            outcomes.push(builder.build(&dataset, bucket)?);
        }

        let Some(first_rendered) = outcomes.iter().find(|o| o.composed.is_some()) else {
            warn!(
                source = %source.display(),
                "no frames rendered (source document carries no bounds), skipping assembly"
            );
            return Ok(animation);
        };

        let title = self.build_title_frame(&first_rendered.paths.image)?;

        let mut frames = Vec::with_capacity(outcomes.len() + 1);
        frames.push(title);
        frames.extend(outcomes.iter().filter_map(|o| o.composed.clone()));

        std::fs::create_dir_all(&self.cfg.out_root).with_context(|| {
            format!("create output root '{}'", self.cfg.out_root.display())
        })?;
        self.toolchain
            .assemble(&frames, self.cfg.frame_delay_cs, &animation)?;
        self.toolchain
            .extend_final_hold(&animation, self.cfg.final_hold_cs)?;

        info!(
            animation = %animation.display(),
            frames = frames.len(),
            "animation built"
        );
        Ok(animation)
    }

    /// Synthesize the solid black title frame, sized to the first rendered
    /// frame's image width × (height + banner height).
    fn build_title_frame(&self, first_image: &Path) -> LapseResult<PathBuf> {
        let (width, height) = self.toolchain.dimensions(first_image)?;
        let paths = FramePaths::resolve(&self.cfg.work_root, &Bucket::title())?;
        self.toolchain
            .blank(width, height + BANNER_HEIGHT_PX, &paths.frame)?;
        Ok(paths.frame)
    }
}

/// Animate a source document end to end with the given configuration and
/// toolchain, returning the animation path.
pub fn source_to_gif(
    source: &Path,
    cfg: &Config,
    toolchain: &dyn Toolchain,
) -> LapseResult<PathBuf> {
    Animator::new(cfg, toolchain).run(source)
}
