//! Per-frame staging paths.

use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::dataset::Bucket;
use crate::foundation::error::LapseResult;

/// The five artifacts of one frame, under its staging directory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FramePaths {
    /// Staging directory `<work_root>/<bucket>/`.
    pub dir: PathBuf,
    /// Filtered coordinate lines for this bucket.
    pub ways: PathBuf,
    /// Raw rendered image.
    pub image: PathBuf,
    /// Banner image carrying the bucket id.
    pub label: PathBuf,
    /// Final composed frame (image stacked over label).
    pub frame: PathBuf,
    /// Encoded coordinate bundle (opaque to this crate).
    pub encoded: PathBuf,
}

impl FramePaths {
    /// Name the artifacts for `bucket` and create its staging directory.
    ///
    /// Creation is idempotent: resolving the same bucket again, including
    /// across process restarts resuming a half-finished run, never fails and
    /// never discards artifacts already staged there.
    pub fn resolve(work_root: &Path, bucket: &Bucket) -> LapseResult<Self> {
        let dir = work_root.join(bucket.as_str());
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("create staging directory '{}'", dir.display()))?;
        Ok(Self {
            ways: dir.join("ways.txt"),
            image: dir.join("image.png"),
            label: dir.join("label.png"),
            frame: dir.join("frame.png"),
            encoded: dir.join("encoded_frame"),
            dir,
        })
    }
}
