//! editlapse renders the edit history of an OpenStreetMap extract as a
//! looping time-lapse GIF.
//!
//! Ways are bucketed by the calendar month of their last edit; each bucket
//! becomes one frame, built through an external raster toolchain (the
//! `datamaps` binaries plus ImageMagick) and staged under a per-bucket
//! working directory. The frames are stitched, behind a leading black title
//! frame, into a looping animation with an extended final hold.
//!
//! The public surface is small:
//!
//! - Build a [`Config`] (defaults, JSON file, `EDITLAPSE_*` env overrides)
//! - Pick a [`Toolchain`] ([`ProcessToolchain`] in production,
//!   [`InMemoryToolchain`] in tests)
//! - Run [`Animator::run`] (or [`source_to_gif`]) against a source document
#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod animate;
pub mod config;
pub mod dataset;
mod foundation;
pub mod frame;
pub mod staging;
pub mod toolchain;

pub use crate::animate::{Animator, source_to_gif};
pub use crate::config::Config;
pub use crate::dataset::{Bounds, Bucket, CoordinateLine, Dataset, TITLE_BUCKET, Way};
pub use crate::foundation::error::{LapseError, LapseResult};
pub use crate::frame::{
    BANNER_HEIGHT_PX, FrameBuilder, FrameOutcome, SkipReason, Stage, StageStatus,
};
pub use crate::staging::FramePaths;
pub use crate::toolchain::{InMemoryToolchain, ProcessToolchain, ToolCall, Toolchain};
