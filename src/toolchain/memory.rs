//! In-memory toolchain for tests and debugging.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::Context as _;

use crate::dataset::Bounds;
use crate::foundation::error::{LapseError, LapseResult};
use crate::toolchain::Toolchain;

/// One recorded capability invocation, in call order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ToolCall {
    /// `snap` ran over `source`.
    Snap {
        /// Raw source document.
        source: PathBuf,
    },
    /// `encode` ran over a coordinates file.
    Encode {
        /// Filtered coordinates file.
        coordinates: PathBuf,
        /// Zoom level.
        zoom: u32,
    },
    /// `render` produced a raw image from a bundle.
    Render {
        /// Encoded bundle.
        bundle: PathBuf,
        /// Raw image destination.
        out: PathBuf,
    },
    /// `dimensions` measured an image.
    Dimensions {
        /// Measured image.
        image: PathBuf,
    },
    /// `resize` scaled an image to a target width.
    Resize {
        /// Resized image.
        image: PathBuf,
        /// Target width in pixels.
        width: u32,
    },
    /// `label` rendered a banner.
    Label {
        /// Banner text.
        text: String,
        /// Banner width in pixels.
        width: u32,
        /// Banner height in pixels.
        height: u32,
    },
    /// `composite` stacked two images.
    Composite {
        /// Top image.
        top: PathBuf,
        /// Bottom image.
        bottom: PathBuf,
    },
    /// `blank` produced a solid canvas.
    Blank {
        /// Canvas width in pixels.
        width: u32,
        /// Canvas height in pixels.
        height: u32,
    },
    /// `assemble` stitched frames into an animation.
    Assemble {
        /// Frames in display order.
        frames: Vec<PathBuf>,
        /// Per-frame delay in centiseconds.
        delay_cs: u32,
        /// Animation destination.
        out: PathBuf,
    },
    /// `extend_final_hold` lengthened the last frame's display.
    ExtendFinalHold {
        /// Animation file.
        animation: PathBuf,
        /// Final hold in centiseconds.
        hold_cs: u32,
    },
}

impl ToolCall {
    /// Capability name of this call.
    pub fn tool(&self) -> &'static str {
        match self {
            Self::Snap { .. } => "snap",
            Self::Encode { .. } => "encode",
            Self::Render { .. } => "render",
            Self::Dimensions { .. } => "identify",
            Self::Resize { .. } => "resize",
            Self::Label { .. } => "label",
            Self::Composite { .. } => "composite",
            Self::Blank { .. } => "blank",
            Self::Assemble { .. } => "assemble",
            Self::ExtendFinalHold { .. } => "extend-final-hold",
        }
    }
}

/// [`Toolchain`] double that records every call, writes marker artifacts and
/// serves scripted snap output and image dimensions.
#[derive(Debug)]
pub struct InMemoryToolchain {
    snap_output: Option<String>,
    image_size: (u32, u32),
    fail_tool: Option<String>,
    calls: Mutex<Vec<ToolCall>>,
}

impl Default for InMemoryToolchain {
    fn default() -> Self {
        Self {
            snap_output: None,
            image_size: (1203, 829),
            fail_tool: None,
            calls: Mutex::new(Vec::new()),
        }
    }
}

impl InMemoryToolchain {
    /// Create a toolchain double with no snap output and a 1203×829 scripted
    /// image size.
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the datamap text that `snap` writes. Without this, `snap`
    /// records its call but writes no output file.
    pub fn with_snap_output(mut self, text: impl Into<String>) -> Self {
        self.snap_output = Some(text.into());
        self
    }

    /// Script the `(width, height)` every `dimensions` call reports.
    pub fn with_image_size(mut self, size: (u32, u32)) -> Self {
        self.image_size = size;
        self
    }

    /// Make every call whose [`ToolCall::tool`] name equals `tool` fail.
    pub fn with_failure(mut self, tool: impl Into<String>) -> Self {
        self.fail_tool = Some(tool.into());
        self
    }

    /// Snapshot of all recorded calls, in order.
    pub fn calls(&self) -> Vec<ToolCall> {
        self.calls.lock().expect("toolchain call log").clone()
    }

    fn record(&self, call: ToolCall) -> LapseResult<()> {
        if let Some(fail) = self.fail_tool.as_deref()
            && fail == call.tool()
        {
            return Err(LapseError::toolchain(call.tool(), "injected failure"));
        }
        self.calls.lock().expect("toolchain call log").push(call);
        Ok(())
    }

    fn require(path: &Path, tool: &str) -> LapseResult<()> {
        if path.exists() {
            Ok(())
        } else {
            Err(LapseError::toolchain(
                tool,
                format!("missing input '{}'", path.display()),
            ))
        }
    }
}

impl Toolchain for InMemoryToolchain {
    fn snap(&self, source: &Path, out: &Path) -> LapseResult<()> {
        Self::require(source, "snap")?;
        self.record(ToolCall::Snap {
            source: source.to_path_buf(),
        })?;
        if let Some(text) = self.snap_output.as_deref() {
            std::fs::write(out, text).context("write scripted snap output")?;
        }
        Ok(())
    }

    fn encode(&self, coordinates: &Path, bundle: &Path, zoom: u32) -> LapseResult<()> {
        Self::require(coordinates, "encode")?;
        self.record(ToolCall::Encode {
            coordinates: coordinates.to_path_buf(),
            zoom,
        })?;
        std::fs::create_dir_all(bundle).context("create marker bundle")?;
        std::fs::write(bundle.join("bundle.bin"), "encoded\n").context("write marker bundle")?;
        Ok(())
    }

    fn render(&self, bundle: &Path, _bounds: &Bounds, _zoom: u32, out: &Path) -> LapseResult<()> {
        Self::require(bundle, "render")?;
        self.record(ToolCall::Render {
            bundle: bundle.to_path_buf(),
            out: out.to_path_buf(),
        })?;
        std::fs::write(out, "raw image\n").context("write marker image")?;
        Ok(())
    }

    fn dimensions(&self, image: &Path) -> LapseResult<(u32, u32)> {
        Self::require(image, "identify")?;
        self.record(ToolCall::Dimensions {
            image: image.to_path_buf(),
        })?;
        Ok(self.image_size)
    }

    fn resize(&self, image: &Path, width: u32) -> LapseResult<()> {
        Self::require(image, "resize")?;
        self.record(ToolCall::Resize {
            image: image.to_path_buf(),
            width,
        })
    }

    fn label(&self, text: &str, width: u32, height: u32, out: &Path) -> LapseResult<()> {
        self.record(ToolCall::Label {
            text: text.to_string(),
            width,
            height,
        })?;
        std::fs::write(out, "label\n").context("write marker label")?;
        Ok(())
    }

    fn composite(&self, top: &Path, bottom: &Path, out: &Path) -> LapseResult<()> {
        Self::require(top, "composite")?;
        Self::require(bottom, "composite")?;
        self.record(ToolCall::Composite {
            top: top.to_path_buf(),
            bottom: bottom.to_path_buf(),
        })?;
        std::fs::write(out, "frame\n").context("write marker frame")?;
        Ok(())
    }

    fn blank(&self, width: u32, height: u32, out: &Path) -> LapseResult<()> {
        self.record(ToolCall::Blank { width, height })?;
        std::fs::write(out, "blank\n").context("write marker blank frame")?;
        Ok(())
    }

    fn assemble(&self, frames: &[PathBuf], delay_cs: u32, out: &Path) -> LapseResult<()> {
        for frame in frames {
            Self::require(frame, "assemble")?;
        }
        self.record(ToolCall::Assemble {
            frames: frames.to_vec(),
            delay_cs,
            out: out.to_path_buf(),
        })?;
        if let Some(parent) = out.parent() {
            std::fs::create_dir_all(parent).context("create marker output directory")?;
        }
        std::fs::write(out, "animation\n").context("write marker animation")?;
        Ok(())
    }

    fn extend_final_hold(&self, animation: &Path, hold_cs: u32) -> LapseResult<()> {
        Self::require(animation, "extend-final-hold")?;
        self.record(ToolCall::ExtendFinalHold {
            animation: animation.to_path_buf(),
            hold_cs,
        })
    }
}
