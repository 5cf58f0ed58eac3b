//! Subprocess-backed toolchain.
//!
//! `snap`, `encode` and `render` are resolved under the configured
//! `datamaps` directory; `identify` and `convert` come from ImageMagick on
//! PATH. Every invocation checks the exit status and surfaces captured
//! stderr in the error.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use std::sync::LazyLock;

use anyhow::Context as _;
use regex::Regex;
use tracing::debug;

use crate::dataset::Bounds;
use crate::foundation::error::{LapseError, LapseResult};
use crate::toolchain::Toolchain;

static PNG_GEOMETRY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"PNG (\d+)x(\d+)").expect("png geometry pattern"));

/// [`Toolchain`] implementation driving external processes.
#[derive(Clone, Debug)]
pub struct ProcessToolchain {
    bin_dir: PathBuf,
}

impl ProcessToolchain {
    /// Create a toolchain resolving the `datamaps` binaries under
    /// `bin_dir`. An empty `bin_dir` resolves them from PATH.
    pub fn new(bin_dir: impl Into<PathBuf>) -> Self {
        Self {
            bin_dir: bin_dir.into(),
        }
    }

    fn datamaps_bin(&self, name: &str) -> PathBuf {
        if self.bin_dir.as_os_str().is_empty() {
            PathBuf::from(name)
        } else {
            self.bin_dir.join(name)
        }
    }
}

impl Toolchain for ProcessToolchain {
    fn snap(&self, source: &Path, out: &Path) -> LapseResult<()> {
        let input = File::open(source)
            .with_context(|| format!("open source document '{}'", source.display()))?;
        let output =
            File::create(out).with_context(|| format!("create datamap '{}'", out.display()))?;
        let mut cmd = Command::new(self.datamaps_bin("snap"));
        cmd.stdin(Stdio::from(input)).stdout(Stdio::from(output));
        run_checked("snap", &mut cmd)?;
        Ok(())
    }

    fn encode(&self, coordinates: &Path, bundle: &Path, zoom: u32) -> LapseResult<()> {
        let input = File::open(coordinates)
            .with_context(|| format!("open coordinates '{}'", coordinates.display()))?;
        let mut cmd = Command::new(self.datamaps_bin("encode"));
        cmd.stdin(Stdio::from(input))
            .arg("-o")
            .arg(bundle)
            .args(["-z", &zoom.to_string()]);
        run_checked("encode", &mut cmd)?;
        Ok(())
    }

    fn render(&self, bundle: &Path, bounds: &Bounds, zoom: u32, out: &Path) -> LapseResult<()> {
        let output =
            File::create(out).with_context(|| format!("create image '{}'", out.display()))?;
        let mut cmd = Command::new(self.datamaps_bin("render"));
        cmd.args(["-t", "0", "-A", "--"])
            .arg(bundle)
            .arg(zoom.to_string())
            .args([&bounds.minlat, &bounds.minlon, &bounds.maxlat, &bounds.maxlon])
            .stdout(Stdio::from(output));
        run_checked("render", &mut cmd)?;
        Ok(())
    }

    fn dimensions(&self, image: &Path) -> LapseResult<(u32, u32)> {
        let mut cmd = Command::new("identify");
        cmd.arg(image);
        let output = run_checked("identify", &mut cmd)?;
        parse_dimensions(&String::from_utf8_lossy(&output.stdout))
    }

    fn resize(&self, image: &Path, width: u32) -> LapseResult<()> {
        let mut cmd = Command::new("convert");
        cmd.arg(image)
            .args(["-resize", &format!("{width}x")])
            .arg(image);
        run_checked("resize", &mut cmd)?;
        Ok(())
    }

    fn label(&self, text: &str, width: u32, height: u32, out: &Path) -> LapseResult<()> {
        let mut cmd = Command::new("convert");
        cmd.args(["-size", &format!("{width}x{height}")])
            .args(["-gravity", "Center", "-background", "black"])
            .args(["-stroke", "white", "-fill", "white"])
            .arg(format!("label:{text}"))
            .arg(out);
        run_checked("label", &mut cmd)?;
        Ok(())
    }

    fn composite(&self, top: &Path, bottom: &Path, out: &Path) -> LapseResult<()> {
        let mut cmd = Command::new("convert");
        cmd.arg("-append").arg(top).arg(bottom).arg(out);
        run_checked("composite", &mut cmd)?;
        Ok(())
    }

    fn blank(&self, width: u32, height: u32, out: &Path) -> LapseResult<()> {
        let mut cmd = Command::new("convert");
        cmd.args(["-size", &format!("{width}x{height}")])
            .arg("canvas:black")
            .arg(out);
        run_checked("blank", &mut cmd)?;
        Ok(())
    }

    fn assemble(&self, frames: &[PathBuf], delay_cs: u32, out: &Path) -> LapseResult<()> {
        if let Some(parent) = out.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create output directory '{}'", parent.display()))?;
        }
        let mut cmd = Command::new("convert");
        cmd.args(["-coalesce", "-dispose", "1"])
            .args(["-delay", &delay_cs.to_string()])
            .args(["-loop", "0"])
            .args(frames)
            .arg(out);
        run_checked("assemble", &mut cmd)?;
        Ok(())
    }

    fn extend_final_hold(&self, animation: &Path, hold_cs: u32) -> LapseResult<()> {
        let mut cmd = Command::new("convert");
        cmd.arg(animation)
            .args(["(", "+clone", "-set", "delay", &hold_cs.to_string(), ")"])
            .args(["+swap", "+delete"])
            .arg(animation);
        run_checked("extend-final-hold", &mut cmd)?;
        Ok(())
    }
}

fn run_checked(tool: &str, cmd: &mut Command) -> LapseResult<Output> {
    debug!(tool, "invoking toolchain capability");
    let output = cmd.output().map_err(|e| {
        LapseError::toolchain(tool, format!("failed to spawn (is it installed?): {e}"))
    })?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(LapseError::toolchain(
            tool,
            format!("exited with {}: {}", output.status, stderr.trim()),
        ));
    }
    Ok(output)
}

/// Parse `(width, height)` from an `identify` reply such as
/// `image.png PNG 1203x829 1203x829+0+0 8-bit sRGB 57.3KB`.
fn parse_dimensions(reply: &str) -> LapseResult<(u32, u32)> {
    let captures = PNG_GEOMETRY.captures(reply).ok_or_else(|| {
        LapseError::toolchain("identify", format!("no PNG geometry in reply '{}'", reply.trim()))
    })?;
    let width = captures[1]
        .parse::<u32>()
        .map_err(|_| LapseError::toolchain("identify", "width overflows u32"))?;
    let height = captures[2]
        .parse::<u32>()
        .map_err(|_| LapseError::toolchain("identify", "height overflows u32"))?;
    Ok((width, height))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_dimensions_reads_the_geometry_token() {
        let reply = "image.png PNG 1203x829 1203x829+0+0 8-bit sRGB 57.3KB 0.000u 0:00.000";
        assert_eq!(parse_dimensions(reply).unwrap(), (1203, 829));
    }

    #[test]
    fn parse_dimensions_rejects_a_garbled_reply() {
        let err = parse_dimensions("identify: unable to open image").unwrap_err();
        assert!(matches!(err, LapseError::Toolchain { .. }));
    }

    #[test]
    fn datamaps_bins_resolve_under_bin_dir() {
        let chain = ProcessToolchain::new("/opt/datamaps/bin");
        assert_eq!(chain.datamaps_bin("snap"), PathBuf::from("/opt/datamaps/bin/snap"));

        let from_path = ProcessToolchain::new("");
        assert_eq!(from_path.datamaps_bin("snap"), PathBuf::from("snap"));
    }

    #[cfg(unix)]
    #[test]
    fn run_checked_surfaces_exit_status_and_stderr() {
        let mut cmd = Command::new("sh");
        cmd.args(["-c", "echo boom >&2; exit 3"]);
        let err = run_checked("sh", &mut cmd).unwrap_err();
        let text = err.to_string();
        assert!(text.contains("boom"));
        assert!(text.contains("exit status: 3") || text.contains("exited with"));
    }

    #[cfg(unix)]
    #[test]
    fn run_checked_reports_spawn_failure() {
        let mut cmd = Command::new("/nonexistent/editlapse-tool");
        let err = run_checked("snap", &mut cmd).unwrap_err();
        assert!(err.to_string().contains("failed to spawn"));
    }
}
