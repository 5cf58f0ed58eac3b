use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use editlapse::{Animator, Config, ProcessToolchain};

#[derive(Parser, Debug)]
#[command(name = "editlapse", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render an OSM extract's edit history as a looping GIF.
    Render(RenderArgs),
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Input OSM extract.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Optional JSON configuration file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the working root holding per-frame staging directories.
    #[arg(long)]
    work_root: Option<PathBuf>,

    /// Override the output root holding the final animation.
    #[arg(long)]
    out_root: Option<PathBuf>,

    /// Override the directory containing the datamaps binaries.
    #[arg(long)]
    bin_dir: Option<PathBuf>,

    /// Override the zoom level.
    #[arg(long)]
    zoom: Option<u32>,
}

fn main() -> anyhow::Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Render(args) => cmd_render(args),
    }
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let mut cfg = match args.config.as_deref() {
        Some(path) => Config::from_path(path)?,
        None => Config::default(),
    };
    cfg.apply_env()?;
    if let Some(work_root) = args.work_root {
        cfg.work_root = work_root;
    }
    if let Some(out_root) = args.out_root {
        cfg.out_root = out_root;
    }
    if let Some(bin_dir) = args.bin_dir {
        cfg.bin_dir = bin_dir;
    }
    if let Some(zoom) = args.zoom {
        cfg.zoom = zoom;
    }

    let toolchain = ProcessToolchain::new(cfg.bin_dir.clone());
    let animation = Animator::new(&cfg, &toolchain).run(&args.in_path)?;
    eprintln!("wrote {}", animation.display());
    Ok(())
}
