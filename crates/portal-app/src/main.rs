//! Portal interactive viewer
//!
//! Opens a window and renders the flow-field particles with a perspective
//! camera. Mouse wheel dollies, D toggles the debug plane.

mod viewer;

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Parser;
use portal_core::PortalConfig;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file path; built-in defaults when omitted
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Seed for the flow field's base state
    #[arg(short, long)]
    seed: Option<u64>,
}

fn load_config(path: &Path) -> Result<PortalConfig> {
    let text = std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    serde_yaml::from_str(&text).with_context(|| format!("Failed to parse {}", path.display()))
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let (mut config, resource_root) = match &cli.config {
        Some(path) => {
            log::info!("Loading configuration from {}", path.display());
            let root = path.parent().map(Path::to_path_buf).unwrap_or_default();
            (load_config(path)?, root)
        }
        None => (PortalConfig::default(), std::env::current_dir()?),
    };

    if let Some(seed) = cli.seed {
        config.flow_field.seed = seed;
    }
    if let Err(err) = config.validate() {
        bail!("Invalid configuration: {}", err);
    }

    log::info!(
        "Starting Portal viewer: {} particles, seed {}, {:?} precision",
        config.flow_field.count,
        config.flow_field.seed,
        config.flow_field.precision
    );

    pollster::block_on(viewer::run_viewer(config, resource_root))
}
