use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use rfmri_pipelines::config::{self, Epi2EpiConfig};

#[derive(Parser)]
#[command(name = "epi2epi-flirt")]
#[command(about = "Deformation field between two EPI time series via flirt")]
struct Cli {
    /// Pipeline configuration file
    #[arg(short, long, required_unless_present = "write_config")]
    config: Option<PathBuf>,

    /// Write a config template to the given path and exit
    #[arg(long)]
    write_config: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    if let Some(path) = cli.write_config {
        config::write_default::<Epi2EpiConfig>(&path)?;
        println!("wrote config template to {}", path.display());
        return Ok(());
    }

    let config: Epi2EpiConfig = config::load(&cli.config.expect("clap enforces the flag"))?;
    rfmri_pipelines::epi2epi_flirt(&config)
}
