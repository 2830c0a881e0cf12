pub mod blocks;
pub mod groups;
pub mod serve;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Review server gate that rejects write operations from blocked groups
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Path to the configuration file
    #[arg(
        short,
        long,
        default_value = "/etc/revgate/revgate.toml",
        env = "CONFIG_PATH"
    )]
    config_path: PathBuf,
    #[command(subcommand)]
    inner: Commands,
}

impl Args {
    pub async fn run(self) {
        let config = crate::config::Config::load(&self.config_path);
        match self.inner {
            Commands::Serve(inner) => inner.run(config).await,
            Commands::Blocks(inner) => inner.run(config).await,
            Commands::Groups(inner) => inner.run(config).await,
        }
    }
}

#[derive(Debug, Subcommand)]
enum Commands {
    Serve(serve::Command),
    Blocks(blocks::Command),
    Groups(groups::Command),
}
