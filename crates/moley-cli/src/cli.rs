use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "moley", about = "Keeps a Cloudflare Tunnel's lifecycle reconciled against a YAML config", version)]
pub struct Cli {
    /// Cloudflare API token used for DNS zone/record lookups.
    #[arg(long, env = "CLOUDFLARE_API_TOKEN", global = true)]
    pub api_token: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Bring the tunnel up and supervise it until a shutdown signal arrives.
    Run {
        /// Path to the moley config file.
        #[arg(long)]
        config: PathBuf,

        /// Report what would change without touching cloudflared or the API.
        #[arg(long)]
        dry_run: bool,
    },

    /// Tear down everything the config describes.
    Down {
        /// Path to the moley config file.
        #[arg(long)]
        config: PathBuf,

        /// Report what would change without touching cloudflared or the API.
        #[arg(long)]
        dry_run: bool,
    },
}
