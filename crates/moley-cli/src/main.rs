mod cli;

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Command};
use moley_cloudflare::CloudflareEdge;
use moley_framework::{run_managed, Context, Runnable};
use moley_service::Service;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).with_target(false).init();

    let cli = Cli::parse();

    match cli.command {
        Command::Run { config, dry_run } => {
            let service = build_service(&cli.api_token, &config)?;
            let ctx = Context::new(dry_run);
            run_managed(ctx, Arc::new(service)).await?;
        }
        Command::Down { config, dry_run } => {
            let service = build_service(&cli.api_token, &config)?;
            let ctx = Context::new(dry_run);
            service.stop(&ctx).await?;
        }
    }

    Ok(())
}

fn build_service(api_token: &str, config_path: &std::path::Path) -> Result<Service> {
    let (tunnel, ingress) = moley_config::load_tunnel_config(config_path)?;
    let edge = Arc::new(CloudflareEdge::new(api_token.to_string()));
    let registry_path = moley_cloudflare::moley_home()?.join("moley.lock");
    Ok(Service::new(tunnel, ingress, edge.clone(), edge, registry_path))
}
