use std::path::{Path, PathBuf};

use async_trait::async_trait;
use moley_domain::Tunnel;
use moley_framework::Context;

use crate::error::CloudflareError;

/// Port consumed by the tunnel-create, tunnel-config, and tunnel-run
/// handlers. A single `CloudflareEdge` implements this using the
/// `cloudflared` CLI for everything that isn't a plain DNS lookup.
#[async_trait]
pub trait TunnelPort: Send + Sync {
    async fn create(&self, ctx: &Context, tunnel: &Tunnel) -> Result<(), CloudflareError>;
    async fn delete(&self, ctx: &Context, tunnel: &Tunnel) -> Result<(), CloudflareError>;
    async fn exists(&self, tunnel: &Tunnel) -> Result<bool, CloudflareError>;

    async fn save_configuration(
        &self,
        ctx: &Context,
        tunnel: &Tunnel,
        ingress: &moley_domain::Ingress,
    ) -> Result<PathBuf, CloudflareError>;
    async fn delete_configuration(&self, ctx: &Context, tunnel: &Tunnel) -> Result<(), CloudflareError>;
    fn configuration_path(&self, tunnel: &Tunnel) -> Result<PathBuf, CloudflareError>;

    async fn run(&self, ctx: &Context, tunnel: &Tunnel, config_path: &Path) -> Result<u32, CloudflareError>;
    async fn stop_run(&self, ctx: &Context, pid: u32) -> Result<(), CloudflareError>;
    fn probe_run(&self, pid: u32) -> bool;

    async fn get_id(&self, tunnel: &Tunnel) -> Result<String, CloudflareError>;
    async fn get_account_id(&self, tunnel: &Tunnel) -> Result<String, CloudflareError>;
    fn credentials_path(&self, tunnel_id: &str) -> Result<PathBuf, CloudflareError>;
}

/// Port consumed by the DNS-record handler.
#[async_trait]
pub trait DnsPort: Send + Sync {
    async fn zone_id(&self, zone: &str) -> Result<String, CloudflareError>;

    /// The DNS record content a tunnel is routed through.
    fn content(&self, tunnel: &Tunnel) -> String;

    async fn record_exists(&self, zone: &str, hostname: &str, content: &str) -> Result<bool, CloudflareError>;
    async fn route_record(&self, ctx: &Context, tunnel: &Tunnel, hostname: &str) -> Result<(), CloudflareError>;
    async fn delete_record(&self, zone: &str, hostname: &str, content: &str) -> Result<(), CloudflareError>;
}
