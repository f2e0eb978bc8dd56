use std::path::{Path, PathBuf};

use async_trait::async_trait;
use moley_domain::{Ingress, Tunnel};
use moley_framework::{run_guarded, Context};

use crate::api::CloudflareApiClient;
use crate::cli::{self, CloudflaredCli};
use crate::config_file::render_ingress_file;
use crate::error::CloudflareError;
use crate::paths;
use crate::ports::{DnsPort, TunnelPort};

/// The concrete `TunnelPort` + `DnsPort` implementation: `cloudflared` CLI
/// for anything tunnel-lifecycle-shaped, Cloudflare's REST API for DNS
/// lookups and deletes, matching the split the edge genuinely exposes
/// (the CLI has no "list DNS records" verb, and the API has no "run a
/// tunnel" verb).
pub struct CloudflareEdge {
    cli: CloudflaredCli,
    api: CloudflareApiClient,
}

impl CloudflareEdge {
    pub fn new(api_token: String) -> Self {
        Self { cli: CloudflaredCli::default(), api: CloudflareApiClient::new(api_token) }
    }
}

#[async_trait]
impl TunnelPort for CloudflareEdge {
    async fn create(&self, ctx: &Context, tunnel: &Tunnel) -> Result<(), CloudflareError> {
        let name = tunnel.name();
        run_guarded(ctx, Ok(()), || async move { self.cli.create_tunnel(&name).await }).await
    }

    async fn delete(&self, ctx: &Context, tunnel: &Tunnel) -> Result<(), CloudflareError> {
        let name = tunnel.name();
        run_guarded(ctx, Ok(()), || async move {
            self.cli.cleanup_tunnel(&name).await;
            self.cli.delete_tunnel(&name).await
        })
        .await
    }

    async fn exists(&self, tunnel: &Tunnel) -> Result<bool, CloudflareError> {
        self.cli.tunnel_exists(&tunnel.name()).await
    }

    async fn save_configuration(
        &self,
        ctx: &Context,
        tunnel: &Tunnel,
        ingress: &Ingress,
    ) -> Result<PathBuf, CloudflareError> {
        let path = self.configuration_path(tunnel)?;
        let tunnel_id = tunnel.id.as_str();
        run_guarded(ctx, Ok(path.clone()), || async move {
            let credentials = self.credentials_path(&tunnel_id)?;
            let rendered = render_ingress_file(tunnel, ingress, credentials.display().to_string());
            let yaml = serde_yaml::to_string(&rendered)?;
            std::fs::write(&path, yaml)
                .map_err(|e| CloudflareError::Io { path: path.display().to_string(), source: e })?;
            set_owner_only(&path);
            Ok(path.clone())
        })
        .await
    }

    async fn delete_configuration(&self, ctx: &Context, tunnel: &Tunnel) -> Result<(), CloudflareError> {
        let path = self.configuration_path(tunnel)?;
        run_guarded(ctx, Ok(()), || async move {
            match std::fs::remove_file(&path) {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
                Err(e) => Err(CloudflareError::Io { path: path.display().to_string(), source: e }),
            }
        })
        .await
    }

    fn configuration_path(&self, tunnel: &Tunnel) -> Result<PathBuf, CloudflareError> {
        paths::tunnel_config_path(&tunnel.name())
    }

    async fn run(&self, ctx: &Context, tunnel: &Tunnel, config_path: &Path) -> Result<u32, CloudflareError> {
        let name = tunnel.name();
        run_guarded(ctx, Ok(0), || async move { self.cli.spawn_run(&name, config_path) }).await
    }

    async fn stop_run(&self, ctx: &Context, pid: u32) -> Result<(), CloudflareError> {
        run_guarded(ctx, Ok(()), || async move { cli::terminate_process(pid) }).await
    }

    fn probe_run(&self, pid: u32) -> bool {
        cli::probe_process(pid)
    }

    async fn get_id(&self, tunnel: &Tunnel) -> Result<String, CloudflareError> {
        self.cli.get_token(&tunnel.name()).await.map(|(id, _)| id)
    }

    async fn get_account_id(&self, tunnel: &Tunnel) -> Result<String, CloudflareError> {
        self.cli.get_token(&tunnel.name()).await.map(|(_, account)| account)
    }

    fn credentials_path(&self, tunnel_id: &str) -> Result<PathBuf, CloudflareError> {
        paths::credentials_path(tunnel_id)
    }
}

#[async_trait]
impl DnsPort for CloudflareEdge {
    async fn zone_id(&self, zone: &str) -> Result<String, CloudflareError> {
        self.api.zone_id(zone).await
    }

    fn content(&self, tunnel: &Tunnel) -> String {
        format!("{}.cfargotunnel.com", tunnel.id)
    }

    async fn record_exists(&self, zone: &str, hostname: &str, content: &str) -> Result<bool, CloudflareError> {
        let zone_id = self.api.zone_id(zone).await?;
        Ok(self.api.find_record(&zone_id, hostname, content).await?.is_some())
    }

    async fn route_record(&self, ctx: &Context, tunnel: &Tunnel, hostname: &str) -> Result<(), CloudflareError> {
        let name = tunnel.name();
        run_guarded(ctx, Ok(()), || async move { self.cli.route_dns(&name, hostname).await }).await
    }

    async fn delete_record(&self, zone: &str, hostname: &str, content: &str) -> Result<(), CloudflareError> {
        let zone_id = self.api.zone_id(zone).await?;
        if let Some(record) = self.api.find_record(&zone_id, hostname, content).await? {
            self.api.delete_record(&zone_id, &record.id).await?;
        }
        Ok(())
    }
}

#[cfg(unix)]
fn set_owner_only(path: &Path) {
    use std::os::unix::fs::PermissionsExt;
    if let Ok(metadata) = std::fs::metadata(path) {
        let mut perms = metadata.permissions();
        perms.set_mode(0o600);
        let _ = std::fs::set_permissions(path, perms);
    }
}

#[cfg(not(unix))]
fn set_owner_only(_path: &Path) {}
