use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use moley_cloudflare::{DnsPort, TunnelPort};
use moley_domain::{Ingress, IngressMode, Tunnel};
use moley_framework::{Context, FrameworkError, ResourceOrchestrator, Runnable};

use crate::handlers::{
    DnsRecordConfig, DnsRecordHandler, TunnelConfigConfig, TunnelConfigHandler, TunnelCreateConfig,
    TunnelCreateHandler, TunnelRunConfig, TunnelRunHandler,
};

/// Ties the four resource handlers together behind one declared start order
/// (tunnel create, then its config file, then the run process, then DNS) and
/// the exact reverse for stop. Rebuilds the orchestrator fresh on every call
/// so `start`/`stop` each see the registry as it stands right now.
pub struct Service {
    tunnel: Tunnel,
    ingress: Ingress,
    tunnel_port: Arc<dyn TunnelPort>,
    dns_port: Arc<dyn DnsPort>,
    registry_path: PathBuf,
}

impl Service {
    pub fn new(
        tunnel: Tunnel,
        ingress: Ingress,
        tunnel_port: Arc<dyn TunnelPort>,
        dns_port: Arc<dyn DnsPort>,
        registry_path: PathBuf,
    ) -> Self {
        Self { tunnel, ingress, tunnel_port, dns_port, registry_path }
    }

    fn dns_configs(&self) -> Vec<DnsRecordConfig> {
        match self.ingress.mode {
            IngressMode::Subdomain => self
                .ingress
                .apps
                .iter()
                .map(|app| DnsRecordConfig {
                    tunnel: self.tunnel.clone(),
                    zone: self.ingress.zone.clone(),
                    subdomain: app.expose.subdomain.clone(),
                })
                .collect(),
            IngressMode::Wildcard => vec![DnsRecordConfig {
                tunnel: self.tunnel.clone(),
                zone: self.ingress.zone.clone(),
                subdomain: "*".to_string(),
            }],
        }
    }

    fn build_orchestrator(&self) -> Result<ResourceOrchestrator, FrameworkError> {
        let mut orchestrator = ResourceOrchestrator::new(self.registry_path.clone())?;

        orchestrator.add_manager(
            Arc::new(TunnelCreateHandler::new(self.tunnel_port.clone())),
            vec![TunnelCreateConfig { tunnel: self.tunnel.clone() }],
        );
        orchestrator.add_manager(
            Arc::new(TunnelConfigHandler::new(self.tunnel_port.clone())),
            vec![TunnelConfigConfig { tunnel: self.tunnel.clone(), ingress: self.ingress.clone() }],
        );
        orchestrator.add_manager(
            Arc::new(TunnelRunHandler::new(self.tunnel_port.clone())),
            vec![TunnelRunConfig { tunnel: self.tunnel.clone() }],
        );
        orchestrator
            .add_manager(Arc::new(DnsRecordHandler::new(self.dns_port.clone())), self.dns_configs());

        Ok(orchestrator)
    }
}

#[async_trait]
impl Runnable for Service {
    async fn start(&self, ctx: &Context) -> Result<(), FrameworkError> {
        self.build_orchestrator()?.start(ctx).await
    }

    async fn stop(&self, ctx: &Context) -> Result<(), FrameworkError> {
        self.build_orchestrator()?.stop(ctx).await
    }
}
