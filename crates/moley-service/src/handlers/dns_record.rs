use std::sync::Arc;

use async_trait::async_trait;
use moley_cloudflare::DnsPort;
use moley_domain::{ResourceState, Tunnel};
use moley_framework::{Context, FrameworkError, ResourceHandler};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DnsRecordConfig {
    pub tunnel: Tunnel,
    pub zone: String,
    /// The label routed under `zone`. `"*"` in wildcard-ingress mode.
    pub subdomain: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DnsRecordState {
    pub zone: String,
    pub name: String,
    pub content: String,
}

pub struct DnsRecordHandler {
    port: Arc<dyn DnsPort>,
}

impl DnsRecordHandler {
    pub fn new(port: Arc<dyn DnsPort>) -> Self {
        Self { port }
    }

    fn err(&self, e: impl std::fmt::Display) -> FrameworkError {
        FrameworkError::handler(self.name(), e.to_string())
    }

    fn hostname(config: &DnsRecordConfig) -> String {
        format!("{}.{}", config.subdomain, config.zone)
    }
}

#[async_trait]
impl ResourceHandler for DnsRecordHandler {
    type Config = DnsRecordConfig;
    type State = DnsRecordState;

    fn name(&self) -> &'static str {
        "dns-record"
    }

    fn equals(&self, a: &DnsRecordConfig, b: &DnsRecordConfig) -> bool {
        a.tunnel.id == b.tunnel.id && a.zone == b.zone && a.subdomain == b.subdomain
    }

    async fn create(&self, ctx: &Context, config: &DnsRecordConfig) -> Result<DnsRecordState, FrameworkError> {
        let hostname = Self::hostname(config);
        self.port.route_record(ctx, &config.tunnel, &hostname).await.map_err(|e| self.err(e))?;
        let content = self.port.content(&config.tunnel);
        Ok(DnsRecordState { zone: config.zone.clone(), name: hostname, content })
    }

    async fn destroy(&self, _ctx: &Context, state: &DnsRecordState) -> Result<(), FrameworkError> {
        self.port.delete_record(&state.zone, &state.name, &state.content).await.map_err(|e| self.err(e))
    }

    async fn check_from_state(&self, _ctx: &Context, state: &DnsRecordState) -> Result<ResourceState, FrameworkError> {
        let exists = self
            .port
            .record_exists(&state.zone, &state.name, &state.content)
            .await
            .map_err(|e| self.err(e))?;
        Ok(if exists { ResourceState::Up } else { ResourceState::Down })
    }

    async fn check_from_config(
        &self,
        _ctx: &Context,
        config: &DnsRecordConfig,
    ) -> Result<(DnsRecordState, ResourceState), FrameworkError> {
        let hostname = Self::hostname(config);
        let content = self.port.content(&config.tunnel);
        let exists =
            self.port.record_exists(&config.zone, &hostname, &content).await.map_err(|e| self.err(e))?;
        let state = DnsRecordState { zone: config.zone.clone(), name: hostname, content };
        Ok((state, if exists { ResourceState::Up } else { ResourceState::Down }))
    }
}
