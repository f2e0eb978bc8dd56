use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use moley_cloudflare::TunnelPort;
use moley_domain::{Ingress, ResourceState, Tunnel};
use moley_framework::{Context, FrameworkError, ResourceHandler};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TunnelConfigConfig {
    pub tunnel: Tunnel,
    pub ingress: Ingress,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TunnelConfigState {
    pub tunnel: Tunnel,
    pub path: PathBuf,
}

pub struct TunnelConfigHandler {
    port: Arc<dyn TunnelPort>,
}

impl TunnelConfigHandler {
    pub fn new(port: Arc<dyn TunnelPort>) -> Self {
        Self { port }
    }

    fn err(&self, e: impl std::fmt::Display) -> FrameworkError {
        FrameworkError::handler(self.name(), e.to_string())
    }
}

#[async_trait]
impl ResourceHandler for TunnelConfigHandler {
    type Config = TunnelConfigConfig;
    type State = TunnelConfigState;

    fn name(&self) -> &'static str {
        "tunnel-config"
    }

    fn equals(&self, a: &TunnelConfigConfig, b: &TunnelConfigConfig) -> bool {
        a.tunnel.id == b.tunnel.id
    }

    async fn create(&self, ctx: &Context, config: &TunnelConfigConfig) -> Result<TunnelConfigState, FrameworkError> {
        let path = self
            .port
            .save_configuration(ctx, &config.tunnel, &config.ingress)
            .await
            .map_err(|e| self.err(e))?;
        Ok(TunnelConfigState { tunnel: config.tunnel.clone(), path })
    }

    async fn destroy(&self, ctx: &Context, state: &TunnelConfigState) -> Result<(), FrameworkError> {
        self.port.delete_configuration(ctx, &state.tunnel).await.map_err(|e| self.err(e))
    }

    async fn check_from_state(&self, _ctx: &Context, state: &TunnelConfigState) -> Result<ResourceState, FrameworkError> {
        Ok(if state.path.exists() { ResourceState::Up } else { ResourceState::Down })
    }

    async fn check_from_config(
        &self,
        _ctx: &Context,
        config: &TunnelConfigConfig,
    ) -> Result<(TunnelConfigState, ResourceState), FrameworkError> {
        let path = self.port.configuration_path(&config.tunnel).map_err(|e| self.err(e))?;
        let state_tag = if path.exists() { ResourceState::Up } else { ResourceState::Down };
        Ok((TunnelConfigState { tunnel: config.tunnel.clone(), path }, state_tag))
    }
}
