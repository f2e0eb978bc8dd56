use std::sync::Arc;

use async_trait::async_trait;
use moley_cloudflare::TunnelPort;
use moley_domain::{ResourceState, Tunnel};
use moley_framework::{Context, FrameworkError, ResourceHandler};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TunnelCreateConfig {
    pub tunnel: Tunnel,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TunnelCreateState {
    pub tunnel: Tunnel,
}

pub struct TunnelCreateHandler {
    port: Arc<dyn TunnelPort>,
}

impl TunnelCreateHandler {
    pub fn new(port: Arc<dyn TunnelPort>) -> Self {
        Self { port }
    }
}

#[async_trait]
impl ResourceHandler for TunnelCreateHandler {
    type Config = TunnelCreateConfig;
    type State = TunnelCreateState;

    fn name(&self) -> &'static str {
        "tunnel-create"
    }

    fn equals(&self, a: &TunnelCreateConfig, b: &TunnelCreateConfig) -> bool {
        a.tunnel.id == b.tunnel.id
    }

    async fn create(&self, ctx: &Context, config: &TunnelCreateConfig) -> Result<TunnelCreateState, FrameworkError> {
        self.port.create(ctx, &config.tunnel).await.map_err(|e| FrameworkError::handler(self.name(), e.to_string()))?;
        Ok(TunnelCreateState { tunnel: config.tunnel.clone() })
    }

    async fn destroy(&self, ctx: &Context, state: &TunnelCreateState) -> Result<(), FrameworkError> {
        self.port.delete(ctx, &state.tunnel).await.map_err(|e| FrameworkError::handler(self.name(), e.to_string()))
    }

    async fn check_from_state(&self, _ctx: &Context, state: &TunnelCreateState) -> Result<ResourceState, FrameworkError> {
        let exists =
            self.port.exists(&state.tunnel).await.map_err(|e| FrameworkError::handler(self.name(), e.to_string()))?;
        Ok(if exists { ResourceState::Up } else { ResourceState::Down })
    }

    async fn check_from_config(
        &self,
        _ctx: &Context,
        config: &TunnelCreateConfig,
    ) -> Result<(TunnelCreateState, ResourceState), FrameworkError> {
        let exists = self
            .port
            .exists(&config.tunnel)
            .await
            .map_err(|e| FrameworkError::handler(self.name(), e.to_string()))?;
        let state = TunnelCreateState { tunnel: config.tunnel.clone() };
        Ok((state, if exists { ResourceState::Up } else { ResourceState::Down }))
    }
}
