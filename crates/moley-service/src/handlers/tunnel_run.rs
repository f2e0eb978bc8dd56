use std::sync::Arc;

use async_trait::async_trait;
use moley_cloudflare::TunnelPort;
use moley_domain::{ResourceState, Tunnel};
use moley_framework::{Context, FrameworkError, ResourceHandler};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TunnelRunConfig {
    pub tunnel: Tunnel,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TunnelRunState {
    pub tunnel: Tunnel,
    pub pid: u32,
}

/// Supervises the detached `cloudflared tunnel run` child process.
///
/// `check_from_config` cannot positively reacquire a process it has no
/// record of: a bare pid from a prior moley invocation might belong to an
/// unrelated process by the time this one starts. It always reports
/// `Unknown` rather than guessing, leaving adoption decisions to whatever
/// calls `stop` with that tag in hand.
pub struct TunnelRunHandler {
    port: Arc<dyn TunnelPort>,
}

impl TunnelRunHandler {
    pub fn new(port: Arc<dyn TunnelPort>) -> Self {
        Self { port }
    }

    fn err(&self, e: impl std::fmt::Display) -> FrameworkError {
        FrameworkError::handler(self.name(), e.to_string())
    }
}

#[async_trait]
impl ResourceHandler for TunnelRunHandler {
    type Config = TunnelRunConfig;
    type State = TunnelRunState;

    fn name(&self) -> &'static str {
        "tunnel-run"
    }

    fn equals(&self, a: &TunnelRunConfig, b: &TunnelRunConfig) -> bool {
        a.tunnel.id == b.tunnel.id
    }

    async fn create(&self, ctx: &Context, config: &TunnelRunConfig) -> Result<TunnelRunState, FrameworkError> {
        let config_path = self.port.configuration_path(&config.tunnel).map_err(|e| self.err(e))?;
        let pid = self.port.run(ctx, &config.tunnel, &config_path).await.map_err(|e| self.err(e))?;
        Ok(TunnelRunState { tunnel: config.tunnel.clone(), pid })
    }

    async fn destroy(&self, ctx: &Context, state: &TunnelRunState) -> Result<(), FrameworkError> {
        self.port.stop_run(ctx, state.pid).await.map_err(|e| self.err(e))
    }

    async fn check_from_state(&self, _ctx: &Context, state: &TunnelRunState) -> Result<ResourceState, FrameworkError> {
        Ok(if self.port.probe_run(state.pid) { ResourceState::Up } else { ResourceState::Down })
    }

    async fn check_from_config(
        &self,
        _ctx: &Context,
        config: &TunnelRunConfig,
    ) -> Result<(TunnelRunState, ResourceState), FrameworkError> {
        Ok((TunnelRunState { tunnel: config.tunnel.clone(), pid: 0 }, ResourceState::Unknown))
    }
}
