use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::context::Context;
use crate::error::FrameworkError;

const SHUTDOWN_GRACE: Duration = Duration::from_secs(30);

/// Anything the managed runner can start and, eventually, stop exactly
/// once. `moley-service`'s `Service` is the only implementor today.
#[async_trait]
pub trait Runnable: Send + Sync {
    async fn start(&self, ctx: &Context) -> Result<(), FrameworkError>;
    async fn stop(&self, ctx: &Context) -> Result<(), FrameworkError>;
}

/// Runs `runnable.start` until it returns or an OS shutdown signal
/// arrives, whichever comes first, then calls `runnable.stop` exactly
/// once against a fresh context (detached from whatever triggered the
/// stop) bounded by a 30 second grace period.
pub async fn run_managed(ctx: Context, runnable: Arc<dyn Runnable>) -> Result<(), FrameworkError> {
    let running = runnable.clone();
    let start_handle = tokio::spawn(async move { running.start(&ctx).await });

    let start_result = tokio::select! {
        result = start_handle => {
            info!("runnable finished on its own, shutting down");
            Some(join_result(result))
        }
        _ = wait_for_shutdown_signal() => {
            info!("shutdown signal received");
            None
        }
    };

    let stop_ctx = ctx.detached();
    let stop_outcome = tokio::time::timeout(SHUTDOWN_GRACE, runnable.stop(&stop_ctx)).await;
    let stop_result: Result<(), FrameworkError> = match stop_outcome {
        Ok(inner) => inner,
        Err(_) => {
            warn!("stop did not complete within the grace period");
            Err(FrameworkError::ShutdownTimedOut)
        }
    };

    // Start's error is the more diagnostically useful one when both fail:
    // stop's failure is usually just fallout from an already-broken runnable.
    match start_result {
        Some(Err(start_err)) => {
            if let Err(stop_err) = stop_result {
                warn!(error = %stop_err, "stop also failed, but start's error takes precedence");
            }
            Err(start_err)
        }
        _ => stop_result,
    }
}

fn join_result(result: Result<Result<(), FrameworkError>, tokio::task::JoinError>) -> Result<(), FrameworkError> {
    match result {
        Ok(inner) => inner,
        Err(join_err) => Err(FrameworkError::handler("runnable", join_err.to_string())),
    }
}

#[cfg(unix)]
async fn wait_for_shutdown_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigint = signal(SignalKind::interrupt()).expect("install SIGINT handler");
    let mut sigterm = signal(SignalKind::terminate()).expect("install SIGTERM handler");
    let mut sigquit = signal(SignalKind::quit()).expect("install SIGQUIT handler");
    let mut sighup = signal(SignalKind::hangup()).expect("install SIGHUP handler");

    tokio::select! {
        _ = sigint.recv() => {}
        _ = sigterm.recv() => {}
        _ = sigquit.recv() => {}
        _ = sighup.recv() => {}
    }
}

#[cfg(not(unix))]
async fn wait_for_shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
