use std::path::Path;
use std::process::Stdio;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::Deserialize;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::error::CloudflareError;

/// Thin wrapper around the `cloudflared` binary. Every call shells out;
/// there is no daemon-mode client library to link against.
pub struct CloudflaredCli {
    binary: String,
}

impl Default for CloudflaredCli {
    fn default() -> Self {
        Self { binary: "cloudflared".into() }
    }
}

#[derive(Debug, Deserialize)]
struct TunnelToken {
    #[serde(rename = "t")]
    tunnel_id: String,
    #[serde(rename = "a")]
    account_id: String,
}

#[derive(Debug, Deserialize)]
struct TunnelListEntry {
    name: String,
}

impl CloudflaredCli {
    async fn run(&self, args: &[&str]) -> Result<String, CloudflareError> {
        debug!(args = ?args, "running cloudflared");
        let output = Command::new(&self.binary)
            .args(args)
            .output()
            .await
            .map_err(CloudflareError::Spawn)?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(CloudflareError::CliFailed {
                args: args.iter().map(|a| a.to_string()).collect(),
                stderr,
            });
        }

        String::from_utf8(output.stdout).map(|s| s.trim().to_string()).map_err(|_| CloudflareError::InvalidOutput)
    }

    pub async fn create_tunnel(&self, name: &str) -> Result<(), CloudflareError> {
        self.run(&["tunnel", "create", name]).await.map(|_| ())
    }

    /// cloudflared's `cleanup` drops stale DNS/ingress leftovers before the
    /// tunnel record itself is deleted. Its failure is logged but never
    /// aborts the delete — an orphaned cleanup is recoverable, a stuck
    /// tunnel that can't be deleted is not.
    pub async fn cleanup_tunnel(&self, name: &str) {
        if let Err(err) = self.run(&["tunnel", "cleanup", name]).await {
            warn!(tunnel = name, error = %err, "tunnel cleanup failed, continuing with delete");
        }
    }

    pub async fn delete_tunnel(&self, name: &str) -> Result<(), CloudflareError> {
        self.run(&["tunnel", "delete", name]).await.map(|_| ())
    }

    pub async fn tunnel_exists(&self, name: &str) -> Result<bool, CloudflareError> {
        let raw = self.run(&["tunnel", "list", "--output", "json"]).await?;
        if raw.trim() == "null" || raw.trim().is_empty() {
            return Ok(false);
        }
        let entries: Vec<TunnelListEntry> = serde_json::from_str(&raw)?;
        Ok(entries.iter().any(|e| e.name == name))
    }

    pub async fn get_token(&self, name: &str) -> Result<(String, String), CloudflareError> {
        let raw = self.run(&["tunnel", "token", name]).await?;
        let decoded = BASE64.decode(raw.as_bytes()).map_err(|e| CloudflareError::TokenDecode(e.to_string()))?;
        let token: TunnelToken =
            serde_json::from_slice(&decoded).map_err(|e| CloudflareError::TokenDecode(e.to_string()))?;
        Ok((token.tunnel_id, token.account_id))
    }

    pub async fn route_dns(&self, tunnel_name: &str, hostname: &str) -> Result<(), CloudflareError> {
        self.run(&["tunnel", "route", "dns", tunnel_name, hostname]).await.map(|_| ())
    }

    /// Spawns `cloudflared tunnel run` detached from this process and
    /// returns its pid. The child outlives moley's own process by design:
    /// the tunnel should stay up across a moley restart, only going down
    /// when `TunnelRunHandler::destroy` explicitly signals it.
    pub fn spawn_run(&self, tunnel_name: &str, config_path: &Path) -> Result<u32, CloudflareError> {
        let mut command = std::process::Command::new(&self.binary);
        command
            .args(["tunnel", "--config", &config_path.display().to_string(), "run", tunnel_name])
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        detach_from_session(&mut command);

        let child = command.spawn().map_err(CloudflareError::Spawn)?;
        Ok(child.id())
    }
}

#[cfg(unix)]
fn detach_from_session(command: &mut std::process::Command) {
    use std::os::unix::process::CommandExt;
    unsafe {
        command.pre_exec(|| {
            libc::setsid();
            Ok(())
        });
    }
}

#[cfg(not(unix))]
fn detach_from_session(_command: &mut std::process::Command) {}

#[cfg(unix)]
pub fn terminate_process(pid: u32) -> Result<(), CloudflareError> {
    let result = unsafe { libc::kill(pid as libc::pid_t, libc::SIGTERM) };
    if result != 0 {
        let err = std::io::Error::last_os_error();
        if err.raw_os_error() == Some(libc::ESRCH) {
            return Ok(()); // already dead
        }
        return Err(CloudflareError::Io { path: format!("pid {pid}"), source: err });
    }
    Ok(())
}

/// Probes whether `pid` is still alive via a signal-0 send, mirroring the
/// classic "does this process exist" check: no signal is actually
/// delivered, only error codes are observed.
#[cfg(unix)]
pub fn probe_process(pid: u32) -> bool {
    let result = unsafe { libc::kill(pid as libc::pid_t, 0) };
    result == 0
}

#[cfg(not(unix))]
pub fn terminate_process(_pid: u32) -> Result<(), CloudflareError> {
    Ok(())
}

#[cfg(not(unix))]
pub fn probe_process(_pid: u32) -> bool {
    false
}
