use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

/// Identifier of a Cloudflare Tunnel. Wraps a UUID so stray strings can't
/// be passed where a validated id is expected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TunnelId(pub Uuid);

impl TunnelId {
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        Uuid::parse_str(raw)
            .map(TunnelId)
            .map_err(|_| DomainError::InvalidTunnelId(raw.to_string()))
    }

    pub fn as_str(&self) -> String {
        self.0.to_string()
    }
}

impl fmt::Display for TunnelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A Cloudflare Tunnel. The only state worth tracking at the domain level
/// is its id; everything else (credentials, ingress, the edge process) is
/// modeled as a separate resource kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tunnel {
    pub id: TunnelId,
}

impl Tunnel {
    pub fn new(id: TunnelId) -> Self {
        Self { id }
    }

    /// The name cloudflared and the Cloudflare API know this tunnel by.
    pub fn name(&self) -> String {
        format!("moley-{}", self.id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Http,
    Https,
    Tcp,
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Protocol::Http => "http",
            Protocol::Https => "https",
            Protocol::Tcp => "tcp",
        };
        write!(f, "{s}")
    }
}

impl Protocol {
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        match raw {
            "http" => Ok(Protocol::Http),
            "https" => Ok(Protocol::Https),
            "tcp" => Ok(Protocol::Tcp),
            other => Err(DomainError::UnknownProtocol(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    pub hostname: String,
    pub port: u16,
    pub protocol: Protocol,
}

impl Target {
    pub fn new(hostname: String, port: u16, protocol: Protocol) -> Result<Self, DomainError> {
        if hostname.is_empty() {
            return Err(DomainError::EmptyHostname);
        }
        if port == 0 {
            return Err(DomainError::ZeroPort);
        }
        Ok(Self { hostname, port, protocol })
    }

    pub fn target_url(&self) -> String {
        format!("{}://{}:{}", self.protocol, self.hostname, self.port)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expose {
    pub subdomain: String,
}

impl Expose {
    pub fn new(subdomain: String) -> Result<Self, DomainError> {
        if subdomain.is_empty() {
            return Err(DomainError::EmptySubdomain);
        }
        Ok(Self { subdomain })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    pub target: Target,
    pub expose: Expose,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IngressMode {
    Subdomain,
    Wildcard,
}

impl Default for IngressMode {
    fn default() -> Self {
        IngressMode::Subdomain
    }
}

impl IngressMode {
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        match raw {
            "subdomain" => Ok(IngressMode::Subdomain),
            "wildcard" => Ok(IngressMode::Wildcard),
            other => Err(DomainError::UnknownIngressMode(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ingress {
    pub zone: String,
    #[serde(default)]
    pub mode: IngressMode,
    pub apps: Vec<AppConfig>,
}

impl Ingress {
    pub fn new(zone: String, mode: IngressMode, apps: Vec<AppConfig>) -> Result<Self, DomainError> {
        if zone.is_empty() {
            return Err(DomainError::EmptyZone);
        }
        Ok(Self { zone, mode, apps })
    }
}

/// Three-valued convergence tag a handler's drift check returns.
/// `Unknown` covers cases where liveness can't be positively confirmed,
/// e.g. a supervised child process across a restart of moley itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceState {
    Up,
    Down,
    Unknown,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tunnel_name_is_prefixed_with_moley() {
        let id = TunnelId::parse("6ba7b810-9dad-11d1-80b4-00c04fd430c8").unwrap();
        let tunnel = Tunnel::new(id);
        assert_eq!(tunnel.name(), "moley-6ba7b810-9dad-11d1-80b4-00c04fd430c8");
    }

    #[test]
    fn target_url_interpolates_protocol_host_port() {
        let target = Target::new("localhost".into(), 3000, Protocol::Http).unwrap();
        assert_eq!(target.target_url(), "http://localhost:3000");
    }

    #[test]
    fn target_rejects_zero_port() {
        assert!(Target::new("localhost".into(), 0, Protocol::Http).is_err());
    }

    #[test]
    fn ingress_mode_defaults_to_subdomain() {
        let json = serde_json::json!({"zone": "moley.dev", "apps": []});
        let ingress: Ingress = serde_json::from_value(json).unwrap();
        assert_eq!(ingress.mode, IngressMode::Subdomain);
    }

    #[test]
    fn ingress_mode_rejects_unknown_string() {
        let json = serde_json::json!({"zone": "moley.dev", "mode": "round-robin", "apps": []});
        let result: Result<Ingress, _> = serde_json::from_value(json);
        assert!(result.is_err());
    }
}
