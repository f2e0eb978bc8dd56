use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("tunnel id must be a valid uuid: {0}")]
    InvalidTunnelId(String),

    #[error("target hostname must not be empty")]
    EmptyHostname,

    #[error("target port must not be zero")]
    ZeroPort,

    #[error("expose subdomain must not be empty")]
    EmptySubdomain,

    #[error("ingress zone must not be empty")]
    EmptyZone,

    #[error("unknown ingress mode: {0:?}")]
    UnknownIngressMode(String),

    #[error("unknown protocol: {0:?}")]
    UnknownProtocol(String),
}
