mod error;
mod types;

pub use error::DomainError;
pub use types::{
    AppConfig, Expose, Ingress, IngressMode, Protocol, ResourceState, Target, Tunnel, TunnelId,
};
