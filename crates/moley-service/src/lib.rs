mod handlers;
mod service;

pub use handlers::{
    DnsRecordConfig, DnsRecordHandler, DnsRecordState, TunnelConfigConfig, TunnelConfigHandler, TunnelConfigState,
    TunnelCreateConfig, TunnelCreateHandler, TunnelCreateState, TunnelRunConfig, TunnelRunHandler, TunnelRunState,
};
pub use service::Service;
