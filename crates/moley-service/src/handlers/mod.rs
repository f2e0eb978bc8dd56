mod dns_record;
mod tunnel_config;
mod tunnel_create;
mod tunnel_run;

pub use dns_record::{DnsRecordConfig, DnsRecordHandler, DnsRecordState};
pub use tunnel_config::{TunnelConfigConfig, TunnelConfigHandler, TunnelConfigState};
pub use tunnel_create::{TunnelCreateConfig, TunnelCreateHandler, TunnelCreateState};
pub use tunnel_run::{TunnelRunConfig, TunnelRunHandler, TunnelRunState};
