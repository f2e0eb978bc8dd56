mod api;
mod cli;
mod config_file;
mod edge;
mod error;
mod paths;
mod ports;

pub use config_file::{render_ingress_file, CloudflaredConfigFile, CloudflaredIngressRule};
pub use edge::CloudflareEdge;
pub use error::CloudflareError;
pub use paths::moley_home;
pub use ports::{DnsPort, TunnelPort};
