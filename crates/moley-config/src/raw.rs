use serde::{Deserialize, Serialize};

/// Raw YAML representation of a moley config file.
#[derive(Debug, Deserialize, Serialize)]
pub struct RawConfig {
    pub tunnel_id: String,
    pub zone: String,
    /// "subdomain" (default) or "wildcard".
    #[serde(default)]
    pub mode: Option<String>,
    #[serde(default)]
    pub apps: Vec<RawApp>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct RawApp {
    pub hostname: String,
    pub port: u16,
    /// "http" (default), "https", or "tcp".
    #[serde(default = "default_protocol")]
    pub protocol: String,
    pub subdomain: String,
}

fn default_protocol() -> String {
    "http".to_string()
}
