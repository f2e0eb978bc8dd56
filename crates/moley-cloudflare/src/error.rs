use thiserror::Error;

#[derive(Debug, Error)]
pub enum CloudflareError {
    #[error("cloudflared {args:?} failed: {stderr}")]
    CliFailed { args: Vec<String>, stderr: String },

    #[error("failed to spawn cloudflared: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("cloudflared emitted output that wasn't valid utf-8")]
    InvalidOutput,

    #[error("failed to decode tunnel token: {0}")]
    TokenDecode(String),

    #[error("cloudflare api request failed: {0}")]
    Api(#[from] reqwest::Error),

    #[error("cloudflare api returned no matching zone for {0:?}")]
    ZoneNotFound(String),

    #[error("cloudflare api returned more than one zone for {0:?}")]
    AmbiguousZone(String),

    #[error("filesystem error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}
