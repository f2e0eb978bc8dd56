use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("io error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("yaml parse error in {path}: {source}")]
    YamlParse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid value for {env_var}: {message}")]
    EnvOverride { env_var: &'static str, message: String },

    #[error("domain error: {0}")]
    Domain(#[from] moley_domain::DomainError),
}
