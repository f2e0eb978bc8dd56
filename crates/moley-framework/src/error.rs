use thiserror::Error;

#[derive(Debug, Error)]
pub enum FrameworkError {
    #[error("handler {handler} failed: {message}")]
    Handler { handler: String, message: String },

    #[error("registry io error at {path}: {source}")]
    RegistryIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("registry entry is not valid json: {0}")]
    RegistrySerde(#[from] serde_json::Error),

    #[error("operation {name} failed: {source}")]
    Operation {
        name: String,
        #[source]
        source: Box<FrameworkError>,
    },

    #[error("shutdown did not complete within the grace period")]
    ShutdownTimedOut,
}

impl FrameworkError {
    pub fn handler(handler: impl Into<String>, message: impl Into<String>) -> Self {
        FrameworkError::Handler { handler: handler.into(), message: message.into() }
    }
}
