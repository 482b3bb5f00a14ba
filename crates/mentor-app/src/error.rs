// error.rs — Startup errors: configuration and gateway construction.

use mentor_gateway::GatewayError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required setting is absent. Carries the key and its env variable.
    #[error("missing required setting {0} (set it in mentor.toml or via {1})")]
    Missing(&'static str, &'static str),

    #[error("invalid setting {key}: {reason}")]
    Invalid { key: &'static str, reason: String },

    #[error("I/O error at {path}: {source}")]
    IoError {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    ParseError {
        path: String,
        source: toml::de::Error,
    },
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to set up backend gateway: {0}")]
    Gateway(#[from] GatewayError),
}
