//! Error types for the agent

use thiserror::Error;

pub type Result<T> = std::result::Result<T, AgentError>;

#[derive(Debug, Error)]
pub enum AgentError {
    /// IO operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP client could not be built
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// TLS certificate or key could not be loaded
    #[error("TLS error: {0}")]
    Tls(String),

    /// A synthetic status sub-request could not be built
    #[error("Cannot build sub-request for /{0}: no probe registered")]
    UnknownRoute(String),
}

impl From<rustls::Error> for AgentError {
    fn from(err: rustls::Error) -> Self {
        AgentError::Tls(err.to_string())
    }
}
