use thiserror::Error;

pub type Result<T> = std::result::Result<T, AblyError>;

#[derive(Debug, Error)]
pub enum AblyError {
    /// Malformed API key or unusable local state
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(String),

    /// Non-2xx response from the REST API
    #[error("Ably API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Parse error: {0}")]
    Parse(String),
}
