use thiserror::Error;

/// Configuration-related errors with structured variants.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("failed to read config file: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[source] toml::de::Error),
}

/// Feed acquisition errors.
///
/// The taxonomy drives retry behavior: transient errors are retried per the
/// backoff policy and never surfaced as fatal, protocol errors drop the single
/// offending message, and source-unavailable errors are surfaced explicitly
/// and flip the ingestor into degraded mode.
#[derive(Error, Debug)]
pub enum FeedError {
    /// Connect or fetch failure. Retried, never fatal.
    #[error("transient feed error: {0}")]
    Transient(String),

    /// Unparseable message or payload. The message is dropped and the
    /// connection state is unaffected.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Health check failed or reconnect attempts are exhausted. Surfaced to
    /// the caller as a status flag, never silently presented as a live
    /// connection.
    #[error("source unavailable: {0}")]
    SourceUnavailable(String),
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Feed(#[from] FeedError),

    #[error("WebSocket error: {0}")]
    WebSocket(Box<tokio_tungstenite::tungstenite::Error>),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<tokio_tungstenite::tungstenite::Error> for Error {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        Error::WebSocket(Box::new(err))
    }
}
