use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Hero not found: {0}")]
    HeroNotFound(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failures of a single round trip to the statistics service.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StatsError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("unexpected status {code} from {url}")]
    Status { code: u16, url: String },

    #[error("malformed response: {0}")]
    Decode(String),
}
