use thiserror::Error;

#[derive(Error, Debug)]
pub enum TipError {
    #[error("{0}")]
    InvalidAmount(String),
    #[error("{0}")]
    InvalidPhone(String),
    #[error("Gateway unavailable: {0}")]
    GatewayUnavailable(String),
    #[error("Gateway timeout: {0}")]
    GatewayTimeout(String),
    #[error("Gateway rejected the request: {0}")]
    GatewayRejected(String),
    #[error("Internal error: {0}")]
    InternalError(String),
    #[error("Payment request cancelled")]
    Cancelled,
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, TipError>;
