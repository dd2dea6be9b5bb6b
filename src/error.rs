use thiserror::Error;

#[derive(Debug, Error)]
pub enum TdsHelperError {
    #[error(transparent)]
    MssqlError(#[from] tiberius::error::Error),

    #[error(transparent)]
    IoError(#[from] std::io::Error),

    #[error("Missing required parameter {0}")]
    MissingRequiredParameter(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Parameter error: {0}")]
    ParameterError(String),

    #[error("Request error: {0}")]
    RequestError(String),

    #[error("Result parse error: {0}")]
    ResultParseError(#[source] serde_json::Error),
}
