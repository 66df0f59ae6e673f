use http::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    // general
    #[error("{0}")]
    General(String, StatusCode),
    #[error("Param error: {0}")]
    ParamError(String),
    #[error("JSON parse error: {0}")]
    JSONParseError(#[from] serde_json::error::Error),
    #[error("HTTP general error: {0}")]
    HttpError(#[from] http::Error),
    #[error("HTTP client error: {0}")]
    HttpClientError(#[from] hyper::Error),
    #[error("Form encode error: {0}")]
    FormEncodeError(#[from] serde_urlencoded::ser::Error),
    #[error("Config error: {0}")]
    ConfigError(#[from] config::ConfigError),
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Upstream request timed out")]
    Timeout,
    #[error("Refresh process already running")]
    ProcessRunning,
    #[error("Unknown solar system: {0}")]
    UnknownSystem(String),
}

pub type Result<T> = std::result::Result<T, Error>;
