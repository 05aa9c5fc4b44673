use engine::EngineError;
use reqwest::StatusCode;

#[derive(Debug, thiserror::Error)]
pub enum SheetsError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("{status}: {message}")]
    Api { status: StatusCode, message: String },
    #[error("invalid credentials file: {0}")]
    Credentials(String),
    #[error("failed to sign token request: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid url: {0}")]
    Url(String),
    #[error("no spreadsheet titled \"{0}\" is shared with the service account")]
    SpreadsheetNotFound(String),
    #[error("background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl From<SheetsError> for EngineError {
    fn from(value: SheetsError) -> Self {
        EngineError::Storage(value.to_string())
    }
}
