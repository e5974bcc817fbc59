use iclassauth::AuthError;
use thiserror::Error;

/// All errors produced by the iClass application layer.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("request to {endpoint} failed: {detail}")]
    Http { endpoint: &'static str, detail: String },

    #[error("{endpoint} answered HTTP {status}")]
    UnexpectedStatus { endpoint: &'static str, status: u16 },

    #[error("{endpoint} answered STATUS={status:?}")]
    ApiStatus { endpoint: &'static str, status: String },

    #[error("no semester available for this user")]
    NoSemester,

    #[error("invalid course entry {0:?}: expected \"name:id\"")]
    InvalidProfileEntry(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, AppError>;
