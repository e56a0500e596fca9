//! Tail-follow error taxonomy.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

#[derive(Debug, thiserror::Error)]
pub enum TailError {
    /// Rejected before any file access.
    #[error("invalid file name '{name}': {reason}")]
    InvalidName { name: String, reason: &'static str },

    /// Missing or not a regular file. Always reported before streaming starts.
    #[error("log file not found or is not a regular file: {0}")]
    NotFound(String),

    #[error("could not open file: {0}")]
    Open(#[source] std::io::Error),

    #[error("could not get file info: {0}")]
    Stat(#[source] std::io::Error),

    #[error("could not read file: {0}")]
    Read(#[source] std::io::Error),
}

impl TailError {
    pub fn status(&self) -> StatusCode {
        match self {
            TailError::InvalidName { .. } => StatusCode::BAD_REQUEST,
            TailError::NotFound(_) => StatusCode::NOT_FOUND,
            TailError::Open(_) | TailError::Stat(_) | TailError::Read(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// Pre-stream failures become a plain-text response.
impl IntoResponse for TailError {
    fn into_response(self) -> Response {
        (self.status(), format!("Error: {}\n", self)).into_response()
    }
}
