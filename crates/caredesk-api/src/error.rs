use thiserror::Error;

/// Failures talking to the backend
///
/// Network, HTTP and parse failures are kept apart because the views
/// report them differently, but none of them is ever retried here.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Request failed ({status}): {message}")]
    Http { status: u16, message: String },

    #[error("Could not parse response: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Unexpected response shape: {0}")]
    Shape(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self.status(), Some(401) | Some(403))
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;
