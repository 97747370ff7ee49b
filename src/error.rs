use thiserror::Error;

use crate::validation::ValidationError;

/// Everything that can go wrong between a screen and the backend.
///
/// Only two families matter to the user: validation failures caught before
/// any request goes out, and request failures. Both collapse to a single
/// displayable string through [`ApiError::user_message`].
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Server returned {code}: {message}")]
    Status { code: u16, message: String },

    #[error("Rejected: {message}")]
    Rejected { message: String },

    #[error("Could not decode response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Response carried no data")]
    MissingData,

    #[error("Not signed in")]
    Unauthenticated,
}

impl ApiError {
    /// The string shown to the user in a notice or inline error
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Validation(e) => e.to_string(),
            ApiError::Transport(e) if e.is_timeout() => "Request timed out".to_string(),
            ApiError::Transport(e) if e.is_connect() => {
                "Cannot reach the server, check your connection".to_string()
            }
            ApiError::Transport(_) => "Network error, please try again".to_string(),
            ApiError::Status { message, .. } | ApiError::Rejected { message } => message.clone(),
            ApiError::Decode(_) | ApiError::MissingData => {
                "Unexpected response from server".to_string()
            }
            ApiError::Unauthenticated => "Please sign in again".to_string(),
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, ApiError::Validation(_))
    }

    /// True for 401 responses and missing sessions
    pub fn is_unauthorized(&self) -> bool {
        matches!(
            self,
            ApiError::Unauthenticated | ApiError::Status { code: 401, .. }
        )
    }
}
