//! Classification of failed API calls into what a user gets to see.

use thiserror::Error;

use crate::api::envelope::FieldError;
use crate::engine::ComputeError;

/// Shown for every failure that carries no user-facing explanation.
pub const GENERIC_ERROR_MESSAGE: &str = "Something went wrong. Please try again.";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// 401: the session is missing or expired; the caller sends the user to sign in.
    #[error("Unauthorized")]
    Unauthorized,
    /// 3xx/4xx (other than 401): the server refused the request and said why.
    #[error("Request rejected ({status}): {message}")]
    Rejected {
        status: u16,
        message: String,
        errors: Vec<FieldError>,
    },
    #[error("Server error ({status})")]
    Server { status: u16 },
    #[error("Network error: {0}")]
    Network(String),
    #[error("Unexpected response: {0}")]
    Decode(String),
    /// The in-process engine refused the input.
    #[error(transparent)]
    Compute(#[from] ComputeError),
    /// Superseded by a newer request.
    #[error("Request cancelled")]
    Cancelled,
}

impl ApiError {
    /// Map a non-success HTTP status and the server's envelope message to an error.
    pub fn from_status(status: u16, message: Option<String>, errors: Vec<FieldError>) -> Self {
        match status {
            401 => ApiError::Unauthorized,
            300..=499 => ApiError::Rejected {
                status,
                message: message
                    .filter(|m| !m.trim().is_empty())
                    .unwrap_or_else(|| GENERIC_ERROR_MESSAGE.to_string()),
                errors,
            },
            _ => ApiError::Server { status },
        }
    }

    /// Text to show the user, or `None` when nothing should be shown.
    ///
    /// Unauthorized requests redirect rather than notify, and cancelled
    /// requests are never reported.
    pub fn user_message(&self) -> Option<String> {
        match self {
            ApiError::Unauthorized | ApiError::Cancelled => None,
            ApiError::Rejected { message, .. } => Some(message.clone()),
            ApiError::Compute(err) => Some(err.to_string()),
            ApiError::Server { .. } | ApiError::Network(_) | ApiError::Decode(_) => {
                Some(GENERIC_ERROR_MESSAGE.to_string())
            }
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized)
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, ApiError::Cancelled)
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiError::Decode(err.to_string())
        } else {
            ApiError::Network(err.to_string())
        }
    }
}
