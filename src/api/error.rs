//! API Error Types
//!
//! Failures of the REST backend as the client sees them. Every variant maps
//! to the same user-facing outcome (empty state plus an inline message), but
//! they are kept apart for logs and retries.

use thiserror::Error;

/// REST client errors
#[derive(Error, Debug)]
pub enum ApiError {
    /// The backend could not be reached
    #[error("Backend unavailable")]
    Unavailable,

    /// The request timed out
    #[error("Request timed out")]
    Timeout,

    /// HTTP client error
    #[cfg(feature = "native")]
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Browser fetch error
    #[error("Network error: {0}")]
    Network(String),

    /// Non-success HTTP status
    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    /// The envelope reported `success: false`
    #[error("{0}")]
    Rejected(String),

    /// The envelope reported success without data
    #[error("Response contained no data")]
    MissingData,

    /// The body did not have the expected shape
    #[error("Unexpected response: {0}")]
    Decode(String),
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Decode(err.to_string())
    }
}

impl ApiError {
    /// Message suitable for an inline error banner
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Unavailable | ApiError::Timeout => {
                "Could not reach the server. Please try again.".to_string()
            }
            ApiError::Rejected(message) if !message.is_empty() => message.clone(),
            ApiError::Status { message, .. } if !message.is_empty() => message.clone(),
            _ => "Something went wrong. Please try again.".to_string(),
        }
    }
}

/// Result type alias for REST calls
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_messages() {
        assert_eq!(
            ApiError::Rejected("City not found".to_string()).user_message(),
            "City not found"
        );
        assert_eq!(
            ApiError::Timeout.user_message(),
            "Could not reach the server. Please try again."
        );
        assert_eq!(
            ApiError::MissingData.user_message(),
            "Something went wrong. Please try again."
        );
    }

    #[test]
    fn test_status_display() {
        let err = ApiError::Status {
            status: 404,
            message: "missing".to_string(),
        };
        assert_eq!(err.to_string(), "HTTP 404: missing");
    }
}
