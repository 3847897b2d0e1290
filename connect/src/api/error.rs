use thiserror::Error;

use super::common::ApiErrorDetails;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("API returned error (HTTP {status}): {message}")]
    Api {
        status: u16,
        message: String,
        #[source]
        details: Option<Box<ApiErrorDetails>>,
    },

    #[error("Failed to parse response: {0}")]
    Parse(String),

    #[error("Authentication failed (HTTP {0})")]
    AuthError(u16),

    #[error("Too many requests, rate limited")]
    RateLimited,

    #[error("Service unavailable (HTTP {0})")]
    ServiceUnavailable(u16),

    #[error("Request cancelled: {0}")]
    Cancelled(String),

    #[error("Pagination stalled: service repeated continuation token {0:?}")]
    StalledPagination(String),
}

impl ApiError {
    /// True for a 404 or a `ResourceNotFoundException` error code
    pub fn is_not_found(&self) -> bool {
        match self {
            ApiError::Api {
                status, details, ..
            } => {
                *status == 404
                    || details
                        .as_ref()
                        .and_then(|d| d.code.as_deref())
                        .is_some_and(|code| code == "ResourceNotFoundException")
            }
            _ => false,
        }
    }
}
