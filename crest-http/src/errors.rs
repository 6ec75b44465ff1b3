//! HTTP error types

use crate::types::HttpMethodError;
use std::time::Duration;

/// Error type for transport operations
#[derive(Debug, thiserror::Error)]
pub enum HttpError {
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Request timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    #[error("Invalid HTTP method: {0}")]
    InvalidMethod(#[from] HttpMethodError),

    #[error("Invalid header name: {0}")]
    InvalidHeaderName(String),

    #[error("Invalid value for header {0}")]
    InvalidHeaderValue(String),
}
