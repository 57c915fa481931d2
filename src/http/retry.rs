//! Retry policy and error classification for registry requests.

use reqwest::StatusCode;
use thiserror::Error;

/// Maximum number of attempts for a single request.
pub const MAX_RETRIES: usize = 3;

/// Delay between attempts in milliseconds.
pub const RETRY_DELAY_MS: u64 = 1000;

/// HTTP failures that will not go away by asking again.
#[derive(Error, Debug)]
pub enum NonRetryableError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Rate limit exceeded: {0}. Try again later.")]
    RateLimitExceeded(String),

    #[error("Request error: {0}")]
    ClientError(String),
}

/// Classifies an error as retryable or non-retryable.
/// Returns Ok(()) if the error is retryable.
pub fn classify_error(error: &reqwest::Error) -> Result<(), NonRetryableError> {
    let Some(status) = error.status() else {
        // Connection errors, timeouts, etc.
        return Ok(());
    };

    let url = error
        .url()
        .map(|u| u.to_string())
        .unwrap_or_else(|| "<unknown url>".to_string());

    match status {
        StatusCode::NOT_FOUND => Err(NonRetryableError::NotFound(url)),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            Err(NonRetryableError::AccessDenied(url))
        }
        StatusCode::TOO_MANY_REQUESTS => Err(NonRetryableError::RateLimitExceeded(url)),
        s if s.is_client_error() => Err(NonRetryableError::ClientError(format!(
            "HTTP {} for {}",
            s.as_u16(),
            url
        ))),
        // 5xx
        _ => Ok(()),
    }
}

/// Converts an `error_for_status()` failure into an `anyhow::Error`, tagging
/// it as [`NonRetryableError`] when retrying is pointless.
pub fn check_retryable(error: reqwest::Error) -> anyhow::Error {
    match classify_error(&error) {
        Ok(()) => anyhow::Error::from(error),
        Err(non_retryable) => anyhow::Error::from(non_retryable),
    }
}
