//! Error types for batch generation.

use std::path::PathBuf;
use std::time::Duration;

/// Longest error body kept from an API response.
const MAX_ERROR_MESSAGE_LEN: usize = 500;

/// Errors that can occur while generating or placing images.
#[derive(Debug, thiserror::Error)]
pub enum GenBatchError {
    /// API key missing or rejected.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Sanitized response body.
        message: String,
    },

    /// Rate limit exceeded.
    #[error("rate limited, retry after {retry_after:?}")]
    RateLimited {
        /// Server-suggested delay, if any.
        retry_after: Option<Duration>,
    },

    /// Account has no usable billing.
    #[error("billing error: {0}")]
    Billing(String),

    /// Content was blocked by safety filters.
    #[error("content blocked: {0}")]
    ContentBlocked(String),

    /// Invalid request parameters or work items.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The API answered, but not with an image.
    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),

    /// Network or HTTP error.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Failed to decode base64 data.
    #[error("failed to decode: {0}")]
    Decode(String),

    /// I/O error (e.g., writing a staged file).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The batch output directory could not be created.
    #[error("failed to create output directory {}: {source}", .path.display())]
    OutputDir {
        /// Directory that was being created.
        path: PathBuf,
        /// Underlying I/O failure.
        source: std::io::Error,
    },

    /// Bad configuration value.
    #[error("configuration error: {0}")]
    Config(String),
}

impl GenBatchError {
    /// Returns true if the API gave a definite answer that no image will be
    /// produced for this prompt, as opposed to the call itself failing.
    pub fn is_refusal(&self) -> bool {
        matches!(self, Self::ContentBlocked(_) | Self::UnexpectedResponse(_))
    }
}

/// Result type alias for batch generation operations.
pub type Result<T> = std::result::Result<T, GenBatchError>;

/// Redacts key material and truncates an API error body for display.
pub(crate) fn sanitize_error_message(text: &str) -> String {
    let mut out = String::with_capacity(text.len().min(MAX_ERROR_MESSAGE_LEN));
    let mut rest = text.trim();

    while let Some(pos) = rest.find("key=") {
        let (head, tail) = rest.split_at(pos + "key=".len());
        out.push_str(head);
        out.push_str("[REDACTED]");
        let end = tail
            .find(|c: char| c == '&' || c == '"' || c == '\'' || c.is_whitespace())
            .unwrap_or(tail.len());
        rest = &tail[end..];
    }
    out.push_str(rest);

    if out.chars().count() > MAX_ERROR_MESSAGE_LEN {
        let cut: String = out.chars().take(MAX_ERROR_MESSAGE_LEN).collect();
        return format!("{cut}...");
    }
    out
}

/// Reads a `Retry-After` header given in seconds.
pub(crate) fn parse_retry_after(headers: &reqwest::header::HeaderMap) -> Option<u64> {
    headers
        .get(reqwest::header::RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::{HeaderMap, HeaderValue, RETRY_AFTER};

    #[test]
    fn test_is_refusal() {
        assert!(GenBatchError::ContentBlocked("nsfw".into()).is_refusal());
        assert!(GenBatchError::UnexpectedResponse("no image".into()).is_refusal());

        assert!(!GenBatchError::Auth("bad key".into()).is_refusal());
        assert!(!GenBatchError::RateLimited { retry_after: None }.is_refusal());
        assert!(!GenBatchError::Decode("bad base64".into()).is_refusal());
    }

    #[test]
    fn test_error_display() {
        let err = GenBatchError::Api {
            status: 404,
            message: "Not found".into(),
        };
        assert_eq!(err.to_string(), "API error: 404 - Not found");

        let err = GenBatchError::ContentBlocked("Safety filter triggered".into());
        assert_eq!(err.to_string(), "content blocked: Safety filter triggered");

        let err = GenBatchError::OutputDir {
            path: PathBuf::from("/nope/images"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert_eq!(
            err.to_string(),
            "failed to create output directory /nope/images: denied"
        );
    }

    #[test]
    fn test_sanitize_redacts_key() {
        let msg = sanitize_error_message("bad url https://x.test/v1?key=AIzaSECRET&alt=json");
        assert!(!msg.contains("AIzaSECRET"));
        assert!(msg.contains("key=[REDACTED]&alt=json"));
    }

    #[test]
    fn test_sanitize_truncates() {
        let long = "x".repeat(2000);
        let msg = sanitize_error_message(&long);
        assert_eq!(msg.len(), MAX_ERROR_MESSAGE_LEN + 3);
        assert!(msg.ends_with("..."));
    }

    #[test]
    fn test_parse_retry_after() {
        let mut headers = HeaderMap::new();
        assert_eq!(parse_retry_after(&headers), None);

        headers.insert(RETRY_AFTER, HeaderValue::from_static("30"));
        assert_eq!(parse_retry_after(&headers), Some(30));

        headers.insert(
            RETRY_AFTER,
            HeaderValue::from_static("Wed, 21 Oct 2015 07:28:00 GMT"),
        );
        assert_eq!(parse_retry_after(&headers), None);
    }
}
