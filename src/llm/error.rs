//! Completion error types

use thiserror::Error;

/// Completion error with classification
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct LlmError {
    pub kind: LlmErrorKind,
    pub message: String,
}

impl LlmError {
    pub fn new(kind: LlmErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(LlmErrorKind::Timeout, message)
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(LlmErrorKind::Network, message)
    }

    pub fn rate_limit(message: impl Into<String>) -> Self {
        Self::new(LlmErrorKind::RateLimit, message)
    }

    pub fn server_error(message: impl Into<String>) -> Self {
        Self::new(LlmErrorKind::ServerError, message)
    }

    pub fn auth(message: impl Into<String>) -> Self {
        Self::new(LlmErrorKind::Auth, message)
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(LlmErrorKind::InvalidRequest, message)
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::new(LlmErrorKind::MalformedResponse, message)
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(LlmErrorKind::Unknown, message)
    }

    pub fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }
}

/// Error classification.
///
/// Nothing retries today; the split keeps the call contract stable if a
/// retry policy is added on top of [`super::LlmService`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmErrorKind {
    /// Request exceeded the configured deadline - retryable
    Timeout,
    /// Connection or transport failure - retryable
    Network,
    /// Rate limited (429) - retryable with backoff
    RateLimit,
    /// Server error (5xx) - retryable
    ServerError,
    /// Authentication failed or no key configured (401, 403) - not retryable
    Auth,
    /// Bad request (400) - not retryable
    InvalidRequest,
    /// Body could not be understood, or carried no completion - not retryable
    MalformedResponse,
    /// Unknown error
    Unknown,
}

impl LlmErrorKind {
    pub fn is_retryable(self) -> bool {
        matches!(
            self,
            Self::Timeout | Self::Network | Self::RateLimit | Self::ServerError
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Timeout => "timeout",
            Self::Network => "network",
            Self::RateLimit => "rate_limit",
            Self::ServerError => "server_error",
            Self::Auth => "auth",
            Self::InvalidRequest => "invalid_request",
            Self::MalformedResponse => "malformed_response",
            Self::Unknown => "unknown",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_failures_are_retryable() {
        assert!(LlmError::timeout("deadline").is_retryable());
        assert!(LlmError::network("refused").is_retryable());
        assert!(LlmError::rate_limit("slow down").is_retryable());
        assert!(LlmError::server_error("502").is_retryable());
    }

    #[test]
    fn test_permanent_failures_are_not_retryable() {
        assert!(!LlmError::malformed("no choices").is_retryable());
        assert!(!LlmError::auth("bad key").is_retryable());
        assert!(!LlmError::invalid_request("bad model").is_retryable());
        assert!(!LlmError::unknown("?").is_retryable());
    }

    #[test]
    fn test_display_is_message_only() {
        let err = LlmError::timeout("Request timed out after 25s");
        assert_eq!(err.to_string(), "Request timed out after 25s");
        assert_eq!(err.kind.as_str(), "timeout");
    }
}
