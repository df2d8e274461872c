//! Backend error types

use thiserror::Error;

/// Generation backend error
#[derive(Debug, Error)]
pub enum BackendError {
    /// Credential environment variable not set
    #[error("backend credential not found in environment variable '{var}'")]
    MissingCredential { var: String },

    /// Request could not be built or sent
    #[error("backend transport error: {message}")]
    Transport { message: String },

    /// Backend answered with a non-success status
    #[error("backend returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// Response body could not be decoded
    #[error("failed to decode backend response: {message}")]
    Decode { message: String },

    /// Injected failure from the mock backend
    #[error("mock failure on call {call}: {message}")]
    Mock { call: usize, message: String },
}

impl BackendError {
    /// Create transport error
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Create decode error
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// True for HTTP 429 rejections from the backend rate limiter
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::Status { status: 429, .. })
    }
}

/// Result alias
pub type Result<T> = std::result::Result<T, BackendError>;
