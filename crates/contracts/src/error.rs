//! Layered error definitions
//!
//! Categorized by source: config / payload / aggregate

use thiserror::Error;

use crate::ResultSlot;

/// Unified error type
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Payload Errors =====
    /// Encoded image payload could not be interpreted
    #[error("invalid image payload: {message}")]
    InvalidPayload { message: String },

    // ===== Aggregate Errors =====
    /// A result field was written twice in one run
    #[error("result field '{field}' is already set")]
    FieldAlreadySet { field: &'static str },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ContractError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create invalid payload error
    pub fn invalid_payload(message: impl Into<String>) -> Self {
        Self::InvalidPayload {
            message: message.into(),
        }
    }

    /// Create duplicate write error for an image slot
    pub fn slot_already_set(slot: ResultSlot) -> Self {
        Self::FieldAlreadySet {
            field: slot.field_name(),
        }
    }
}
