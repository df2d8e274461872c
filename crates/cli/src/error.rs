//! Error types for CLI operations.

use std::path::Path;

use thiserror::Error;

/// CLI-specific error types
#[derive(Error, Debug)]
pub enum CliError {
    /// Photo file not found
    #[error("Photo not found: {path}")]
    PhotoNotFound { path: String },

    /// Photo file is empty
    #[error("Photo is empty: {path}")]
    EmptyPhoto { path: String },

    /// Extension does not map to a supported image media type
    #[error("Unsupported image type for {path} (expected jpeg, png, webp, heic or heif)")]
    UnsupportedImage { path: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CliError {
    pub fn photo_not_found(path: &Path) -> Self {
        Self::PhotoNotFound {
            path: path.display().to_string(),
        }
    }

    pub fn empty_photo(path: &Path) -> Self {
        Self::EmptyPhoto {
            path: path.display().to_string(),
        }
    }

    pub fn unsupported_image(path: &Path) -> Self {
        Self::UnsupportedImage {
            path: path.display().to_string(),
        }
    }
}

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;
