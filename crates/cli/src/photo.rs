//! Parent photo loading from disk.

use std::path::Path;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use contracts::{InlineImage, ParentPhoto, ParentRole};
use tracing::debug;

use crate::error::{CliError, Result};

/// Media type for a photo, from its file extension
pub fn mime_type_for(path: &Path) -> Option<&'static str> {
    let extension = path.extension()?.to_str()?.to_ascii_lowercase();
    match extension.as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "webp" => Some("image/webp"),
        "heic" => Some("image/heic"),
        "heif" => Some("image/heif"),
        _ => None,
    }
}

/// Read a photo and encode it for the backend
pub fn load_photo(path: &Path, role: ParentRole) -> Result<ParentPhoto> {
    if !path.exists() {
        return Err(CliError::photo_not_found(path));
    }
    let mime_type = mime_type_for(path).ok_or_else(|| CliError::unsupported_image(path))?;

    let bytes = std::fs::read(path)?;
    if bytes.is_empty() {
        return Err(CliError::empty_photo(path));
    }

    debug!(
        path = %path.display(),
        role = ?role,
        mime_type,
        bytes = bytes.len(),
        "Photo loaded"
    );

    Ok(ParentPhoto::new(
        role,
        InlineImage::new(mime_type, BASE64.encode(&bytes)),
    ))
}
