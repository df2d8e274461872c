//! Backend request/response contract
//!
//! Shapes follow the generative backend's JSON (camelCase). A request is two
//! inline image parts followed by one text part; a response carries candidates
//! whose parts are text or inline images.

use serde::{Deserialize, Serialize};

use crate::InlineImage;

/// One content part: text or inline image
///
/// Modelled as a struct of optionals so unknown part kinds in a response
/// deserialize as an empty part instead of failing the whole response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inline_data: Option<InlineImage>,
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            inline_data: None,
        }
    }

    pub fn inline(image: InlineImage) -> Self {
        Self {
            text: None,
            inline_data: Some(image),
        }
    }
}

/// Ordered list of parts
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,

    #[serde(default)]
    pub parts: Vec<Part>,
}

impl Content {
    pub fn from_parts(parts: Vec<Part>) -> Self {
        Self { role: None, parts }
    }
}

/// One backend call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateRequest {
    /// Model identifier, e.g. "gemini-2.5-flash-image"
    pub model: String,
    pub contents: Content,
}

impl GenerateRequest {
    /// Text instruction of the request (the last text part)
    pub fn prompt(&self) -> Option<&str> {
        self.contents
            .parts
            .iter()
            .rev()
            .find_map(|part| part.text.as_deref())
    }

    /// Number of inline image parts
    pub fn image_count(&self) -> usize {
        self.contents
            .parts
            .iter()
            .filter(|part| part.inline_data.is_some())
            .count()
    }
}

/// One candidate completion
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    /// Absent when the candidate was blocked
    #[serde(default)]
    pub content: Option<Content>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
}

/// Backend response
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

impl GenerateResponse {
    /// Build a single-candidate response
    pub fn from_parts(parts: Vec<Part>) -> Self {
        Self {
            candidates: vec![Candidate {
                content: Some(Content::from_parts(parts)),
                finish_reason: Some("STOP".into()),
            }],
        }
    }

    /// Parts of the first candidate; later candidates are never read
    pub fn first_parts(&self) -> &[Part] {
        self.candidates
            .first()
            .and_then(|candidate| candidate.content.as_ref())
            .map(|content| content.parts.as_slice())
            .unwrap_or_default()
    }

    /// Concatenated text of the first candidate, `None` if it has no text
    pub fn text(&self) -> Option<String> {
        let text: String = self
            .first_parts()
            .iter()
            .filter_map(|part| part.text.as_deref())
            .collect();
        if text.trim().is_empty() {
            None
        } else {
            Some(text)
        }
    }

    /// First inline image part of the first candidate
    pub fn first_inline_image(&self) -> Option<&InlineImage> {
        self.first_parts()
            .iter()
            .find_map(|part| part.inline_data.as_ref())
    }
}
