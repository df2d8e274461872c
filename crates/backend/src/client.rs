//! Generation backend abstraction
//!
//! Defines the trait for talking to the generative model, supporting the real
//! HTTP implementation and mock testing.

use std::future::Future;

use contracts::{GenerateRequest, GenerateResponse};

use crate::error::Result;

/// Generation backend trait
///
/// One method per request/response exchange. Implementations must not retry
/// on their own; pacing and failure handling belong to the orchestrator.
pub trait GenerationBackend: Send + Sync {
    /// Model identifier requests should carry
    fn model(&self) -> &str;

    /// Issue one multimodal generation request
    ///
    /// # Arguments
    /// * `request` - Two inline parent images followed by one text instruction
    ///
    /// # Returns
    /// The raw response; extracting text or images is left to the caller
    fn generate_content(
        &self,
        request: &GenerateRequest,
    ) -> impl Future<Output = Result<GenerateResponse>> + Send;
}

impl<T: GenerationBackend> GenerationBackend for &T {
    fn model(&self) -> &str {
        (**self).model()
    }

    fn generate_content(
        &self,
        request: &GenerateRequest,
    ) -> impl Future<Output = Result<GenerateResponse>> + Send {
        (**self).generate_content(request)
    }
}
