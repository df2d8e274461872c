//! # Backend
//!
//! Generative backend access module.
//!
//! Responsibilities:
//! - Define the `GenerationBackend` request/response abstraction
//! - Provide the real HTTP client
//! - Provide a scriptable mock with failure injection and call recording
//!
//! ## Feature Flags
//!
//! - `gemini`: Enable the real HTTP client (requires reqwest)

pub mod client;
pub mod error;
pub mod mock_client;

#[cfg(feature = "gemini")]
pub mod gemini_client;

pub use client::GenerationBackend;
pub use contracts::{GenerateRequest, GenerateResponse};
pub use error::{BackendError, Result};
pub use mock_client::{MockBackend, MockConfig, MockReply, RecordedCall, MOCK_MODEL};

#[cfg(feature = "gemini")]
pub use gemini_client::GeminiBackend;
