//! # Orchestrator
//!
//! Runs the analysis step and the eight image tasks against a
//! [`GenerationBackend`](backend::GenerationBackend), strictly one call at a
//! time, and streams each result to a [`ProgressObserver`] as it lands.
//!
//! ## Example
//!
//! ```ignore
//! use backend::MockBackend;
//! use orchestrator::{Orchestrator, Pacer};
//!
//! let orchestrator = Orchestrator::new(MockBackend::new(), Pacer::default());
//! let aggregate = orchestrator
//!     .run(&parent1, &parent2, &mut |update| println!("{}", update.field_name()))
//!     .await;
//! ```

pub mod error;
pub mod observer;
pub mod pacer;
pub mod pipeline;
pub mod prompts;
pub mod stats;

pub use error::StepError;
pub use observer::{progress_channel, ChannelObserver, ProgressObserver};
pub use pacer::Pacer;
pub use pipeline::Orchestrator;
pub use prompts::{image_prompt, ParentParts, ANALYSIS_PROMPT};
pub use stats::RunStats;
