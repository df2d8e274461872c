//! # Contracts
//!
//! Frozen interface contracts, defining inter-module data structures.
//! All business crates depend on this crate, reverse dependencies are prohibited.
//!
//! ## Data Flow
//! - Two `ParentPhoto`s go in
//! - One analysis step plus the eight `TASK_TABLE` steps run against the backend
//! - `ProgressUpdate`s stream out, the final `ResultAggregate` is returned

mod aggregate;
mod error;
mod photo;
mod settings;
mod task;
mod wire;

pub use aggregate::*;
pub use error::*;
pub use photo::*;
pub use settings::*;
pub use task::*;
pub use wire::*;
