//! Command implementations.

mod run;
mod tasks;
mod validate;

pub use run::run_pipeline;
pub use tasks::run_tasks;
pub use validate::run_validate;
