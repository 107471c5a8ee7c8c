//! The Tally extraction pipeline.
//!
//! Each run pulls raw calls out of the read-only legacy IVR store for a
//! bounded time window and loads the validated, normalized records into the
//! analytics store in idempotent batches. Every run is recorded in the job
//! ledger with per-stage counts. [`Scheduler`] repeats runs on a fixed
//! cadence.

pub mod config;
pub mod error;
pub mod extract;
pub mod pipeline;
pub mod schedule;
pub mod validate;

pub use config::PipelineConfig;
pub use error::{Error, Result};
pub use pipeline::Pipeline;
pub use schedule::Scheduler;

#[cfg(test)]
mod tests;
