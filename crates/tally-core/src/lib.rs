//! Core types and trait definitions for the Tally call-analytics pipeline.
//!
//! This crate is deliberately free of database and CLI dependencies.
//! All other crates depend on it; it depends on nothing proprietary.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod call;
pub mod error;
pub mod job;
pub mod routing;
pub mod source;
pub mod store;
pub mod transform;
pub mod window;

pub use error::{Error, Result};
