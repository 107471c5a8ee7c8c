//! SQLite backend for the Tally analytics pipeline.
//!
//! Two physical databases live behind [`DbRouter`]: the primary analytics
//! store (read-write, schema owned here) and the legacy IVR store (read-only,
//! schema owned externally). Wraps [`tokio_rusqlite`] so all database access
//! runs on dedicated threads without blocking the async runtime.

mod analytics;
mod encode;
mod ivr;
mod router;
mod schema;

pub mod error;

pub use analytics::AnalyticsDb;
pub use error::{Error, Result};
pub use ivr::IvrDb;
pub use router::DbRouter;
pub use schema::{MIGRATIONS, Migration};
