//! Error type for `tally-store-sqlite`.

use tally_core::routing::{DatabaseAlias, Namespace};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] tally_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("column decode error: {0}")]
  Decode(String),

  #[error("job not found: {0}")]
  JobNotFound(uuid::Uuid),

  #[error("client not found: {0}")]
  ClientNotFound(String),

  /// The routing policy refused to run a migration on this connection.
  #[error("migration for namespace {namespace:?} refused on {target:?}")]
  MigrationRefused {
    target:    DatabaseAlias,
    namespace: Namespace,
  },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
