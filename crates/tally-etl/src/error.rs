//! Error type for `tally-etl`.

use thiserror::Error;

/// Boxed error from a source or store implementation.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum Error {
  /// The legacy source failed while fetching a window.
  #[error("legacy source: {0}")]
  Extract(BoxError),

  /// The analytics store failed while loading or purging call records.
  #[error("analytics store: {0}")]
  Store(BoxError),

  /// The analytics store failed while updating the run ledger.
  #[error("job ledger: {0}")]
  Ledger(BoxError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
