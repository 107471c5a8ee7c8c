//! Error types for `tally-core`.

use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// Raised by the routing policy before any I/O when a write is attempted
  /// against an entity living in the legacy IVR namespace. Never caught
  /// internally.
  #[error(
    "CRITICAL RESTRICTION VIOLATED: write attempted against read-only IVR \
     entity {0}"
  )]
  LegacyWriteDenied(&'static str),

  #[error("invalid time window: start {start} is after end {end}")]
  WindowInverted {
    start: DateTime<Utc>,
    end:   DateTime<Utc>,
  },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
