//! The extract stage.

use tally_core::{call::RawCall, source::CallSource, window::TimeWindow};

/// Fetches raw calls for a window from the legacy source.
///
/// The stage carries no state beyond the source itself; filtering,
/// validation and defaulting all happen downstream.
pub struct Extractor<S> {
  source: S,
}

impl<S: CallSource> Extractor<S> {
  pub fn new(source: S) -> Self { Self { source } }

  /// All raw calls whose timestamp falls in `window`.
  pub async fn extract(
    &self,
    window: TimeWindow,
  ) -> Result<Vec<RawCall>, S::Error> {
    self.source.fetch_calls(window).await
  }
}
