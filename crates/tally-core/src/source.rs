//! The `CallSource` trait: read access to the legacy IVR store.
//!
//! Implementations read exclusively from the dedicated read-only connection.
//! The trait exposes no write operations; the routing policy in
//! [`crate::routing`] makes any attempt against the legacy namespace a hard
//! error.

use std::future::Future;

use crate::{
  call::{RawCall, RawClient},
  window::TimeWindow,
};

/// Abstraction over the legacy call-record source.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes.
pub trait CallSource: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// All raw calls whose timestamp falls in `window` (`[start, end)`),
  /// ordered by timestamp.
  fn fetch_calls(
    &self,
    window: TimeWindow,
  ) -> impl Future<Output = Result<Vec<RawCall>, Self::Error>> + Send + '_;

  /// The client with `client_id`, or a not-found error.
  fn fetch_client<'a>(
    &'a self,
    client_id: &'a str,
  ) -> impl Future<Output = Result<RawClient, Self::Error>> + Send + 'a;
}
