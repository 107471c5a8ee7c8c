//! Repeats pipeline runs on a fixed cadence.
//!
//! One task, one ticker. A run executes inside the tick arm, so a new tick
//! cannot start while a run is in flight; ticks that would have fired in the
//! meantime are skipped rather than queued.

use std::time::Duration;

use tally_core::{source::CallSource, store::AnalyticsStore};
use tokio::{
  sync::watch,
  task::JoinHandle,
  time::{self, MissedTickBehavior},
};

use crate::pipeline::Pipeline;

/// Handle to a running schedule.
///
/// Dropping the handle also signals the loop to exit, but without waiting
/// for a run in flight; call [`Scheduler::stop`] for an orderly shutdown.
pub struct Scheduler {
  stop:   watch::Sender<bool>,
  handle: JoinHandle<()>,
}

impl Scheduler {
  /// Spawn the run loop. The first run starts immediately; later runs fire
  /// every `period`. A failed run is logged and the cadence continues.
  pub fn start<S, A>(pipeline: Pipeline<S, A>, period: Duration) -> Self
  where
    S: CallSource + 'static,
    A: AnalyticsStore + 'static,
  {
    let (stop, mut stopped) = watch::channel(false);

    let handle = tokio::spawn(async move {
      tracing::info!(period_secs = period.as_secs(), "scheduler started");

      let mut ticker = time::interval(period);
      ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

      loop {
        tokio::select! {
          _ = stopped.changed() => break,
          _ = ticker.tick() => {
            if let Err(error) = pipeline.run_once().await {
              tracing::error!(error = %error, "scheduled run failed");
            }
          }
        }
      }
    });

    Self { stop, handle }
  }

  /// Signal the loop to exit and wait for it. A run in flight completes
  /// first.
  pub async fn stop(self) {
    let _ = self.stop.send(true);
    let _ = self.handle.await;
    tracing::info!("scheduler stopped");
  }
}
