//! Pipeline configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Knobs for the recurring extraction run, deserialised from the `[pipeline]`
/// section of the config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
  /// Name stamped on every job row this pipeline creates.
  #[serde(default = "default_job_name")]
  pub job_name: String,

  /// Hours covered by each run's window, and the run cadence.
  #[serde(default = "default_frequency_hours")]
  pub frequency_hours: u32,

  /// Maximum records per insert transaction.
  #[serde(default = "default_batch_size")]
  pub batch_size: usize,

  /// Days of normalized call history to keep when purging.
  #[serde(default = "default_retention_days")]
  pub retention_days: u32,

  /// Center ids eligible for extraction. Empty admits every center.
  #[serde(default)]
  pub allowed_centers: Vec<String>,
}

fn default_job_name() -> String { "ivr_extraction".to_string() }

fn default_frequency_hours() -> u32 { 6 }

fn default_batch_size() -> usize { 1000 }

fn default_retention_days() -> u32 { 730 }

impl Default for PipelineConfig {
  fn default() -> Self {
    Self {
      job_name:        default_job_name(),
      frequency_hours: default_frequency_hours(),
      batch_size:      default_batch_size(),
      retention_days:  default_retention_days(),
      allowed_centers: Vec::new(),
    }
  }
}

impl PipelineConfig {
  /// The run cadence as a duration.
  pub fn frequency(&self) -> Duration {
    Duration::from_secs(u64::from(self.frequency_hours) * 3600)
  }
}
