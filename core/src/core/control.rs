// datadag/src/core/control.rs

//! Per-step states and the outcome of a pipeline run.

use chrono::{DateTime, Utc};

/// State of a single task within one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepStatus {
  /// Not started yet.
  Pending,
  /// An attempt is in flight (or waiting for its retry delay).
  Running,
  Success,
  /// Retries exhausted; this step halted the chain.
  Failed,
  /// Never ran because an earlier step failed.
  UpstreamFailed,
}

/// Overall state of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
  Running,
  Success,
  Failed,
}

/// Returned by a run that completed every step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
  pub pipeline_id: String,
  pub logical_date: DateTime<Utc>,
  pub steps_completed: usize,
  /// Attempts across all steps, retries included.
  pub total_attempts: u32,
}
