// datadag/src/core/context_data.rs

//! Shared, lock-protected record of one pipeline run.

use super::control::{RunStatus, StepStatus};
use chrono::{DateTime, Utc};
use parking_lot::{RwLock, RwLockReadGuard};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepRecord {
  pub task_id: String,
  pub status: StepStatus,
  pub attempts: u32,
  pub last_error: Option<String>,
}

#[derive(Debug, Clone)]
pub struct RunState {
  pub pipeline_id: String,
  pub logical_date: DateTime<Utc>,
  /// Source URL after template rendering; set right before the download step.
  pub resolved_url: Option<String>,
  pub status: RunStatus,
  pub steps: Vec<StepRecord>,
  /// Task that halted the chain, if any.
  pub failed_task: Option<String>,
}

impl RunState {
  pub fn step(&self, task_id: &str) -> Option<&StepRecord> {
    self.steps.iter().find(|s| s.task_id == task_id)
  }

  /// Number of steps currently in `status`.
  pub fn count(&self, status: StepStatus) -> usize {
    self.steps.iter().filter(|s| s.status == status).count()
  }

  fn step_mut(&mut self, task_id: &str) -> &mut StepRecord {
    if let Some(idx) = self.steps.iter().position(|s| s.task_id == task_id) {
      return &mut self.steps[idx];
    }
    self.steps.push(StepRecord {
      task_id: task_id.to_string(),
      status: StepStatus::Pending,
      attempts: 0,
      last_error: None,
    });
    let last = self.steps.len() - 1;
    &mut self.steps[last]
  }
}

/// Handle to the state of one run, cheap to clone and shared between the
/// executing pipeline and whoever triggered it.
///
/// Lock guards obtained from this struct are blocking and must not be held
/// across `.await` points.
#[derive(Debug, Clone)]
pub struct RunContext(Arc<RwLock<RunState>>);

impl RunContext {
  pub fn new(pipeline_id: impl Into<String>, logical_date: DateTime<Utc>) -> Self {
    RunContext(Arc::new(RwLock::new(RunState {
      pipeline_id: pipeline_id.into(),
      logical_date,
      resolved_url: None,
      status: RunStatus::Running,
      steps: Vec::new(),
      failed_task: None,
    })))
  }

  pub fn read(&self) -> RwLockReadGuard<'_, RunState> {
    self.0.read()
  }

  pub fn logical_date(&self) -> DateTime<Utc> {
    self.0.read().logical_date
  }

  pub fn pipeline_id(&self) -> String {
    self.0.read().pipeline_id.clone()
  }

  /// Copy of the current state, for reporting after the run.
  pub fn snapshot(&self) -> RunState {
    self.0.read().clone()
  }

  pub(crate) fn init_steps<'a>(&self, task_ids: impl IntoIterator<Item = &'a str>) {
    let mut state = self.0.write();
    for task_id in task_ids {
      state.step_mut(task_id);
    }
  }

  pub(crate) fn set_resolved_url(&self, url: &str) {
    self.0.write().resolved_url = Some(url.to_string());
  }

  pub(crate) fn begin_attempt(&self, task_id: &str) -> u32 {
    let mut state = self.0.write();
    let record = state.step_mut(task_id);
    record.status = StepStatus::Running;
    record.attempts += 1;
    record.attempts
  }

  pub(crate) fn record_attempt_error(&self, task_id: &str, error: &str) {
    self.0.write().step_mut(task_id).last_error = Some(error.to_string());
  }

  pub(crate) fn mark_success(&self, task_id: &str) {
    let mut state = self.0.write();
    let record = state.step_mut(task_id);
    record.status = StepStatus::Success;
    record.last_error = None;
  }

  /// Marks `task_id` failed and every still-pending step after it upstream-failed.
  pub(crate) fn mark_failed(&self, task_id: &str, error: &str) {
    let mut state = self.0.write();
    {
      let record = state.step_mut(task_id);
      record.status = StepStatus::Failed;
      record.last_error = Some(error.to_string());
    }
    for record in state.steps.iter_mut() {
      if record.status == StepStatus::Pending {
        record.status = StepStatus::UpstreamFailed;
      }
    }
    state.failed_task = Some(task_id.to_string());
    state.status = RunStatus::Failed;
  }

  pub(crate) fn mark_run_success(&self) {
    self.0.write().status = RunStatus::Success;
  }
}
