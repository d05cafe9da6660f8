// datadag/src/chain.rs

//! Turns a download task plus categorized scripts into a linear task chain.

use crate::catalog::CategorizedScripts;
use crate::core::step::{DownloadTask, StepDef};
use crate::error::{DagError, DagResult};
use std::collections::HashSet;
use tracing::{event, Level};

/// A simple chain: every step depends on the one before it.
#[derive(Debug, Clone)]
pub struct PipelineGraph {
  steps: Vec<StepDef>,
}

impl PipelineGraph {
  pub fn steps(&self) -> &[StepDef] {
    &self.steps
  }

  pub fn task_ids(&self) -> Vec<&str> {
    self.steps.iter().map(|s| s.task_id.as_str()).collect()
  }

  pub fn len(&self) -> usize {
    self.steps.len()
  }

  /// Never true for a built graph; the download node is always present.
  pub fn is_empty(&self) -> bool {
    self.steps.is_empty()
  }

  /// Precedence edges as `(upstream, downstream)` task id pairs.
  pub fn edges(&self) -> Vec<(&str, &str)> {
    self
      .steps
      .windows(2)
      .map(|pair| (pair[0].task_id.as_str(), pair[1].task_id.as_str()))
      .collect()
  }

  /// The single predecessor of `task_id`; `None` for the first step or unknown ids.
  pub fn upstream_of(&self, task_id: &str) -> Option<&str> {
    let idx = self.steps.iter().position(|s| s.task_id == task_id)?;
    idx.checked_sub(1).map(|prev| self.steps[prev].task_id.as_str())
  }

  pub fn get(&self, task_id: &str) -> Option<&StepDef> {
    self.steps.iter().find(|s| s.task_id == task_id)
  }
}

/// Builds `[download] + load + staging + view + api + alter`.
///
/// Fails with a configuration error if a task id would appear twice.
pub fn build(download: DownloadTask, scripts: &CategorizedScripts) -> DagResult<PipelineGraph> {
  let dataset_id = download.dataset_id.clone();
  let mut steps = Vec::with_capacity(scripts.len() + 1);
  steps.push(StepDef::download(download));
  steps.extend(scripts.iter_ordered().cloned().map(StepDef::sql));

  let mut seen = HashSet::with_capacity(steps.len());
  for step in &steps {
    if !seen.insert(step.task_id.as_str()) {
      return Err(DagError::config(
        dataset_id,
        format!("task '{}' appears more than once in the chain", step.task_id),
      ));
    }
  }

  event!(Level::DEBUG, steps = steps.len(), "Chain built.");
  Ok(PipelineGraph { steps })
}
