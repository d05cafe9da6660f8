// datadag/src/pipeline/definition.rs

//! The `Pipeline` struct: one dataset's chain together with its schedule and policy.

use crate::chain::PipelineGraph;
use crate::core::step::{DownloadTask, StepKind};
use crate::policy::PipelinePolicy;
use crate::schedule::CronSchedule;

/// Connection id SQL steps run against unless configured otherwise.
pub const DEFAULT_CONN_ID: &str = "postgres_default";

/// A complete, schedulable pipeline definition.
///
/// Built once at startup and never mutated while registered; a change to the
/// dataset's scripts means building and registering a new `Pipeline`.
#[derive(Debug, Clone)]
pub struct Pipeline {
  pub(crate) id: String,
  pub(crate) description: String,
  pub(crate) graph: PipelineGraph,
  pub(crate) schedule: CronSchedule,
  pub(crate) policy: PipelinePolicy,
  pub(crate) conn_id: String,
}

impl Pipeline {
  pub fn new(id: impl Into<String>, graph: PipelineGraph, schedule: CronSchedule, policy: PipelinePolicy) -> Self {
    let id = id.into();
    Self {
      description: format!("Processes {} source", id),
      id,
      graph,
      schedule,
      policy,
      conn_id: DEFAULT_CONN_ID.to_string(),
    }
  }

  pub fn with_description(mut self, description: impl Into<String>) -> Self {
    self.description = description.into();
    self
  }

  pub fn with_conn_id(mut self, conn_id: impl Into<String>) -> Self {
    self.conn_id = conn_id.into();
    self
  }

  pub fn id(&self) -> &str {
    &self.id
  }

  pub fn description(&self) -> &str {
    &self.description
  }

  pub fn graph(&self) -> &PipelineGraph {
    &self.graph
  }

  pub fn schedule(&self) -> &CronSchedule {
    &self.schedule
  }

  pub fn policy(&self) -> &PipelinePolicy {
    &self.policy
  }

  pub fn conn_id(&self) -> &str {
    &self.conn_id
  }

  pub fn download_task(&self) -> Option<&DownloadTask> {
    self.graph.steps().iter().find_map(|s| match &s.kind {
      StepKind::Download(task) => Some(task),
      StepKind::Sql(_) => None,
    })
  }
}
