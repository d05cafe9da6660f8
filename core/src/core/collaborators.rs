// datadag/src/core/collaborators.rs

//! Traits for the external systems a pipeline run talks to.
//!
//! Nothing in this crate performs network or database I/O itself; the
//! binary supplies implementations and the tests supply recording doubles.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::path::Path;
use std::sync::Arc;

/// Fetches a remote file into a local directory.
#[async_trait]
pub trait Downloader: Send + Sync {
  /// Retrieves `url` into `destination_dir`, creating the directory if needed.
  async fn retrieve(&self, url: &str, destination_dir: &Path) -> anyhow::Result<()>;
}

/// Executes SQL text against a configured database connection.
#[async_trait]
pub trait SqlExecutor: Send + Sync {
  async fn execute(&self, conn_id: &str, sql_text: &str) -> anyhow::Result<()>;
}

/// What a failure notifier is told about a failed run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureContext {
  pub pipeline_id: String,
  pub task_id: String,
  pub logical_date: DateTime<Utc>,
  pub attempts: u32,
  pub error: String,
  pub owner: String,
  pub contact_emails: Vec<String>,
}

/// Receives one call per failed run. Best effort: an error returned here is
/// logged by the pipeline and never replaces the step failure.
#[async_trait]
pub trait FailureNotifier: Send + Sync {
  async fn notify(&self, pipeline_id: &str, context: &FailureContext) -> anyhow::Result<()>;
}

/// The collaborators a run needs, shared by every pipeline in a process.
#[derive(Clone)]
pub struct Collaborators {
  pub downloader: Arc<dyn Downloader>,
  pub sql: Arc<dyn SqlExecutor>,
}

impl Collaborators {
  pub fn new(downloader: Arc<dyn Downloader>, sql: Arc<dyn SqlExecutor>) -> Self {
    Self { downloader, sql }
  }
}
