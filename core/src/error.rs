// datadag/src/error.rs
use anyhow::Error as AnyhowError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DagError {
  /// Bad or duplicate descriptor, missing script directory, invalid schedule or template.
  #[error("Configuration error for dataset '{dataset_id}': {message}")]
  ConfigurationError { dataset_id: String, message: String },

  #[error("Failed to read script '{}'. Source: {source}", path.display())]
  IoError {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("Download of '{url}' failed. Source: {source}")]
  DownloadError {
    url: String,
    #[source]
    source: AnyhowError,
  },

  #[error("SQL task '{task_id}' failed. Source: {source}")]
  ExecutionError {
    task_id: String,
    #[source]
    source: AnyhowError,
  },

  /// Never escalated past the pipeline run; logged and dropped.
  #[error("Failure notification for pipeline '{pipeline_id}' failed. Source: {source}")]
  NotificationError {
    pipeline_id: String,
    #[source]
    source: AnyhowError,
  },

  #[error("Template '{template}' could not be rendered: {message}")]
  TemplateError { template: String, message: String },
}

impl DagError {
  pub fn config(dataset_id: impl Into<String>, message: impl Into<String>) -> Self {
    DagError::ConfigurationError {
      dataset_id: dataset_id.into(),
      message: message.into(),
    }
  }

  /// True for errors raised while building or registering a pipeline.
  pub fn is_build_error(&self) -> bool {
    matches!(self, DagError::ConfigurationError { .. } | DagError::IoError { .. })
  }
}

pub type DagResult<T, E = DagError> = std::result::Result<T, E>;
