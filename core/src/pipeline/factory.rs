// datadag/src/pipeline/factory.rs

//! Builds a `Pipeline` from a dataset descriptor and its script directory.

use crate::catalog;
use crate::chain;
use crate::core::step::DownloadTask;
use crate::descriptor::DatasetDescriptor;
use crate::error::{DagError, DagResult};
use crate::pipeline::definition::{Pipeline, DEFAULT_CONN_ID};
use crate::policy::PipelineDefaults;
use crate::schedule::CronSchedule;
use crate::template::UrlTemplate;
use std::path::{Path, PathBuf};
use tracing::{event, instrument, Level};

/// Knows where scripts are read from and where downloads land.
#[derive(Debug, Clone)]
pub struct PipelineFactory {
  scripts_root: PathBuf,
  data_root: PathBuf,
  conn_id: String,
}

impl PipelineFactory {
  pub fn new(scripts_root: impl Into<PathBuf>, data_root: impl Into<PathBuf>) -> Self {
    Self {
      scripts_root: scripts_root.into(),
      data_root: data_root.into(),
      conn_id: DEFAULT_CONN_ID.to_string(),
    }
  }

  pub fn with_conn_id(mut self, conn_id: impl Into<String>) -> Self {
    self.conn_id = conn_id.into();
    self
  }

  pub fn scripts_root(&self) -> &Path {
    &self.scripts_root
  }

  pub fn data_root(&self) -> &Path {
    &self.data_root
  }

  /// `<scripts_root>/<dataset id>`
  pub fn script_dir(&self, dataset_id: &str) -> PathBuf {
    self.scripts_root.join(dataset_id)
  }

  /// Reads the dataset's scripts and assembles its pipeline.
  ///
  /// Only the filesystem is touched; nothing is downloaded or executed here.
  #[instrument(
    name = "PipelineFactory::create_pipeline",
    skip_all,
    fields(dataset_id = %descriptor.id),
    err(Display)
  )]
  pub fn create_pipeline(&self, descriptor: &DatasetDescriptor, defaults: &PipelineDefaults) -> DagResult<Pipeline> {
    let id = descriptor.id.as_str();
    descriptor.validate_id()?;

    let schedule = CronSchedule::parse(&descriptor.schedule).map_err(|e| for_dataset(e, id))?;
    let url = UrlTemplate::parse(&descriptor.source_url).map_err(|e| for_dataset(e, id))?;

    let script_dir = self.script_dir(id);
    let scripts = catalog::discover(&script_dir).map_err(|e| for_dataset(e, id))?;
    if scripts.is_empty() {
      event!(Level::WARN, dir = %script_dir.display(), "No SQL scripts found; pipeline will only download.");
    }

    let download = DownloadTask::for_dataset(id, url, &self.data_root);
    let graph = chain::build(download, &scripts)?;
    let policy = defaults.merge(&descriptor.overrides());

    event!(
      Level::INFO,
      steps = graph.len(),
      schedule = %schedule,
      retries = policy.retry.max_retries,
      "Pipeline built."
    );

    Ok(
      Pipeline::new(id, graph, schedule, policy)
        .with_description(descriptor.description())
        .with_conn_id(self.conn_id.clone()),
    )
  }
}

// Errors raised below the factory don't know which dataset they belong to.
fn for_dataset(err: DagError, dataset_id: &str) -> DagError {
  match err {
    DagError::ConfigurationError { dataset_id: d, message } if d != dataset_id => {
      DagError::config(dataset_id, message)
    }
    DagError::TemplateError { template, message } => {
      DagError::config(dataset_id, format!("invalid source URL template '{}': {}", template, message))
    }
    other => other,
  }
}
