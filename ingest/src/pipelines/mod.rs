// datadag/ingest/src/pipelines/mod.rs

//! Builds and registers every dataset pipeline at startup.

use crate::config::AppConfig;
use crate::datasets;
use crate::errors::Result as AppResult;
use datadag::{BuildFailurePolicy, FailureNotifier, PipelineDefaults, PipelineFactory, RegistrationReport, Registry};
use std::sync::Arc;

/// Registers one pipeline per configured dataset with `registry`.
///
/// Called once at startup, before any schedule starts ticking.
pub async fn register_all_pipelines(
  registry: &Registry,
  config: &AppConfig,
  notifier: Arc<dyn FailureNotifier>,
) -> AppResult<RegistrationReport> {
  let descriptors = match &config.datasets_file {
    Some(path) => {
      tracing::info!(file = %path.display(), "Loading dataset descriptors.");
      datasets::load(path).await?
    }
    None => datasets::builtin(),
  };

  let factory =
    PipelineFactory::new(&config.scripts_root, &config.data_root).with_conn_id(config.db_conn_id.clone());
  let defaults = PipelineDefaults::new(config.default_owner.clone())
    .with_contact_emails([config.default_email.clone()])
    .with_failure_notifier(notifier);
  let policy = if config.abort_on_build_failure {
    BuildFailurePolicy::AbortAll
  } else {
    BuildFailurePolicy::Isolate
  };

  let report = registry.register_all(&descriptors, &factory, &defaults, policy)?;
  for (dataset_id, error) in &report.failures {
    tracing::warn!(%dataset_id, %error, "Dataset will not be scheduled.");
  }
  Ok(report)
}
