// datadag/src/registry.rs

//! Defines the `Registry`, an id-keyed collection of the pipelines known to
//! the process, and the bulk registration used at startup.

use crate::core::collaborators::Collaborators;
use crate::core::context_data::RunContext;
use crate::core::control::RunSummary;
use crate::descriptor::DatasetDescriptor;
use crate::error::{DagError, DagResult};
use crate::pipeline::definition::Pipeline;
use crate::pipeline::factory::PipelineFactory;
use crate::policy::PipelineDefaults;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{event, instrument, Level};

/// What `register_all` does when one dataset fails to build.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BuildFailurePolicy {
  /// Log the failure, skip the dataset, keep going.
  #[default]
  Isolate,
  /// Stop at the first failure and register nothing.
  AbortAll,
}

/// Outcome of a bulk registration.
#[derive(Debug, Default)]
pub struct RegistrationReport {
  /// Ids registered, in descriptor order.
  pub registered: Vec<String>,
  /// Datasets skipped under `BuildFailurePolicy::Isolate`, with the reason.
  pub failures: Vec<(String, DagError)>,
}

impl RegistrationReport {
  pub fn is_clean(&self) -> bool {
    self.failures.is_empty()
  }
}

/// The process-wide pipeline registry. Ids are unique; a pipeline is never
/// replaced once registered.
pub struct Registry {
  pipelines: Mutex<HashMap<String, Arc<Pipeline>>>,
}

impl Registry {
  pub fn new() -> Self {
    Self {
      pipelines: Mutex::new(HashMap::new()),
    }
  }

  /// Adds `pipeline` under its id. Fails without touching the existing entry
  /// if the id is already taken.
  pub fn register(&self, pipeline: Pipeline) -> DagResult<Arc<Pipeline>> {
    insert(&mut self.pipelines.lock(), pipeline)
  }

  pub fn get(&self, id: &str) -> Option<Arc<Pipeline>> {
    self.pipelines.lock().get(id).cloned()
  }

  pub fn contains(&self, id: &str) -> bool {
    self.pipelines.lock().contains_key(id)
  }

  /// Registered ids, sorted.
  pub fn ids(&self) -> Vec<String> {
    let mut ids: Vec<String> = self.pipelines.lock().keys().cloned().collect();
    ids.sort();
    ids
  }

  pub fn len(&self) -> usize {
    self.pipelines.lock().len()
  }

  pub fn is_empty(&self) -> bool {
    self.pipelines.lock().is_empty()
  }

  /// Every registered pipeline, ordered by id.
  pub fn pipelines(&self) -> Vec<Arc<Pipeline>> {
    let mut all: Vec<Arc<Pipeline>> = self.pipelines.lock().values().cloned().collect();
    all.sort_by(|a, b| a.id().cmp(b.id()));
    all
  }

  /// Builds and registers one pipeline per descriptor.
  ///
  /// A repeated id, or one already present in the registry, counts as a
  /// `ConfigurationError` for that descriptor; the first occurrence wins.
  /// Under [`BuildFailurePolicy::AbortAll`] such ids are rejected before
  /// anything is built, and either every pipeline is registered or none is.
  /// The registry stays locked for the whole call.
  #[instrument(
    name = "Registry::register_all",
    skip_all,
    fields(num_descriptors = descriptors.len(), policy = ?on_failure),
    err(Display)
  )]
  pub fn register_all(
    &self,
    descriptors: &[DatasetDescriptor],
    factory: &PipelineFactory,
    defaults: &PipelineDefaults,
    on_failure: BuildFailurePolicy,
  ) -> DagResult<RegistrationReport> {
    let mut pipelines = self.pipelines.lock();

    if on_failure == BuildFailurePolicy::AbortAll {
      let mut seen = HashSet::with_capacity(descriptors.len());
      for descriptor in descriptors {
        if let Some(conflict) = id_conflict(&pipelines, &mut seen, &descriptor.id) {
          return Err(conflict);
        }
      }
    }

    let mut report = RegistrationReport::default();
    let mut built = Vec::with_capacity(descriptors.len());
    let mut seen = HashSet::with_capacity(descriptors.len());
    for descriptor in descriptors {
      let outcome = match id_conflict(&pipelines, &mut seen, &descriptor.id) {
        Some(conflict) => Err(conflict),
        None => factory.create_pipeline(descriptor, defaults),
      };
      match outcome {
        Ok(pipeline) => built.push(pipeline),
        Err(err) => match on_failure {
          BuildFailurePolicy::Isolate => {
            event!(Level::ERROR, dataset_id = %descriptor.id, error = %err, "Skipping dataset that failed to build.");
            report.failures.push((descriptor.id.clone(), err));
          }
          BuildFailurePolicy::AbortAll => return Err(err),
        },
      }
    }

    for pipeline in built {
      let registered = insert(&mut pipelines, pipeline)?;
      report.registered.push(registered.id().to_string());
    }

    event!(
      Level::INFO,
      registered = report.registered.len(),
      failed = report.failures.len(),
      "Registration finished."
    );
    Ok(report)
  }

  /// Runs the pipeline registered under `id`.
  pub async fn run(&self, id: &str, ctx: RunContext, collaborators: &Collaborators) -> DagResult<RunSummary> {
    let pipeline = self.get(id).ok_or_else(|| {
      event!(Level::ERROR, pipeline_id = id, "No pipeline registered under this id.");
      DagError::config(id, "no pipeline registered under this id")
    })?;
    pipeline.run(ctx, collaborators).await
  }
}

fn insert(pipelines: &mut HashMap<String, Arc<Pipeline>>, pipeline: Pipeline) -> DagResult<Arc<Pipeline>> {
  if pipelines.contains_key(pipeline.id()) {
    event!(Level::ERROR, pipeline_id = %pipeline.id(), "Pipeline id already registered.");
    return Err(DagError::config(pipeline.id(), "a pipeline with this id is already registered"));
  }
  event!(Level::DEBUG, pipeline_id = %pipeline.id(), steps = pipeline.graph().len(), "Registering pipeline.");
  let pipeline = Arc::new(pipeline);
  pipelines.insert(pipeline.id().to_string(), pipeline.clone());
  Ok(pipeline)
}

/// Why `id` cannot be registered, if it cannot. Records `id` in `seen`.
fn id_conflict<'a>(
  pipelines: &HashMap<String, Arc<Pipeline>>,
  seen: &mut HashSet<&'a str>,
  id: &'a str,
) -> Option<DagError> {
  if !seen.insert(id) {
    return Some(DagError::config(id, "dataset id declared more than once"));
  }
  if pipelines.contains_key(id) {
    return Some(DagError::config(id, "a pipeline with this id is already registered"));
  }
  None
}

impl Default for Registry {
  fn default() -> Self {
    Self::new()
  }
}

impl std::fmt::Debug for Registry {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Registry").field("ids", &self.ids()).finish()
  }
}
