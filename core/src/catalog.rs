// datadag/src/catalog.rs

//! Discovers and orders a dataset's SQL scripts by category prefix.

use crate::core::category::ScriptCategory;
use crate::core::step::ScriptStep;
use crate::error::{DagError, DagResult};
use std::path::Path;
use tracing::{event, instrument, Level};

/// Scripts of one dataset, grouped per category. Each group is sorted by name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategorizedScripts {
  pub load: Vec<ScriptStep>,
  pub staging: Vec<ScriptStep>,
  pub view: Vec<ScriptStep>,
  pub api: Vec<ScriptStep>,
  pub alter: Vec<ScriptStep>,
}

impl CategorizedScripts {
  pub fn get(&self, category: ScriptCategory) -> &[ScriptStep] {
    match category {
      ScriptCategory::Load => &self.load,
      ScriptCategory::Staging => &self.staging,
      ScriptCategory::View => &self.view,
      ScriptCategory::Api => &self.api,
      ScriptCategory::Alter => &self.alter,
    }
  }

  pub fn set(&mut self, category: ScriptCategory, steps: Vec<ScriptStep>) {
    match category {
      ScriptCategory::Load => self.load = steps,
      ScriptCategory::Staging => self.staging = steps,
      ScriptCategory::View => self.view = steps,
      ScriptCategory::Api => self.api = steps,
      ScriptCategory::Alter => self.alter = steps,
    }
  }

  /// All scripts in execution order: category precedence, then name.
  pub fn iter_ordered(&self) -> impl Iterator<Item = &ScriptStep> + '_ {
    ScriptCategory::ALL.into_iter().flat_map(move |c| self.get(c).iter())
  }

  pub fn len(&self) -> usize {
    ScriptCategory::ALL.into_iter().map(|c| self.get(c).len()).sum()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }
}

/// Names of the regular files in `directory` that start with `prefix`, sorted.
pub fn list_names(directory: &Path, prefix: &str) -> DagResult<Vec<String>> {
  if !directory.is_dir() {
    return Err(DagError::config(
      dataset_of(directory),
      format!("script directory '{}' does not exist", directory.display()),
    ));
  }
  let entries = std::fs::read_dir(directory).map_err(|source| DagError::IoError {
    path: directory.to_path_buf(),
    source,
  })?;

  let mut names = Vec::new();
  for entry in entries {
    let entry = entry.map_err(|source| DagError::IoError {
      path: directory.to_path_buf(),
      source,
    })?;
    let path = entry.path();
    if !path.is_file() {
      continue;
    }
    match entry.file_name().into_string() {
      Ok(name) if name.starts_with(prefix) => names.push(name),
      Ok(_) => {}
      Err(raw) => {
        event!(Level::WARN, file = ?raw, "Skipping script with a non UTF-8 name.");
      }
    }
  }
  names.sort();
  Ok(names)
}

/// Scripts in `directory` whose names start with `prefix`, sorted by name,
/// with their contents read in full.
#[instrument(name = "catalog::list", skip_all, fields(directory = %directory.display(), prefix = %prefix), err(Display))]
pub fn list(directory: &Path, prefix: &str) -> DagResult<Vec<ScriptStep>> {
  let category = ScriptCategory::ALL
    .into_iter()
    .find(|c| c.prefix() == prefix)
    .ok_or_else(|| DagError::config(dataset_of(directory), format!("unknown script category prefix '{}'", prefix)))?;
  list_category(directory, category)
}

/// Same as [`list`] for a known category.
pub fn list_category(directory: &Path, category: ScriptCategory) -> DagResult<Vec<ScriptStep>> {
  let names = list_names(directory, category.prefix())?;
  let mut steps = Vec::with_capacity(names.len());
  for name in names {
    let path = directory.join(&name);
    let sql_text = std::fs::read_to_string(&path).map_err(|source| DagError::IoError { path, source })?;
    steps.push(ScriptStep::new(name, category, sql_text));
  }
  event!(Level::DEBUG, %category, count = steps.len(), "Scripts listed.");
  Ok(steps)
}

/// Runs [`list_category`] once per category, in execution order.
pub fn discover(directory: &Path) -> DagResult<CategorizedScripts> {
  let mut scripts = CategorizedScripts::default();
  for category in ScriptCategory::ALL {
    scripts.set(category, list_category(directory, category)?);
  }
  Ok(scripts)
}

/// Orders an arbitrary list of file names into chain order: category
/// precedence first, then name. Names matching no category are dropped.
pub fn ordered_script_names<I, S>(file_names: I) -> Vec<String>
where
  I: IntoIterator<Item = S>,
  S: AsRef<str>,
{
  let mut keyed: Vec<(ScriptCategory, String)> = file_names
    .into_iter()
    .filter_map(|name| {
      let name = name.as_ref();
      ScriptCategory::of_file_name(name).map(|c| (c, name.to_string()))
    })
    .collect();
  keyed.sort();
  keyed.into_iter().map(|(_, name)| name).collect()
}

// The script directory is named after the dataset id.
fn dataset_of(directory: &Path) -> String {
  directory
    .file_name()
    .map(|n| n.to_string_lossy().into_owned())
    .unwrap_or_default()
}
