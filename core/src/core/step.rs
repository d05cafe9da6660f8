// datadag/src/core/step.rs

//! Task nodes of a pipeline chain.

use super::category::ScriptCategory;
use crate::template::UrlTemplate;
use std::path::PathBuf;
use std::sync::Arc;

/// One SQL script discovered in a dataset's script directory.
///
/// `sql_text` is read once when the pipeline is built; later edits to the
/// file do not affect the pipeline until it is rebuilt.
#[derive(Clone, PartialEq, Eq)]
pub struct ScriptStep {
  pub name: String,
  pub category: ScriptCategory,
  pub sql_text: Arc<str>,
}

impl ScriptStep {
  pub fn new(name: impl Into<String>, category: ScriptCategory, sql_text: impl Into<Arc<str>>) -> Self {
    Self {
      name: name.into(),
      category,
      sql_text: sql_text.into(),
    }
  }
}

// SQL bodies can be large; keep Debug output to a summary.
impl std::fmt::Debug for ScriptStep {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("ScriptStep")
      .field("name", &self.name)
      .field("category", &self.category)
      .field("sql_len", &self.sql_text.len())
      .finish()
  }
}

/// The first node of every chain: fetch the dataset's source file.
#[derive(Debug, Clone)]
pub struct DownloadTask {
  pub dataset_id: String,
  pub task_id: String,
  pub url: UrlTemplate,
  /// Deterministic local folder the artifact lands in, `<data_root>/<dataset id>`.
  pub data_folder: PathBuf,
}

impl DownloadTask {
  pub fn for_dataset(dataset_id: &str, url: UrlTemplate, data_root: &std::path::Path) -> Self {
    Self {
      dataset_id: dataset_id.to_string(),
      task_id: format!("get_{}", dataset_id),
      url,
      data_folder: data_root.join(dataset_id),
    }
  }
}

#[derive(Debug, Clone)]
pub enum StepKind {
  Download(DownloadTask),
  Sql(ScriptStep),
}

/// A node in the pipeline chain.
#[derive(Debug, Clone)]
pub struct StepDef {
  pub task_id: String,
  pub kind: StepKind,
}

impl StepDef {
  pub fn download(task: DownloadTask) -> Self {
    Self {
      task_id: task.task_id.clone(),
      kind: StepKind::Download(task),
    }
  }

  /// SQL nodes are identified by their script file name.
  pub fn sql(script: ScriptStep) -> Self {
    Self {
      task_id: script.name.clone(),
      kind: StepKind::Sql(script),
    }
  }

  pub fn is_download(&self) -> bool {
    matches!(self.kind, StepKind::Download(_))
  }

  pub fn category(&self) -> Option<ScriptCategory> {
    match &self.kind {
      StepKind::Sql(script) => Some(script.category),
      StepKind::Download(_) => None,
    }
  }
}
