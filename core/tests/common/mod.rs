// tests/common/mod.rs
#![allow(dead_code)] // Not every test binary uses every helper

use async_trait::async_trait;
use datadag::{Collaborators, DatasetDescriptor, Downloader, FailureContext, FailureNotifier, SqlExecutor};
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::{
  atomic::{AtomicUsize, Ordering},
  Arc,
};
use tempfile::TempDir;
use tracing::Level;

// --- Helper for Tracing Setup ---
use once_cell::sync::Lazy;
static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer()
    .try_init()
    .ok();
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}

// --- Recording collaborators ---

/// Records every URL it is asked to fetch. Fails the first `fail_first` calls.
#[derive(Default)]
pub struct FakeDownloader {
  pub calls: Mutex<Vec<(String, PathBuf)>>,
  pub fail_first: AtomicUsize,
}

impl FakeDownloader {
  pub fn failing(times: usize) -> Self {
    Self {
      calls: Mutex::new(Vec::new()),
      fail_first: AtomicUsize::new(times),
    }
  }

  pub fn urls(&self) -> Vec<String> {
    self.calls.lock().iter().map(|(url, _)| url.clone()).collect()
  }
}

#[async_trait]
impl Downloader for FakeDownloader {
  async fn retrieve(&self, url: &str, destination_dir: &Path) -> anyhow::Result<()> {
    self.calls.lock().push((url.to_string(), destination_dir.to_path_buf()));
    let remaining = self.fail_first.load(Ordering::SeqCst);
    if remaining > 0 {
      self.fail_first.store(remaining - 1, Ordering::SeqCst);
      anyhow::bail!("connection reset while fetching {}", url);
    }
    Ok(())
  }
}

/// Records every SQL text it executes. Scripts whose text contains one of
/// `failing_markers` fail every time.
#[derive(Default)]
pub struct RecordingSqlExecutor {
  pub executed: Mutex<Vec<(String, String)>>,
  pub failing_markers: Vec<String>,
}

impl RecordingSqlExecutor {
  pub fn failing_on(marker: &str) -> Self {
    Self {
      executed: Mutex::new(Vec::new()),
      failing_markers: vec![marker.to_string()],
    }
  }

  pub fn texts(&self) -> Vec<String> {
    self.executed.lock().iter().map(|(_, sql)| sql.clone()).collect()
  }

  pub fn count_matching(&self, marker: &str) -> usize {
    self.executed.lock().iter().filter(|(_, sql)| sql.contains(marker)).count()
  }
}

#[async_trait]
impl SqlExecutor for RecordingSqlExecutor {
  async fn execute(&self, conn_id: &str, sql_text: &str) -> anyhow::Result<()> {
    self.executed.lock().push((conn_id.to_string(), sql_text.to_string()));
    if let Some(marker) = self.failing_markers.iter().find(|m| sql_text.contains(m.as_str())) {
      anyhow::bail!("relation does not exist ({})", marker);
    }
    Ok(())
  }
}

/// Counts notifications and keeps the contexts it received.
#[derive(Default)]
pub struct CountingNotifier {
  pub received: Mutex<Vec<FailureContext>>,
}

impl CountingNotifier {
  pub fn count(&self) -> usize {
    self.received.lock().len()
  }
}

#[async_trait]
impl FailureNotifier for CountingNotifier {
  async fn notify(&self, _pipeline_id: &str, context: &FailureContext) -> anyhow::Result<()> {
    self.received.lock().push(context.clone());
    Ok(())
  }
}

/// Always fails, after counting the call.
#[derive(Default)]
pub struct FailingNotifier {
  pub calls: AtomicUsize,
}

#[async_trait]
impl FailureNotifier for FailingNotifier {
  async fn notify(&self, _pipeline_id: &str, _context: &FailureContext) -> anyhow::Result<()> {
    self.calls.fetch_add(1, Ordering::SeqCst);
    anyhow::bail!("webhook returned 500")
  }
}

pub fn collaborators(downloader: &Arc<FakeDownloader>, sql: &Arc<RecordingSqlExecutor>) -> Collaborators {
  Collaborators::new(downloader.clone(), sql.clone())
}

// --- Script directories ---

/// A temporary scripts root holding one directory per dataset.
pub struct ScriptsRoot {
  pub dir: TempDir,
}

impl ScriptsRoot {
  pub fn new() -> Self {
    Self {
      dir: tempfile::tempdir().expect("create temp scripts root"),
    }
  }

  pub fn path(&self) -> &Path {
    self.dir.path()
  }

  /// Creates `<root>/<dataset_id>/` with the given `(file name, contents)` pairs.
  pub fn dataset(&self, dataset_id: &str, files: &[(&str, &str)]) -> PathBuf {
    let dir = self.dir.path().join(dataset_id);
    std::fs::create_dir_all(&dir).expect("create dataset script dir");
    for (name, contents) in files {
      std::fs::write(dir.join(name), contents).expect("write script");
    }
    dir
  }
}

/// Files whose contents name the file, so executed SQL reveals the order.
pub fn scripts_named<'a>(names: &[&'a str]) -> Vec<(&'a str, String)> {
  names.iter().map(|n| (*n, format!("-- {}", n))).collect()
}

pub fn write_scripts(root: &ScriptsRoot, dataset_id: &str, names: &[&str]) -> PathBuf {
  let files = scripts_named(names);
  let borrowed: Vec<(&str, &str)> = files.iter().map(|(n, c)| (*n, c.as_str())).collect();
  root.dataset(dataset_id, &borrowed)
}

pub fn descriptor(id: &str) -> DatasetDescriptor {
  DatasetDescriptor::new(id, "0 4 * * *", format!("https://example.org/{}.zip", id))
}
