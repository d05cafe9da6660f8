// tests/registry_tests.rs
mod common;

use common::*;
use chrono::{TimeZone, Utc};
use datadag::{
  BuildFailurePolicy, DagError, DatasetDescriptor, PipelineDefaults, PipelineFactory, Registry, RunContext,
};
use std::sync::Arc;

fn factory_with(root: &ScriptsRoot) -> PipelineFactory {
  PipelineFactory::new(root.path(), root.path().join("data"))
}

#[test]
fn test_register_all_registers_every_dataset() {
  setup_tracing();
  let root = ScriptsRoot::new();
  write_scripts(&root, "fda_excluded", &["load-fda_excluded.sql"]);
  write_scripts(&root, "orange_book", &["load-orange_book.sql", "view-orange_book.sql"]);
  let registry = Registry::new();

  let report = registry
    .register_all(
      &[descriptor("orange_book"), descriptor("fda_excluded")],
      &factory_with(&root),
      &PipelineDefaults::default(),
      BuildFailurePolicy::default(),
    )
    .unwrap();

  assert!(report.is_clean());
  assert_eq!(report.registered, vec!["orange_book", "fda_excluded"]);
  assert_eq!(registry.ids(), vec!["fda_excluded", "orange_book"]);
  assert_eq!(registry.get("orange_book").unwrap().graph().len(), 3);
}

#[test]
fn test_duplicate_descriptor_id_isolated_to_later_occurrence() {
  setup_tracing();
  let root = ScriptsRoot::new();
  write_scripts(&root, "fda_excluded", &["load-fda_excluded.sql"]);
  write_scripts(&root, "rxterms", &["load-rxterms.sql"]);
  let registry = Registry::new();

  let report = registry
    .register_all(
      &[descriptor("fda_excluded"), descriptor("rxterms"), descriptor("rxterms")],
      &factory_with(&root),
      &PipelineDefaults::default(),
      BuildFailurePolicy::Isolate,
    )
    .unwrap();

  assert_eq!(report.registered, vec!["fda_excluded", "rxterms"]);
  assert_eq!(report.failures.len(), 1);
  match &report.failures[0] {
    (id, DagError::ConfigurationError { dataset_id, message }) => {
      assert_eq!(id, "rxterms");
      assert_eq!(dataset_id, "rxterms");
      assert!(message.contains("more than once"), "unexpected message: {}", message);
    }
    other => panic!("Expected ConfigurationError, got {:?}", other),
  }
  assert_eq!(registry.ids(), vec!["fda_excluded", "rxterms"]);
}

#[test]
fn test_duplicate_descriptor_ids_abort_all_registers_nothing() {
  setup_tracing();
  let root = ScriptsRoot::new();
  write_scripts(&root, "fda_excluded", &["load-fda_excluded.sql"]);
  write_scripts(&root, "rxterms", &["load-rxterms.sql"]);
  let registry = Registry::new();

  let result = registry.register_all(
    &[descriptor("fda_excluded"), descriptor("rxterms"), descriptor("rxterms")],
    &factory_with(&root),
    &PipelineDefaults::default(),
    BuildFailurePolicy::AbortAll,
  );

  match result {
    Err(DagError::ConfigurationError { dataset_id, message }) => {
      assert_eq!(dataset_id, "rxterms");
      assert!(message.contains("more than once"), "unexpected message: {}", message);
    }
    other => panic!("Expected ConfigurationError, got {:?}", other),
  }
  assert!(registry.is_empty());
}

#[test]
fn test_register_all_isolates_already_registered_id() {
  setup_tracing();
  let root = ScriptsRoot::new();
  write_scripts(&root, "fda_excluded", &["load-fda_excluded.sql"]);
  write_scripts(&root, "orange_book", &["load-orange_book.sql"]);
  let factory = factory_with(&root);
  let registry = Registry::new();
  registry
    .register(factory.create_pipeline(&descriptor("orange_book"), &PipelineDefaults::default()).unwrap())
    .unwrap();

  let report = registry
    .register_all(
      &[descriptor("orange_book"), descriptor("fda_excluded")],
      &factory,
      &PipelineDefaults::default(),
      BuildFailurePolicy::Isolate,
    )
    .unwrap();

  assert_eq!(report.registered, vec!["fda_excluded"]);
  assert_eq!(report.failures.len(), 1);
  assert_eq!(report.failures[0].0, "orange_book");
  assert!(matches!(report.failures[0].1, DagError::ConfigurationError { .. }));
  assert_eq!(registry.len(), 2);
}

#[test]
fn test_unreadable_script_keeps_dataset_out_of_registry() {
  setup_tracing();
  let root = ScriptsRoot::new();
  write_scripts(&root, "fda_excluded", &["load-fda_excluded.sql"]);
  let dir = write_scripts(&root, "fda_unfinished", &["load-fda_unfinished.sql"]);
  std::fs::write(dir.join("load-bad.sql"), [0xff, 0xfe, 0x00, 0xc3]).unwrap();
  let registry = Registry::new();

  let report = registry
    .register_all(
      &[descriptor("fda_unfinished"), descriptor("fda_excluded")],
      &factory_with(&root),
      &PipelineDefaults::default(),
      BuildFailurePolicy::Isolate,
    )
    .unwrap();

  assert_eq!(report.registered, vec!["fda_excluded"]);
  assert_eq!(report.failures.len(), 1);
  assert_eq!(report.failures[0].0, "fda_unfinished");
  match &report.failures[0].1 {
    DagError::IoError { source, .. } => assert_eq!(source.kind(), std::io::ErrorKind::InvalidData),
    other => panic!("Expected IoError, got {:?}", other),
  }
  assert!(!registry.contains("fda_unfinished"));
}

#[test]
fn test_register_rejects_existing_id_without_overwriting() {
  setup_tracing();
  let root = ScriptsRoot::new();
  write_scripts(&root, "purple_book", &["load-purple_book.sql"]);
  let factory = factory_with(&root);
  let registry = Registry::new();

  let first = factory
    .create_pipeline(&descriptor("purple_book"), &PipelineDefaults::default())
    .unwrap();
  registry.register(first).unwrap();

  let second = factory
    .create_pipeline(
      &DatasetDescriptor::new("purple_book", "0 0 1 * *", "https://example.org/other.csv"),
      &PipelineDefaults::default(),
    )
    .unwrap();
  assert!(matches!(registry.register(second), Err(DagError::ConfigurationError { .. })));

  assert_eq!(registry.len(), 1);
  assert_eq!(registry.get("purple_book").unwrap().schedule().expression(), "0 4 * * *");
}

#[test]
fn test_isolate_skips_broken_dataset() {
  setup_tracing();
  let root = ScriptsRoot::new();
  write_scripts(&root, "fda_excluded", &["load-fda_excluded.sql"]);
  // No directory for dailymed_rxnorm.
  let registry = Registry::new();

  let report = registry
    .register_all(
      &[descriptor("dailymed_rxnorm"), descriptor("fda_excluded")],
      &factory_with(&root),
      &PipelineDefaults::default(),
      BuildFailurePolicy::Isolate,
    )
    .unwrap();

  assert_eq!(report.registered, vec!["fda_excluded"]);
  assert_eq!(report.failures.len(), 1);
  assert_eq!(report.failures[0].0, "dailymed_rxnorm");
  assert!(report.failures[0].1.is_build_error());
  assert!(registry.contains("fda_excluded"));
  assert!(!registry.contains("dailymed_rxnorm"));
}

#[test]
fn test_abort_all_registers_nothing_on_failure() {
  setup_tracing();
  let root = ScriptsRoot::new();
  write_scripts(&root, "fda_excluded", &["load-fda_excluded.sql"]);
  let registry = Registry::new();

  let result = registry.register_all(
    &[descriptor("fda_excluded"), descriptor("dailymed_rxnorm")],
    &factory_with(&root),
    &PipelineDefaults::default(),
    BuildFailurePolicy::AbortAll,
  );

  assert!(matches!(result, Err(DagError::ConfigurationError { .. })));
  assert!(registry.is_empty());
}

#[test]
fn test_dataset_with_zero_scripts_registers_download_only() {
  setup_tracing();
  let root = ScriptsRoot::new();
  write_scripts(&root, "rxterms", &["README.md"]);
  let registry = Registry::new();

  registry
    .register_all(
      &[descriptor("rxterms")],
      &factory_with(&root),
      &PipelineDefaults::default(),
      BuildFailurePolicy::Isolate,
    )
    .unwrap();

  let pipeline = registry.get("rxterms").unwrap();
  assert_eq!(pipeline.graph().task_ids(), vec!["get_rxterms"]);
}

#[tokio::test]
async fn test_registry_runs_pipeline_by_id() {
  setup_tracing();
  let root = ScriptsRoot::new();
  write_scripts(&root, "fda_excluded", &["load-fda_excluded.sql", "view-fda_excluded.sql"]);
  let registry = Registry::new();
  registry
    .register_all(
      &[descriptor("fda_excluded")],
      &factory_with(&root),
      &PipelineDefaults::default(),
      BuildFailurePolicy::Isolate,
    )
    .unwrap();

  let downloader = Arc::new(FakeDownloader::default());
  let sql = Arc::new(RecordingSqlExecutor::default());
  let tick = Utc.with_ymd_and_hms(2024, 3, 1, 4, 0, 0).unwrap();

  let summary = registry
    .run("fda_excluded", RunContext::new("fda_excluded", tick), &collaborators(&downloader, &sql))
    .await
    .unwrap();

  assert_eq!(summary.steps_completed, 3);
  assert_eq!(downloader.urls(), vec!["https://example.org/fda_excluded.zip"]);
  assert_eq!(sql.texts(), vec!["-- load-fda_excluded.sql", "-- view-fda_excluded.sql"]);
}

#[tokio::test]
async fn test_registry_run_unknown_id() {
  setup_tracing();
  let registry = Registry::new();
  let downloader = Arc::new(FakeDownloader::default());
  let sql = Arc::new(RecordingSqlExecutor::default());

  let result = registry
    .run("unknown", RunContext::new("unknown", Utc::now()), &collaborators(&downloader, &sql))
    .await;

  match result {
    Err(DagError::ConfigurationError { dataset_id, message }) => {
      assert_eq!(dataset_id, "unknown");
      assert!(message.contains("no pipeline registered"));
    }
    other => panic!("Expected ConfigurationError, got {:?}", other),
  }
}
