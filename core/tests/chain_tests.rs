// tests/chain_tests.rs
mod common;

use common::*;
use datadag::{catalog, chain, DagError, DownloadTask, ScriptCategory, ScriptStep, UrlTemplate};
use std::path::Path;

fn download(id: &str) -> DownloadTask {
  let url = UrlTemplate::parse(&format!("https://example.org/{}.zip", id)).unwrap();
  DownloadTask::for_dataset(id, url, Path::new("/tmp/data"))
}

#[test]
fn test_chain_orders_download_then_categories() {
  setup_tracing();
  let root = ScriptsRoot::new();
  let dir = write_scripts(
    &root,
    "orange_book",
    &[
      "view-products.sql",
      "load-products.sql",
      "api-products.sql",
      "staging-products.sql",
      "load-exclusivity.sql",
    ],
  );
  let scripts = catalog::discover(&dir).unwrap();

  let graph = chain::build(download("orange_book"), &scripts).unwrap();
  assert_eq!(
    graph.task_ids(),
    vec![
      "get_orange_book",
      "load-exclusivity.sql",
      "load-products.sql",
      "staging-products.sql",
      "view-products.sql",
      "api-products.sql",
    ]
  );
  assert!(graph.steps()[0].is_download());
  assert_eq!(graph.steps()[3].category(), Some(ScriptCategory::Staging));
}

#[test]
fn test_chain_edges_form_a_single_line() {
  setup_tracing();
  let root = ScriptsRoot::new();
  let dir = write_scripts(&root, "rxterms", &["load-rxterms.sql", "api-rxterms.sql"]);
  let scripts = catalog::discover(&dir).unwrap();

  let graph = chain::build(download("rxterms"), &scripts).unwrap();
  assert_eq!(
    graph.edges(),
    vec![("get_rxterms", "load-rxterms.sql"), ("load-rxterms.sql", "api-rxterms.sql")]
  );
  assert_eq!(graph.upstream_of("get_rxterms"), None);
  assert_eq!(graph.upstream_of("api-rxterms.sql"), Some("load-rxterms.sql"));
  assert_eq!(graph.upstream_of("missing.sql"), None);
}

#[test]
fn test_chain_without_scripts_is_download_only() {
  setup_tracing();
  let graph = chain::build(download("purple_book"), &Default::default()).unwrap();
  assert_eq!(graph.len(), 1);
  assert!(graph.edges().is_empty());
  assert!(graph.get("get_purple_book").is_some());
}

#[test]
fn test_chain_rejects_duplicate_task_ids() {
  setup_tracing();
  let mut scripts = datadag::CategorizedScripts::default();
  scripts.set(
    ScriptCategory::Load,
    vec![
      ScriptStep::new("load-a.sql", ScriptCategory::Load, "select 1"),
      ScriptStep::new("load-a.sql", ScriptCategory::Load, "select 2"),
    ],
  );

  match chain::build(download("dup"), &scripts) {
    Err(DagError::ConfigurationError { dataset_id, message }) => {
      assert_eq!(dataset_id, "dup");
      assert!(message.contains("load-a.sql"), "unexpected message: {}", message);
    }
    other => panic!("Expected ConfigurationError, got {:?}", other),
  }
}

#[test]
fn test_numbered_load_scripts_then_view() {
  setup_tracing();
  let root = ScriptsRoot::new();
  let dir = write_scripts(&root, "example", &["view-summary.sql", "load-02-clean.sql", "load-01-raw.sql"]);
  let scripts = catalog::discover(&dir).unwrap();

  let graph = chain::build(download("example"), &scripts).unwrap();
  assert_eq!(
    graph.task_ids(),
    vec!["get_example", "load-01-raw.sql", "load-02-clean.sql", "view-summary.sql"]
  );
  assert_eq!(graph.edges().len(), 3);
}
