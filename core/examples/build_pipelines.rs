// datadag/examples/build_pipelines.rs

//! Builds two pipelines from a throwaway script tree and runs one of them
//! against logging collaborators.

use async_trait::async_trait;
use chrono::Utc;
use datadag::{
  BuildFailurePolicy, Collaborators, DatasetDescriptor, Downloader, PipelineDefaults, PipelineFactory, Registry,
  RunContext, SqlExecutor,
};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

struct LogDownloader;

#[async_trait]
impl Downloader for LogDownloader {
  async fn retrieve(&self, url: &str, destination_dir: &Path) -> anyhow::Result<()> {
    info!(%url, dir = %destination_dir.display(), "download");
    Ok(())
  }
}

struct LogSql;

#[async_trait]
impl SqlExecutor for LogSql {
  async fn execute(&self, conn_id: &str, sql_text: &str) -> anyhow::Result<()> {
    info!(conn_id, sql_text, "execute");
    Ok(())
  }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  tracing_subscriber::fmt().with_max_level(tracing::Level::INFO).init();

  let root = tempfile::tempdir()?;
  for (dataset, scripts) in [
    ("orange_book", &["load-orange_book.sql", "view-orange_book.sql", "api-orange_book.sql"][..]),
    ("rxterms", &["load-rxterms.sql"][..]),
  ] {
    let dir = root.path().join(dataset);
    std::fs::create_dir_all(&dir)?;
    for script in scripts {
      std::fs::write(dir.join(script), format!("-- {}\nSELECT 1;", script))?;
    }
  }

  let descriptors = vec![
    DatasetDescriptor::new("orange_book", "15 0 24 1 *", "https://www.fda.gov/media/76860/download")
      .with_retries(3, std::time::Duration::from_secs(300)),
    DatasetDescriptor::new(
      "rxterms",
      "0 0 5 * *",
      r#"https://data.lhncbc.nlm.nih.gov/public/rxterms/release/RxTerms{{ run_date | format("%Y%m") }}.zip"#,
    ),
  ];

  let registry = Registry::new();
  let factory = PipelineFactory::new(root.path(), root.path().join("data"));
  let report = registry.register_all(&descriptors, &factory, &PipelineDefaults::default(), BuildFailurePolicy::Isolate)?;
  info!(registered = ?report.registered, "Pipelines registered");

  for pipeline in registry.pipelines() {
    info!(
      id = pipeline.id(),
      next = ?pipeline.schedule().next_after(&Utc::now()),
      tasks = ?pipeline.graph().task_ids(),
      "Pipeline"
    );
  }

  let collaborators = Collaborators::new(Arc::new(LogDownloader), Arc::new(LogSql));
  let ctx = RunContext::new("rxterms", Utc::now());
  let summary = registry.run("rxterms", ctx.clone(), &collaborators).await?;
  info!(?summary, resolved_url = ?ctx.read().resolved_url, "Run finished");

  Ok(())
}
