use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use datadag::catalog::ordered_script_names;
use datadag::{
  chain, CategorizedScripts, Collaborators, CronSchedule, DownloadTask, Downloader, Pipeline, PipelineDefaults,
  RunContext, ScriptCategory, ScriptStep, SqlExecutor, UrlTemplate,
};
use std::path::Path;
use std::sync::Arc;
use tokio::runtime::Runtime;

// --- No-op collaborators ---
struct NoopDownloader;

#[async_trait]
impl Downloader for NoopDownloader {
  async fn retrieve(&self, _url: &str, _destination_dir: &Path) -> anyhow::Result<()> {
    Ok(())
  }
}

struct NoopSql;

#[async_trait]
impl SqlExecutor for NoopSql {
  async fn execute(&self, _conn_id: &str, _sql_text: &str) -> anyhow::Result<()> {
    Ok(())
  }
}

fn scripts_per_category(n: usize) -> CategorizedScripts {
  let mut scripts = CategorizedScripts::default();
  for category in ScriptCategory::ALL {
    let steps = (0..n)
      .map(|i| ScriptStep::new(format!("{}{:03}.sql", category.prefix(), i), category, "select 1;"))
      .collect();
    scripts.set(category, steps);
  }
  scripts
}

fn download_task() -> DownloadTask {
  let url = UrlTemplate::parse(r#"https://example.org/{{ run_date | format("%Y%m") }}.zip"#).unwrap();
  DownloadTask::for_dataset("bench", url, Path::new("data"))
}

// --- Benchmark Functions ---

fn bench_ordering(c: &mut Criterion) {
  let mut group = c.benchmark_group("ScriptOrdering");
  for n in [10usize, 100, 1000].iter() {
    let names: Vec<String> = (0..*n)
      .map(|i| {
        let category = ScriptCategory::ALL[i % ScriptCategory::ALL.len()];
        format!("{}{:04}.sql", category.prefix(), n - i)
      })
      .collect();
    group.throughput(Throughput::Elements(*n as u64));
    group.bench_with_input(BenchmarkId::from_parameter(n), &names, |b, names| {
      b.iter(|| criterion::black_box(ordered_script_names(names.iter())))
    });
  }
  group.finish();
}

fn bench_chain_build(c: &mut Criterion) {
  let mut group = c.benchmark_group("ChainBuild");
  for per_category in [1usize, 10, 100].iter() {
    let scripts = scripts_per_category(*per_category);
    group.throughput(Throughput::Elements((per_category * ScriptCategory::ALL.len() + 1) as u64));
    group.bench_with_input(BenchmarkId::from_parameter(per_category), &scripts, |b, scripts| {
      b.iter(|| criterion::black_box(chain::build(download_task(), scripts).unwrap()))
    });
  }
  group.finish();
}

fn bench_template_render(c: &mut Criterion) {
  let template = UrlTemplate::parse(
    r#"https://purplebooksearch.fda.gov/files/{{ run_date | months_ago(1) | format("%Y") }}/purplebook-search-{{ run_date | months_ago(1) | format("%B") | lower }}-data-download.csv"#,
  )
  .unwrap();
  let date = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
  c.bench_function("TemplateRender", |b| {
    b.iter(|| criterion::black_box(template.render(date).unwrap()))
  });
}

fn bench_pipeline_run(c: &mut Criterion) {
  let mut group = c.benchmark_group("PipelineRunNoop");
  let rt = Runtime::new().unwrap();
  let collaborators = Collaborators::new(Arc::new(NoopDownloader), Arc::new(NoopSql));
  let tick = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();

  for per_category in [1usize, 10].iter() {
    let graph = chain::build(download_task(), &scripts_per_category(*per_category)).unwrap();
    let policy = PipelineDefaults::default().merge(&Default::default());
    let pipeline = Arc::new(Pipeline::new("bench", graph, CronSchedule::parse("@daily").unwrap(), policy));

    group.throughput(Throughput::Elements(pipeline.graph().len() as u64));
    group.bench_with_input(BenchmarkId::from_parameter(per_category), per_category, |b, _| {
      b.to_async(&rt).iter_batched(
        || RunContext::new("bench", tick),
        |ctx| {
          let pipeline = pipeline.clone();
          let collaborators = collaborators.clone();
          async move { pipeline.run(ctx, &collaborators).await.unwrap() }
        },
        criterion::BatchSize::SmallInput,
      );
    });
  }
  group.finish();
}

criterion_group!(
  benches,
  bench_ordering,
  bench_chain_build,
  bench_template_render,
  bench_pipeline_run
);
criterion_main!(benches);
