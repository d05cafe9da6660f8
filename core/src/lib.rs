// src/lib.rs

//! datadag: declarative ingestion pipelines for public datasets.
//!
//! Each dataset is declared once (id, cron schedule, source URL template and
//! optional policy overrides) and turned into a linear pipeline:
//!  - A download task that fetches the source artifact into a local folder.
//!  - One SQL task per script found in the dataset's script directory,
//!    ordered `load-`, `staging-`, `view-`, `api-`, `alter-`, then by name.
//!  - Per-step retries and a single failure notification per failed run.
//!  - An id-keyed registry that builds every pipeline up front and rejects duplicates.

pub mod catalog;
pub mod chain;
pub mod core;
pub mod descriptor;
pub mod error;
pub mod pipeline;
pub mod policy;
pub mod registry;
pub mod schedule;
pub mod template;

// --- Re-exports for the Public API ---

pub use crate::catalog::CategorizedScripts;
pub use crate::chain::PipelineGraph;
pub use crate::core::category::ScriptCategory;
pub use crate::core::collaborators::{Collaborators, Downloader, FailureContext, FailureNotifier, SqlExecutor};
pub use crate::core::context_data::{RunContext, RunState, StepRecord};
pub use crate::core::control::{RunStatus, RunSummary, StepStatus};
pub use crate::core::step::{DownloadTask, ScriptStep, StepDef, StepKind};

pub use crate::descriptor::DatasetDescriptor;
pub use crate::error::{DagError, DagResult};
pub use crate::pipeline::{Pipeline, PipelineFactory, DEFAULT_CONN_ID};
pub use crate::policy::{PipelineDefaults, PipelinePolicy, PolicyOverrides, RetryPolicy};
pub use crate::registry::{BuildFailurePolicy, RegistrationReport, Registry};
pub use crate::schedule::CronSchedule;
pub use crate::template::UrlTemplate;

/*
    Typical startup:
    1. Describe each dataset with a `DatasetDescriptor`.
    2. Create a `PipelineFactory` pointing at the scripts root and data root.
    3. Call `Registry::register_all` with the process-wide `PipelineDefaults`.
    4. For every registered pipeline, wait for `schedule().next_after(now)`
       and call `pipeline.run(RunContext::new(id, tick), &collaborators)`.
*/
