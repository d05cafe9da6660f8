pub mod category;
pub mod collaborators;
pub mod context_data;
pub mod control;
pub mod step;

// Re-export key types for easier access from other modules (and lib.rs)
pub use category::ScriptCategory;
pub use collaborators::{Collaborators, Downloader, FailureContext, FailureNotifier, SqlExecutor};
pub use context_data::{RunContext, RunState, StepRecord};
pub use control::{RunStatus, RunSummary, StepStatus};
pub use step::{DownloadTask, ScriptStep, StepDef, StepKind};
