// datadag/ingest/src/services/mod.rs

//! Production implementations of the collaborators a pipeline run needs.

pub mod downloader;
pub mod notifier;
pub mod sql_executor;

pub use downloader::HttpDownloader;
pub use notifier::{LogNotifier, SlackNotifier};
pub use sql_executor::PgSqlExecutor;
