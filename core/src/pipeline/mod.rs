// datadag/src/pipeline/mod.rs

//! Defines the `Pipeline` struct, how it is built from a dataset descriptor,
//! and how one run of it is executed.

pub mod definition;
pub mod execution;
pub mod factory;
pub mod hooks;

pub use definition::{Pipeline, DEFAULT_CONN_ID};
pub use factory::PipelineFactory;
