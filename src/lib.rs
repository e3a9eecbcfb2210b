pub mod columnar;
pub mod config;
pub mod error;
pub mod events;
pub mod fetch;
pub mod join;
pub mod label;
pub mod pipeline;
pub mod records;
pub mod rolling;
pub mod store;

pub use error::PipelineError;
pub use pipeline::{PipelineOutput, RunSummary, run_pipeline};
