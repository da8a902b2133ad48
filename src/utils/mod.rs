pub mod config;
pub mod errors;

pub use config::{ApiSettings, PipelineDefaults, PipelineSettings, RunConfig};
pub use errors::{PipelineError, Result};
