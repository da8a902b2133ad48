pub mod csv_processor;
pub mod pipeline;
pub mod state;
pub mod translation;
pub mod utils;

pub use csv_processor::{plan_batches, Batch, BatchPlan, Row};
pub use pipeline::{BatchCoordinator, PartialResult, PipelineRunner};
pub use state::CheckpointStore;
pub use translation::{
    BackendError, HttpTranslationBackend, RetryPolicy, TranslationBackend, TranslationWorker,
};
pub use utils::{PipelineError, PipelineSettings, Result, RunConfig};
