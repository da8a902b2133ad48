pub mod coordinator;
pub mod runner;

pub use coordinator::{slice_bounds, BatchCoordinator, PartialResult};
pub use runner::PipelineRunner;
