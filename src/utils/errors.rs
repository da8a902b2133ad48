use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("no field `{0}` in checkpoint config")]
    UnknownField(String),

    #[error("checkpoint error: {0}")]
    Checkpoint(String),

    #[error("line count mismatch: sent {expected} values, got {got} back; try lowering per_request")]
    Alignment { expected: usize, got: usize },

    #[error("translation backend failed: {0}")]
    Translation(String),

    #[error("translation failed after {attempts} attempts: {reason}")]
    RetriesExhausted { attempts: u32, reason: String },

    #[error("batch {batch} failed: {source}")]
    PartialBatch {
        batch: usize,
        #[source]
        source: Box<PipelineError>,
    },

    #[error("worker task failed: {0}")]
    TaskJoin(String),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
