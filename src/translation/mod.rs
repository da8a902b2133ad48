pub mod backend;
pub mod retry;
pub mod worker;

pub use backend::{BackendError, HttpTranslationBackend, TranslationBackend};
pub use retry::RetryPolicy;
pub use worker::TranslationWorker;
