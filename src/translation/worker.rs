use std::sync::Arc;

use tracing::warn;

use crate::translation::backend::{BackendError, TranslationBackend};
use crate::translation::retry::RetryPolicy;
use crate::utils::{PipelineError, Result};

/// Values are packed several-per-request with this separator; the backend is
/// expected to translate line by line. A source value containing the
/// separator, or a backend that merges or reorders lines, breaks the
/// alignment invariant and surfaces as an error rather than silent
/// corruption.
const PACK_SEPARATOR: &str = "\n";

/// Translates one column's values for one batch slice. Stateless between
/// invocations; all durable effects live in the pipeline above it.
pub struct TranslationWorker {
    backend: Arc<dyn TranslationBackend>,
    retry: RetryPolicy,
    source_lang: String,
}

impl TranslationWorker {
    pub fn new(
        backend: Arc<dyn TranslationBackend>,
        retry: RetryPolicy,
        source_lang: impl Into<String>,
    ) -> Self {
        Self {
            backend,
            retry,
            source_lang: source_lang.into(),
        }
    }

    /// Translates `values` in consecutive chunks of `per_request`, preserving
    /// order. The output length always equals the input length.
    pub async fn translate_column(
        &self,
        values: &[String],
        per_request: usize,
        target_lang: &str,
    ) -> Result<Vec<String>> {
        if per_request == 0 {
            return Err(PipelineError::Config(
                "per_request must be at least 1".to_string(),
            ));
        }

        let mut translated = Vec::with_capacity(values.len());

        for chunk in values.chunks(per_request) {
            let payload = chunk.join(PACK_SEPARATOR);
            let result = self.call_with_retry(&payload, target_lang).await?;

            let lines: Vec<String> = result.split(PACK_SEPARATOR).map(str::to_string).collect();
            if lines.len() != chunk.len() {
                return Err(PipelineError::Alignment {
                    expected: chunk.len(),
                    got: lines.len(),
                });
            }
            translated.extend(lines);
        }

        Ok(translated)
    }

    async fn call_with_retry(&self, payload: &str, target_lang: &str) -> Result<String> {
        let mut failed_attempts: u32 = 0;

        loop {
            match self
                .backend
                .translate(payload, target_lang, &self.source_lang)
                .await
            {
                Ok(result) => return Ok(result),
                Err(BackendError::Fatal(reason)) => {
                    return Err(PipelineError::Translation(reason));
                }
                Err(BackendError::Transient(reason)) => {
                    failed_attempts += 1;
                    if !self.retry.allows(failed_attempts) {
                        return Err(PipelineError::RetriesExhausted {
                            attempts: failed_attempts,
                            reason,
                        });
                    }
                    let delay = self.retry.delay_for(failed_attempts);
                    warn!(
                        attempt = failed_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %reason,
                        "transient backend error, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}
