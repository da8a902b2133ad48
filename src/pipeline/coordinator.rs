use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::csv_processor::{Batch, Row};
use crate::translation::{RetryPolicy, TranslationBackend, TranslationWorker};
use crate::utils::{PipelineError, Result, RunConfig};

/// Column-keyed translated output for one batch (or, after merging, several
/// batches), order-preserving with the source rows.
#[derive(Debug, Clone, Default)]
pub struct PartialResult {
    columns: HashMap<String, Vec<String>>,
}

impl PartialResult {
    pub fn insert_column(&mut self, name: String, values: Vec<String>) {
        self.columns.insert(name, values);
    }

    pub fn column(&self, name: &str) -> Option<&[String]> {
        self.columns.get(name).map(Vec::as_slice)
    }

    pub fn row_count(&self) -> usize {
        self.columns.values().map(Vec::len).max().unwrap_or(0)
    }

    /// Appends another result row-wise, concatenating per column.
    pub fn append(&mut self, other: PartialResult) {
        for (name, values) in other.columns {
            self.columns.entry(name).or_default().extend(values);
        }
    }

    /// Materializes rows in the given column order. A column absent from the
    /// result yields empty cells, matching how the original dataset merge
    /// reindexes columns.
    pub fn to_records(&self, column_order: &[String]) -> Vec<Vec<String>> {
        (0..self.row_count())
            .map(|row| {
                column_order
                    .iter()
                    .map(|name| {
                        self.columns
                            .get(name)
                            .and_then(|values| values.get(row))
                            .cloned()
                            .unwrap_or_default()
                    })
                    .collect()
            })
            .collect()
    }

    pub fn from_records(columns: &[String], records: Vec<Vec<String>>) -> Self {
        let mut result = Self::default();
        for (position, name) in columns.iter().enumerate() {
            let values = records
                .iter()
                .map(|record| record.get(position).cloned().unwrap_or_default())
                .collect();
            result.insert_column(name.clone(), values);
        }
        result
    }
}

/// Contiguous slice bounds for fanning a batch across workers: each slice
/// gets `floor(len / workers)` rows and the final slice absorbs the
/// remainder. The worker count is clamped to the row count so no empty
/// slices are spawned.
pub fn slice_bounds(len: usize, worker_count: usize) -> Vec<(usize, usize)> {
    if len == 0 {
        return Vec::new();
    }
    let workers = worker_count.max(1).min(len);
    let split = len / workers;

    (0..workers)
        .map(|i| {
            let start = i * split;
            let end = if i + 1 == workers { len } else { start + split };
            (start, end)
        })
        .collect()
}

/// Fans one batch across a fixed pool of parallel workers and reassembles
/// their outputs in slice order.
pub struct BatchCoordinator {
    backend: Arc<dyn TranslationBackend>,
    retry: RetryPolicy,
}

impl BatchCoordinator {
    pub fn new(backend: Arc<dyn TranslationBackend>, retry: RetryPolicy) -> Self {
        Self { backend, retry }
    }

    /// Runs every slice of `batch` concurrently and concatenates the results
    /// per column **in slice order**, so the output row order equals the
    /// input row order no matter which worker finishes first. Any fatally
    /// failed worker fails the whole batch.
    pub async fn run_batch(
        &self,
        batch: &Batch,
        config: &RunConfig,
        working_columns: &[String],
    ) -> Result<PartialResult> {
        let bounds = slice_bounds(batch.rows.len(), config.max_workers);
        debug!(
            batch = batch.index,
            rows = batch.rows.len(),
            slices = bounds.len(),
            "dispatching batch"
        );

        let mut handles = Vec::with_capacity(bounds.len());
        for (start, end) in bounds {
            let rows = batch.rows[start..end].to_vec();
            let worker = TranslationWorker::new(
                Arc::clone(&self.backend),
                self.retry.clone(),
                config.source_lang.clone(),
            );
            let config = config.clone();
            let columns = working_columns.to_vec();
            handles.push(tokio::spawn(async move {
                translate_slice(&worker, &rows, &config, &columns).await
            }));
        }

        let mut merged = PartialResult::default();
        for handle in handles {
            let slice_result = handle
                .await
                .map_err(|e| PipelineError::PartialBatch {
                    batch: batch.index,
                    source: Box::new(PipelineError::TaskJoin(e.to_string())),
                })?
                .map_err(|e| PipelineError::PartialBatch {
                    batch: batch.index,
                    source: Box::new(e),
                })?;
            merged.append(slice_result);
        }

        Ok(merged)
    }
}

/// One worker's share of a batch: translate-columns go through the backend,
/// keep-columns pass through unchanged.
async fn translate_slice(
    worker: &TranslationWorker,
    rows: &[Row],
    config: &RunConfig,
    working_columns: &[String],
) -> Result<PartialResult> {
    let mut result = PartialResult::default();

    for name in working_columns {
        let values: Vec<String> = rows
            .iter()
            .map(|row| row.get(name).cloned().unwrap_or_default())
            .collect();

        if config.is_translate_column(name) {
            let translated = worker
                .translate_column(&values, config.per_request, &config.target_lang)
                .await?;
            result.insert_column(name.clone(), translated);
        } else {
            result.insert_column(name.clone(), values);
        }
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    use crate::translation::BackendError;

    fn config(workers: usize, per_request: usize) -> RunConfig {
        RunConfig::new(
            "de",
            workers,
            per_request,
            vec!["text".to_string()],
            vec!["id".to_string()],
        )
    }

    fn batch(values: &[(&str, &str)]) -> Batch {
        Batch {
            index: 0,
            rows: values
                .iter()
                .map(|(id, text)| {
                    Row::from([
                        ("id".to_string(), id.to_string()),
                        ("text".to_string(), text.to_string()),
                    ])
                })
                .collect(),
        }
    }

    fn working_columns() -> Vec<String> {
        vec!["id".to_string(), "text".to_string()]
    }

    /// Suffixes each line and sleeps longer for earlier rows, so later
    /// slices finish first and arrival order differs from slice order.
    struct SkewedBackend;

    #[async_trait]
    impl TranslationBackend for SkewedBackend {
        async fn translate(
            &self,
            text: &str,
            target_lang: &str,
            _source_lang: &str,
        ) -> std::result::Result<String, BackendError> {
            if text.contains('a') {
                tokio::time::sleep(Duration::from_millis(50)).await;
            }
            Ok(text
                .split('\n')
                .map(|line| format!("{line}-{target_lang}"))
                .collect::<Vec<_>>()
                .join("\n"))
        }
    }

    struct FailingBackend;

    #[async_trait]
    impl TranslationBackend for FailingBackend {
        async fn translate(
            &self,
            _text: &str,
            _target_lang: &str,
            _source_lang: &str,
        ) -> std::result::Result<String, BackendError> {
            Err(BackendError::Fatal("boom".to_string()))
        }
    }

    #[test]
    fn slice_bounds_floor_with_remainder_in_last() {
        assert_eq!(slice_bounds(4, 2), [(0, 2), (2, 4)]);
        assert_eq!(slice_bounds(7, 3), [(0, 2), (2, 4), (4, 7)]);
        assert_eq!(slice_bounds(5, 1), [(0, 5)]);
        // Worker count clamps to the row count.
        assert_eq!(slice_bounds(2, 8), [(0, 1), (1, 2)]);
        assert!(slice_bounds(0, 4).is_empty());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn row_order_is_independent_of_completion_order() {
        let coordinator =
            BatchCoordinator::new(Arc::new(SkewedBackend), RetryPolicy::bounded(1, Duration::ZERO));
        let cfg = config(2, 2);
        let batch = batch(&[("1", "a"), ("2", "b"), ("3", "c"), ("4", "d")]);

        let result = coordinator
            .run_batch(&batch, &cfg, &working_columns())
            .await
            .unwrap();

        assert_eq!(result.column("id").unwrap(), ["1", "2", "3", "4"]);
        assert_eq!(
            result.column("text").unwrap(),
            ["a-de", "b-de", "c-de", "d-de"]
        );
    }

    #[tokio::test]
    async fn failed_worker_fails_the_whole_batch() {
        let coordinator = BatchCoordinator::new(
            Arc::new(FailingBackend),
            RetryPolicy::bounded(1, Duration::ZERO),
        );
        let cfg = config(2, 2);
        let batch = batch(&[("1", "a"), ("2", "b")]);

        let err = coordinator
            .run_batch(&batch, &cfg, &working_columns())
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::PartialBatch { batch: 0, .. }));
    }

    #[tokio::test]
    async fn empty_batch_yields_empty_result() {
        let coordinator =
            BatchCoordinator::new(Arc::new(SkewedBackend), RetryPolicy::bounded(1, Duration::ZERO));
        let cfg = config(4, 2);
        let batch = Batch {
            index: 3,
            rows: Vec::new(),
        };

        let result = coordinator
            .run_batch(&batch, &cfg, &working_columns())
            .await
            .unwrap();
        assert_eq!(result.row_count(), 0);
    }

    #[test]
    fn records_round_trip_preserves_column_order() {
        let columns = working_columns();
        let mut result = PartialResult::default();
        result.insert_column("text".to_string(), vec!["x".to_string()]);
        result.insert_column("id".to_string(), vec!["1".to_string()]);

        let records = result.to_records(&columns);
        assert_eq!(records, [["1".to_string(), "x".to_string()]]);

        let rebuilt = PartialResult::from_records(&columns, records);
        assert_eq!(rebuilt.column("id").unwrap(), ["1"]);
        assert_eq!(rebuilt.column("text").unwrap(), ["x"]);
    }
}
