use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tracing::info;

use crate::csv_processor::{plan_batches, read_records, read_rows, write_table, BatchPlan};
use crate::pipeline::coordinator::{BatchCoordinator, PartialResult};
use crate::state::CheckpointStore;
use crate::translation::{RetryPolicy, TranslationBackend};
use crate::utils::{Result, RunConfig};

/// Top-level driver: iterates batches in order, skips completed ones, writes
/// a partial artifact and advances the checkpoint per batch, then merges all
/// artifacts into the final output.
///
/// Between batches execution is strictly sequential; no batch starts before
/// the previous one's checkpoint is durably written, which is what makes
/// resume correct. Partial artifacts are retained until the merge so the
/// final output can be assembled from disk alone.
pub struct PipelineRunner {
    store: CheckpointStore,
    config: RunConfig,
    coordinator: BatchCoordinator,
    delimiter: u8,
    batch_pause: Duration,
}

impl PipelineRunner {
    /// Opens (or creates) the checkpoint directory. When a prior run left a
    /// `config.json` behind, its contents win over `proposed` wholesale.
    pub fn new(
        checkpoint_dir: impl Into<std::path::PathBuf>,
        proposed: RunConfig,
        backend: Arc<dyn TranslationBackend>,
        retry: RetryPolicy,
        batch_pause: Duration,
    ) -> Result<Self> {
        let store = CheckpointStore::new(checkpoint_dir);
        let config = store.load_or_init(proposed)?;

        Ok(Self {
            store,
            config,
            coordinator: BatchCoordinator::new(backend, retry),
            delimiter: b'\t',
            batch_pause,
        })
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    pub fn checkpoint_store(&self) -> &CheckpointStore {
        &self.store
    }

    /// Loads the source and slices it into batches using the run's column
    /// roles. Pass `names` for header-less sources; `skip_rows` / `row_limit`
    /// support partial loads.
    pub fn generate_batches(
        &self,
        source_path: &Path,
        names: Option<&[String]>,
        delimiter: u8,
        batch_size: usize,
        skip_rows: usize,
        row_limit: Option<usize>,
    ) -> Result<BatchPlan> {
        let (columns, rows) = read_rows(source_path, names, delimiter, skip_rows, row_limit)?;
        plan_batches(rows, &columns, &self.config, batch_size)
    }

    /// Number of partial artifacts currently on disk.
    pub fn ready_batch_count(&self) -> Result<usize> {
        self.store.ready_batch_count()
    }

    /// Runs the pipeline to completion: translate pending batches, checkpoint
    /// each, then merge every artifact into `output_path`. Re-running with an
    /// already-complete checkpoint goes straight to the merge and performs no
    /// backend calls.
    pub async fn run(
        &mut self,
        plan: &BatchPlan,
        output_path: &Path,
        resume_from: Option<usize>,
    ) -> Result<()> {
        let start_batch = start_batch(resume_from, self.config.last_completed_batch);
        if start_batch > 0 {
            info!(skipped = start_batch, "resuming, skipping completed batches");
        }

        let pending = plan.batches.len().saturating_sub(start_batch);
        if pending == 0 {
            info!("dataset already translated");
        }

        let first_pending = start_batch.min(plan.batches.len());
        for batch in &plan.batches[first_pending..] {
            let result = self
                .coordinator
                .run_batch(batch, &self.config, &plan.working_columns)
                .await?;

            let artifact = self.store.artifact_path(batch.index);
            write_table(
                &artifact,
                self.delimiter,
                &plan.working_columns,
                &result.to_records(&plan.working_columns),
            )?;

            // The checkpoint only advances once the artifact is durable; a
            // failure above leaves this batch pending for the next run.
            self.config = self
                .store
                .update_field("last_completed_batch", json!(batch.index))?;
            info!(
                batch = batch.index,
                rows = result.row_count(),
                "batch translated and checkpointed"
            );

            if !self.batch_pause.is_zero() {
                tokio::time::sleep(self.batch_pause).await;
            }
        }

        self.merge_artifacts(&plan.working_columns, output_path)
    }

    /// Reads back every partial artifact in index order, concatenates them,
    /// and writes the final output with columns in working order.
    fn merge_artifacts(&self, working_columns: &[String], output_path: &Path) -> Result<()> {
        let artifacts = self.store.list_partial_artifacts()?;
        info!(count = artifacts.len(), "merging partial artifacts");

        let mut merged = PartialResult::default();
        for (_, path) in artifacts {
            let (columns, records) = read_records(&path, self.delimiter)?;
            merged.append(PartialResult::from_records(&columns, records));
        }

        let rows = write_table(
            output_path,
            self.delimiter,
            working_columns,
            &merged.to_records(working_columns),
        )?;
        info!(rows, output = %output_path.display(), "final output written");
        Ok(())
    }
}

fn start_batch(resume_from: Option<usize>, last_completed: Option<usize>) -> usize {
    match resume_from {
        Some(explicit) => explicit,
        None => last_completed.map_or(0, |index| index + 1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_batch_resolution() {
        assert_eq!(start_batch(None, None), 0);
        assert_eq!(start_batch(None, Some(0)), 1);
        assert_eq!(start_batch(None, Some(4)), 5);
        // An explicit override wins over the checkpoint.
        assert_eq!(start_batch(Some(2), Some(7)), 2);
        assert_eq!(start_batch(Some(0), None), 0);
    }
}
