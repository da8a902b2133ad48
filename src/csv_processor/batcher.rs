use std::collections::HashMap;

use crate::utils::{PipelineError, Result, RunConfig};

pub type Row = HashMap<String, String>;

/// A bounded slice of the full row set, processed as one resumable unit.
#[derive(Debug, Clone)]
pub struct Batch {
    pub index: usize,
    pub rows: Vec<Row>,
}

impl Batch {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

/// The planned run: ordered batches plus the working column order shared by
/// partial artifacts and the final output.
#[derive(Debug, Clone)]
pub struct BatchPlan {
    pub working_columns: Vec<String>,
    pub batches: Vec<Batch>,
}

impl BatchPlan {
    pub fn batch_count(&self) -> usize {
        self.batches.len()
    }

    pub fn total_rows(&self) -> usize {
        self.batches.iter().map(Batch::row_count).sum()
    }
}

/// Splits `rows` into batches of at most `batch_size`, projecting each row to
/// the working columns: the source column order filtered to the configured
/// translate and keep roles.
pub fn plan_batches(
    rows: Vec<Row>,
    source_columns: &[String],
    config: &RunConfig,
    batch_size: usize,
) -> Result<BatchPlan> {
    if batch_size == 0 {
        return Err(PipelineError::Config(
            "batch_size must be at least 1".to_string(),
        ));
    }

    let working_columns: Vec<String> = source_columns
        .iter()
        .filter(|c| config.is_translate_column(c) || config.is_keep_column(c))
        .cloned()
        .collect();

    if !working_columns
        .iter()
        .any(|c| config.is_translate_column(c))
    {
        return Err(PipelineError::Config(
            "none of the configured translate_columns are present in the source".to_string(),
        ));
    }

    let mut batches = Vec::new();
    let mut pending: Vec<Row> = Vec::with_capacity(batch_size.min(rows.len()));

    for mut row in rows {
        let projected: Row = working_columns
            .iter()
            .map(|c| (c.clone(), row.remove(c).unwrap_or_default()))
            .collect();
        pending.push(projected);

        if pending.len() == batch_size {
            batches.push(Batch {
                index: batches.len(),
                rows: std::mem::take(&mut pending),
            });
        }
    }
    if !pending.is_empty() {
        batches.push(Batch {
            index: batches.len(),
            rows: pending,
        });
    }

    Ok(BatchPlan {
        working_columns,
        batches,
    })
}
