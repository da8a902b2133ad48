pub mod batcher;
pub mod reader;
pub mod writer;

pub use batcher::{plan_batches, Batch, BatchPlan, Row};
pub use reader::{read_records, read_rows};
pub use writer::{write_table, TableWriter};
