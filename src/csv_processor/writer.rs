use std::fs::File;
use std::path::{Path, PathBuf};

use csv::{Writer, WriterBuilder};

use crate::utils::{PipelineError, Result};

/// Writes a delimited table: header first, then rows. Used for both partial
/// artifacts and the final merged output.
pub struct TableWriter {
    path: PathBuf,
    delimiter: u8,
    columns: Vec<String>,
    writer: Option<Writer<File>>,
    rows_written: usize,
}

impl TableWriter {
    pub fn new(path: impl Into<PathBuf>, delimiter: u8, columns: Vec<String>) -> Self {
        Self {
            path: path.into(),
            delimiter,
            columns,
            writer: None,
            rows_written: 0,
        }
    }

    pub fn initialize(&mut self) -> Result<()> {
        let mut writer = WriterBuilder::new()
            .delimiter(self.delimiter)
            .from_path(&self.path)?;
        writer.write_record(&self.columns)?;
        self.writer = Some(writer);
        Ok(())
    }

    pub fn write_row(&mut self, row: &[String]) -> Result<()> {
        let writer = self.writer.as_mut().ok_or_else(|| {
            PipelineError::Io(std::io::Error::new(
                std::io::ErrorKind::NotConnected,
                "writer not initialized",
            ))
        })?;
        writer.write_record(row)?;
        self.rows_written += 1;
        Ok(())
    }

    pub fn write_rows(&mut self, rows: &[Vec<String>]) -> Result<()> {
        for row in rows {
            self.write_row(row)?;
        }
        Ok(())
    }

    pub fn finish(mut self) -> Result<usize> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush()?;
        }
        Ok(self.rows_written)
    }

    pub fn rows_written(&self) -> usize {
        self.rows_written
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// One-shot convenience over [`TableWriter`].
pub fn write_table(
    path: &Path,
    delimiter: u8,
    columns: &[String],
    rows: &[Vec<String>],
) -> Result<usize> {
    let mut writer = TableWriter::new(path, delimiter, columns.to_vec());
    writer.initialize()?;
    writer.write_rows(rows)?;
    writer.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::csv_processor::reader::read_records;

    #[test]
    fn written_table_reads_back_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.tsv");
        let columns = vec!["id".to_string(), "text".to_string()];
        let rows = vec![
            vec!["1".to_string(), "hallo".to_string()],
            vec!["2".to_string(), "welt".to_string()],
        ];

        let written = write_table(&path, b'\t', &columns, &rows).unwrap();
        assert_eq!(written, 2);

        let (read_columns, read_rows) = read_records(&path, b'\t').unwrap();
        assert_eq!(read_columns, columns);
        assert_eq!(read_rows, rows);
    }

    #[test]
    fn write_before_initialize_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = TableWriter::new(dir.path().join("out.tsv"), b'\t', vec![]);
        assert!(writer.write_row(&["x".to_string()]).is_err());
    }
}
