//! Filesystem tabular backend: one directory per source id, one CSV file per
//! worksheet. Useful for local runs and exported sheet snapshots. Writes go
//! through a temp file and a rename so a report file is either the old run
//! or the new one, never a partial mix.

use crate::error::{KpiError, Result};
use crate::storage::ReportSink;
use crate::types::{CellValue, RawRow, TabularSource};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::{debug, instrument};

pub struct CsvDirectory {
    root: PathBuf,
}

impl CsvDirectory {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn sheet_path(&self, table_id: &str, sheet_name: &str) -> PathBuf {
        self.root.join(table_id).join(format!("{sheet_name}.csv"))
    }
}

fn cell_from_field(field: &str) -> CellValue {
    if field.trim().is_empty() {
        CellValue::Empty
    } else {
        CellValue::Text(field.to_string())
    }
}

#[async_trait]
impl TabularSource for CsvDirectory {
    #[instrument(skip(self))]
    async fn read_table(&self, source_id: &str, sheet_name: &str) -> Result<Vec<RawRow>> {
        let table = format!("{source_id}/{sheet_name}");
        let path = self.sheet_path(source_id, sheet_name);

        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_path(&path)
            .map_err(|e| KpiError::source_unavailable(&table, e))?;

        let header: Vec<String> = reader
            .headers()
            .map_err(|e| KpiError::source_unavailable(&table, e))?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|e| KpiError::source_unavailable(&table, e))?;
            let row: RawRow = header
                .iter()
                .zip(record.iter())
                .map(|(name, field)| (name.clone(), cell_from_field(field)))
                .collect();
            rows.push(row);
        }

        debug!("Read {} rows from {}", rows.len(), path.display());
        Ok(rows)
    }
}

#[async_trait]
impl ReportSink for CsvDirectory {
    #[instrument(skip(self, header, rows))]
    async fn write_table(
        &self,
        destination_id: &str,
        sheet_name: &str,
        header: &[String],
        rows: &[Vec<String>],
    ) -> Result<()> {
        let table = format!("{destination_id}/{sheet_name}");
        let dir = self.root.join(destination_id);
        std::fs::create_dir_all(&dir).map_err(|e| KpiError::sink_write(&table, e))?;

        let final_path = dir.join(format!("{sheet_name}.csv"));
        let tmp_path = dir.join(format!(".{sheet_name}.csv.tmp"));

        write_csv(&tmp_path, header, rows).map_err(|e| KpiError::sink_write(&table, e))?;
        std::fs::rename(&tmp_path, &final_path).map_err(|e| KpiError::sink_write(&table, e))?;

        debug!("Replaced {} with {} rows", final_path.display(), rows.len());
        Ok(())
    }
}

fn write_csv(
    path: &Path,
    header: &[String],
    rows: &[Vec<String>],
) -> std::result::Result<(), csv::Error> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(header)?;
    for row in rows {
        writer.write_record(row)?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_sheet_is_source_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let backend = CsvDirectory::new(dir.path());
        let err = backend.read_table("lead-book", "Lead").await.unwrap_err();
        assert!(matches!(err, KpiError::SourceUnavailable { .. }));
    }

    #[tokio::test]
    async fn write_then_read_round_trips_headers() {
        let dir = tempfile::tempdir().unwrap();
        let backend = CsvDirectory::new(dir.path());

        let header = vec!["QAI_ID".to_string(), "Month".to_string()];
        let rows = vec![vec!["QAI_1".to_string(), "March".to_string()]];
        backend
            .write_table("report", "Final_Report", &header, &rows)
            .await
            .unwrap();

        let read_back = backend.read_table("report", "Final_Report").await.unwrap();
        assert_eq!(read_back.len(), 1);
        assert_eq!(
            read_back[0].get("QAI_ID"),
            Some(&CellValue::Text("QAI_1".to_string()))
        );
    }

    #[tokio::test]
    async fn rewrite_fully_replaces_prior_content() {
        let dir = tempfile::tempdir().unwrap();
        let backend = CsvDirectory::new(dir.path());
        let header = vec!["QAI_ID".to_string()];

        backend
            .write_table(
                "report",
                "Final_Report",
                &header,
                &[vec!["QAI_1".to_string()], vec!["QAI_2".to_string()]],
            )
            .await
            .unwrap();
        backend
            .write_table("report", "Final_Report", &header, &[vec!["QAI_3".to_string()]])
            .await
            .unwrap();

        let rows = backend.read_table("report", "Final_Report").await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(
            rows[0].get("QAI_ID"),
            Some(&CellValue::Text("QAI_3".to_string()))
        );
    }
}
