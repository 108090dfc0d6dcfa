use crate::error::{KpiError, Result};
use crate::types::{RawRow, TabularSource};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::debug;

/// Abstract bulk writer for the report output.
///
/// Implementations must fully replace the prior content of the target sheet
/// so repeated runs overwrite instead of appending. Partial writes are not
/// supported; any failure is fatal (`KpiError::SinkWrite`).
#[async_trait]
pub trait ReportSink: Send + Sync {
    async fn write_table(
        &self,
        destination_id: &str,
        sheet_name: &str,
        header: &[String],
        rows: &[Vec<String>],
    ) -> Result<()>;
}

/// A sheet captured by [`InMemoryTables`] after a write.
#[derive(Debug, Clone, PartialEq)]
pub struct WrittenTable {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// In-memory tabular store for development/testing. Serves seeded tables as
/// a source and records written tables as a sink.
#[derive(Default)]
pub struct InMemoryTables {
    tables: Arc<Mutex<HashMap<(String, String), Vec<RawRow>>>>,
    written: Arc<Mutex<HashMap<(String, String), WrittenTable>>>,
}

impl InMemoryTables {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a readable table.
    pub fn insert_table(&self, source_id: &str, sheet_name: &str, rows: Vec<RawRow>) {
        let mut tables = self.tables.lock().unwrap();
        tables.insert((source_id.to_string(), sheet_name.to_string()), rows);
    }

    /// Fetch what a sink write left behind, if anything.
    pub fn written(&self, destination_id: &str, sheet_name: &str) -> Option<WrittenTable> {
        let written = self.written.lock().unwrap();
        written
            .get(&(destination_id.to_string(), sheet_name.to_string()))
            .cloned()
    }
}

#[async_trait]
impl TabularSource for InMemoryTables {
    async fn read_table(&self, source_id: &str, sheet_name: &str) -> Result<Vec<RawRow>> {
        let tables = self.tables.lock().unwrap();
        tables
            .get(&(source_id.to_string(), sheet_name.to_string()))
            .cloned()
            .ok_or_else(|| {
                KpiError::source_unavailable(
                    format!("{source_id}/{sheet_name}"),
                    "no such table",
                )
            })
    }
}

#[async_trait]
impl ReportSink for InMemoryTables {
    async fn write_table(
        &self,
        destination_id: &str,
        sheet_name: &str,
        header: &[String],
        rows: &[Vec<String>],
    ) -> Result<()> {
        let mut written = self.written.lock().unwrap();
        written.insert(
            (destination_id.to_string(), sheet_name.to_string()),
            WrittenTable {
                header: header.to_vec(),
                rows: rows.to_vec(),
            },
        );
        debug!(
            "Wrote {} rows to in-memory sheet {}/{}",
            rows.len(),
            destination_id,
            sheet_name
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CellValue;

    fn row(pairs: &[(&str, &str)]) -> RawRow {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), CellValue::Text(v.to_string())))
            .collect()
    }

    #[tokio::test]
    async fn read_missing_table_is_source_unavailable() {
        let tables = InMemoryTables::new();
        let err = tables.read_table("sheet-1", "Lead").await.unwrap_err();
        assert!(matches!(err, KpiError::SourceUnavailable { .. }));
    }

    #[tokio::test]
    async fn write_replaces_prior_content() {
        let tables = InMemoryTables::new();
        tables.insert_table("src", "Lead", vec![row(&[("QAI_ID", "QAI_1")])]);

        let header = vec!["A".to_string()];
        tables
            .write_table("dest", "Final_Report", &header, &[vec!["1".to_string()]])
            .await
            .unwrap();
        tables
            .write_table("dest", "Final_Report", &header, &[vec!["2".to_string()]])
            .await
            .unwrap();

        let written = tables.written("dest", "Final_Report").unwrap();
        assert_eq!(written.rows, vec![vec!["2".to_string()]]);
    }
}
