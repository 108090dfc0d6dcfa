//! HTTP client for a hosted spreadsheet service. Reads worksheet values and
//! replaces whole worksheets on write, which is what makes repeated report
//! runs idempotent.

use crate::auth::AccessToken;
use crate::error::{KpiError, Result};
use crate::storage::ReportSink;
use crate::types::{CellValue, RawRow, TabularSource};
use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, instrument};

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

pub struct SheetsClient {
    client: reqwest::Client,
    base_url: String,
    token: AccessToken,
}

impl SheetsClient {
    pub fn new(base_url: impl Into<String>, token: AccessToken) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            client: reqwest::Client::new(),
            base_url,
            token,
        }
    }

    fn values_url(&self, spreadsheet_id: &str, sheet_name: &str) -> String {
        format!(
            "{}/spreadsheets/{}/values/{}",
            self.base_url, spreadsheet_id, sheet_name
        )
    }

    fn cell_from_json(value: &Value) -> CellValue {
        match value {
            Value::Null => CellValue::Empty,
            Value::Number(n) => n.as_f64().map(CellValue::Number).unwrap_or(CellValue::Empty),
            Value::String(s) => {
                if s.trim().is_empty() {
                    CellValue::Empty
                } else {
                    CellValue::Text(s.clone())
                }
            }
            other => CellValue::Text(other.to_string()),
        }
    }
}

#[async_trait]
impl TabularSource for SheetsClient {
    #[instrument(skip(self))]
    async fn read_table(&self, source_id: &str, sheet_name: &str) -> Result<Vec<RawRow>> {
        let table = format!("{source_id}/{sheet_name}");
        let url = self.values_url(source_id, sheet_name);

        let response = self
            .client
            .get(&url)
            .header(AUTHORIZATION, self.token.bearer())
            .send()
            .await
            .map_err(|e| KpiError::source_unavailable(&table, e))?;
        if !response.status().is_success() {
            return Err(KpiError::source_unavailable(
                &table,
                format!("service responded with status {}", response.status().as_u16()),
            ));
        }

        let range: ValueRange = response
            .json()
            .await
            .map_err(|e| KpiError::source_unavailable(&table, e))?;

        let mut values = range.values.into_iter();
        let header: Vec<String> = match values.next() {
            Some(cells) => cells
                .iter()
                .map(|cell| match cell {
                    Value::String(s) => s.trim().to_string(),
                    other => other.to_string(),
                })
                .collect(),
            None => {
                return Err(KpiError::source_unavailable(&table, "sheet has no header row"))
            }
        };

        let rows: Vec<RawRow> = values
            .map(|cells| {
                header
                    .iter()
                    .zip(cells.iter())
                    .map(|(name, cell)| (name.clone(), Self::cell_from_json(cell)))
                    .collect()
            })
            .collect();

        debug!("Read {} rows from {}", rows.len(), table);
        Ok(rows)
    }
}

#[async_trait]
impl ReportSink for SheetsClient {
    #[instrument(skip(self, header, rows))]
    async fn write_table(
        &self,
        destination_id: &str,
        sheet_name: &str,
        header: &[String],
        rows: &[Vec<String>],
    ) -> Result<()> {
        let table = format!("{destination_id}/{sheet_name}");
        let url = self.values_url(destination_id, sheet_name);

        let mut values: Vec<&[String]> = Vec::with_capacity(rows.len() + 1);
        values.push(header);
        values.extend(rows.iter().map(Vec::as_slice));

        // PUT replaces the whole worksheet; the service clears cells beyond
        // the submitted range.
        let response = self
            .client
            .put(&url)
            .header(AUTHORIZATION, self.token.bearer())
            .json(&json!({ "values": values }))
            .send()
            .await
            .map_err(|e| KpiError::sink_write(&table, e))?;
        if !response.status().is_success() {
            return Err(KpiError::sink_write(
                &table,
                format!("service responded with status {}", response.status().as_u16()),
            ));
        }

        debug!("Replaced {} with {} rows", table, rows.len());
        Ok(())
    }
}
