use crate::error::{KpiError, Result};

/// Runtime configuration, read once at process start and passed by reference
/// into the pipeline. Core logic never looks at the environment itself.
#[derive(Debug, Clone)]
pub struct Config {
    /// Spreadsheet holding the `Lead` and `Attendance` worksheets.
    pub lead_sheet_id: String,
    /// Spreadsheet holding the `Project_Hours` worksheet.
    pub pdr_sheet_id: String,
    /// Spreadsheet the report is written to.
    pub report_sheet_id: String,
    /// Base URL of the spreadsheet service (sheets backend).
    pub sheets_base_url: Option<String>,
    /// Bearer token for the spreadsheet service (sheets backend).
    pub api_token: Option<String>,
    /// JSON credentials file carrying the access token (sheets backend).
    pub credentials_file: Option<String>,
    /// Root directory for the CSV backend.
    pub data_dir: String,
}

impl Config {
    /// Load configuration from the environment, failing fast on anything
    /// required. Missing sheet identifiers abort before any extraction.
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();

        let config = Self {
            lead_sheet_id: require_env("SHEET_ID_LEAD")?,
            pdr_sheet_id: require_env("SHEET_ID_PDR")?,
            report_sheet_id: require_env("SHEET_ID_REPORT")?,
            sheets_base_url: optional_env("SHEETS_BASE_URL"),
            api_token: optional_env("SHEETS_API_TOKEN"),
            credentials_file: optional_env("SERVICE_ACCOUNT_FILE"),
            data_dir: optional_env("KPI_DATA_DIR").unwrap_or_else(|| "data".to_string()),
        };

        tracing::info!("Configuration loaded successfully");
        tracing::debug!("Lead sheet: {}", config.lead_sheet_id);
        tracing::debug!("Project hours sheet: {}", config.pdr_sheet_id);
        tracing::debug!("Report sheet: {}", config.report_sheet_id);
        if let Some(ref base) = config.sheets_base_url {
            tracing::debug!("Sheets base URL: {}", base);
        }

        Ok(config)
    }
}

fn require_env(name: &str) -> Result<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| KpiError::Config(format!("{name} environment variable required")))
}

fn optional_env(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn require_env_rejects_blank_values() {
        std::env::set_var("KPI_TEST_BLANK", "   ");
        assert!(matches!(
            require_env("KPI_TEST_BLANK"),
            Err(KpiError::Config(_))
        ));
        std::env::remove_var("KPI_TEST_BLANK");
    }

    #[test]
    fn optional_env_trims_values() {
        std::env::set_var("KPI_TEST_TRIM", "  value  ");
        assert_eq!(optional_env("KPI_TEST_TRIM").as_deref(), Some("value"));
        std::env::remove_var("KPI_TEST_TRIM");
    }
}
