use clap::{Parser, Subcommand, ValueEnum};
use tabled::{settings::Style, Table};
use tracing::{error, info};

use kpi_reporter::auth::provider_from_config;
use kpi_reporter::backends::{CsvDirectory, SheetsClient};
use kpi_reporter::config::Config;
use kpi_reporter::error::{KpiError, Result as KpiResult};
use kpi_reporter::logging;
use kpi_reporter::pipeline::Pipeline;
use kpi_reporter::storage::ReportSink;
use kpi_reporter::types::TabularSource;

#[derive(Parser)]
#[command(name = "kpi_reporter")]
#[command(about = "Monthly lead KPI report pipeline")]
#[command(version = "0.1.0")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Backend {
    /// Local CSV directories (one per source id)
    Csv,
    /// Hosted spreadsheet service
    Sheets,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full pipeline and overwrite the report sheets
    Run {
        #[arg(long, value_enum, default_value = "csv")]
        backend: Backend,
    },
    /// Compute the report and print it without writing anything
    Preview {
        #[arg(long, value_enum, default_value = "csv")]
        backend: Backend,
    },
}

enum BackendImpl {
    Csv(CsvDirectory),
    Sheets(SheetsClient),
}

impl BackendImpl {
    fn source(&self) -> &dyn TabularSource {
        match self {
            BackendImpl::Csv(b) => b,
            BackendImpl::Sheets(b) => b,
        }
    }

    fn sink(&self) -> &dyn ReportSink {
        match self {
            BackendImpl::Csv(b) => b,
            BackendImpl::Sheets(b) => b,
        }
    }
}

/// Credentials are resolved before any extraction so a bad token fails the
/// run up front rather than mid-pipeline.
fn build_backend(backend: Backend, config: &Config) -> KpiResult<BackendImpl> {
    match backend {
        Backend::Csv => Ok(BackendImpl::Csv(CsvDirectory::new(&config.data_dir))),
        Backend::Sheets => {
            let base_url = config.sheets_base_url.clone().ok_or_else(|| {
                KpiError::Config(
                    "SHEETS_BASE_URL environment variable required for the sheets backend".into(),
                )
            })?;
            let token = provider_from_config(config)?.access_token()?;
            Ok(BackendImpl::Sheets(SheetsClient::new(base_url, token)))
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    logging::init_logging();

    let cli = Cli::parse();

    let config = Config::from_env().map_err(|e| {
        error!("Configuration failed: {}", e);
        e
    })?;

    match cli.command {
        Commands::Run { backend } => {
            println!("🚀 Running KPI report pipeline...");
            let backend = build_backend(backend, &config).map_err(|e| {
                error!("Backend setup failed: {}", e);
                e
            })?;

            match Pipeline::run(&config, backend.source(), backend.sink()).await {
                Ok(summary) => {
                    info!("Pipeline finished");
                    println!("\n📊 KPI Report Summary (run {}):", summary.run_id);
                    println!(
                        "   Lead rows: {} ({} dropped)",
                        summary.lead_rows, summary.lead_dropped
                    );
                    println!(
                        "   Contribution rows: {} ({} dropped)",
                        summary.contribution_rows, summary.contribution_dropped
                    );
                    println!(
                        "   Attendance rows: {} ({} dropped)",
                        summary.attendance_rows, summary.attendance_dropped
                    );
                    println!("   People scored: {}", summary.joined_keys);
                    println!("   Report rows written: {}", summary.report_rows);
                    println!("   Duration: {:.2}s", summary.duration_secs);
                }
                Err(e) => {
                    error!("Pipeline failed: {}", e);
                    return Err(e.into());
                }
            }
        }
        Commands::Preview { backend } => {
            println!("🔍 Computing KPI report preview...");
            let backend = build_backend(backend, &config).map_err(|e| {
                error!("Backend setup failed: {}", e);
                e
            })?;

            match Pipeline::execute(&config, backend.source()).await {
                Ok(output) => {
                    if output.report.is_empty() {
                        println!("(no rows)");
                    } else {
                        let table = Table::new(&output.report).with(Style::markdown()).to_string();
                        println!("{table}");
                    }
                    println!(
                        "\n{} rows, {} dropped during normalization (nothing written)",
                        output.summary.report_rows,
                        output.summary.total_dropped()
                    );
                }
                Err(e) => {
                    error!("Preview failed: {}", e);
                    return Err(e.into());
                }
            }
        }
    }

    Ok(())
}
