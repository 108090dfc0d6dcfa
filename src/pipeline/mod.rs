//! Pipeline orchestration: extract all three sources, normalize, join,
//! score, aggregate, and hand the result to the report sink. Control flow is
//! strictly linear; row-level problems are absorbed and counted, while
//! source, sink, and configuration failures abort the run.

pub mod aggregate;
pub mod join;
pub mod normalize;
pub mod score;

use crate::config::Config;
use crate::constants::{
    ATTENDANCE_SHEET, FINAL_REPORT_SHEET, LEAD_SHEET, PROJECT_HOURS_SHEET, SCORE_BREAKDOWN_SHEET,
};
use crate::error::Result;
use crate::storage::ReportSink;
use crate::types::{NormalizedRecord, RawRow, SourceKind, TabularSource};
use aggregate::{BreakdownRow, ReportRow};
use chrono::{DateTime, Utc};
use metrics::{counter, histogram};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// Result of a complete pipeline run.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub run_id: String,
    pub lead_rows: usize,
    pub lead_dropped: usize,
    pub contribution_rows: usize,
    pub contribution_dropped: usize,
    pub attendance_rows: usize,
    pub attendance_dropped: usize,
    pub joined_keys: usize,
    pub report_rows: usize,
    pub started_at: DateTime<Utc>,
    pub duration_secs: f64,
}

impl RunSummary {
    pub fn total_dropped(&self) -> usize {
        self.lead_dropped + self.contribution_dropped + self.attendance_dropped
    }
}

/// Everything a run produces before (or instead of) the sink write.
pub struct PipelineOutput {
    pub report: Vec<ReportRow>,
    pub breakdown: Vec<BreakdownRow>,
    pub summary: RunSummary,
}

pub struct Pipeline;

impl Pipeline {
    /// Extract, normalize, join, score, and aggregate, without touching the
    /// sink. `preview` runs stop here.
    #[instrument(skip(config, source))]
    pub async fn execute(config: &Config, source: &dyn TabularSource) -> Result<PipelineOutput> {
        let run_id = Uuid::new_v4().to_string();
        let started_at = Utc::now();
        let timer = std::time::Instant::now();
        info!(run_id = %run_id, "Starting KPI pipeline run");
        counter!("kpi_pipeline_runs_total").increment(1);

        // Step 1: bulk-read the three sources. Any failure here is fatal
        // before anything is written.
        let lead_raw = source.read_table(&config.lead_sheet_id, LEAD_SHEET).await?;
        let attendance_raw = source
            .read_table(&config.lead_sheet_id, ATTENDANCE_SHEET)
            .await?;
        let contribution_raw = source
            .read_table(&config.pdr_sheet_id, PROJECT_HOURS_SHEET)
            .await?;
        info!(
            "Fetched {} lead, {} contribution, {} attendance rows",
            lead_raw.len(),
            contribution_raw.len(),
            attendance_raw.len()
        );

        // Step 2: per-row normalization; bad rows are dropped and counted.
        let (lead, lead_dropped) = normalize_all(&lead_raw, SourceKind::Lead);
        let (contribution, contribution_dropped) =
            normalize_all(&contribution_raw, SourceKind::Contribution);
        let (attendance, attendance_dropped) =
            normalize_all(&attendance_raw, SourceKind::Attendance);

        // Steps 3-5: join on (person, period), score, aggregate.
        let joined = join::join_sources(lead, contribution, attendance);
        let joined_keys = joined.len();
        debug!("Joined {} person-period keys", joined_keys);

        let scored = joined.into_values().map(score::score_record).collect();
        let (report, breakdown) = aggregate::build_report(scored);

        let duration_secs = timer.elapsed().as_secs_f64();
        histogram!("kpi_pipeline_duration_seconds").record(duration_secs);

        let summary = RunSummary {
            run_id,
            lead_rows: lead_raw.len(),
            lead_dropped,
            contribution_rows: contribution_raw.len(),
            contribution_dropped,
            attendance_rows: attendance_raw.len(),
            attendance_dropped,
            joined_keys,
            report_rows: report.len(),
            started_at,
            duration_secs,
        };

        Ok(PipelineOutput {
            report,
            breakdown,
            summary,
        })
    }

    /// Run the complete pipeline and overwrite the report sheets.
    #[instrument(skip(config, source, sink))]
    pub async fn run(
        config: &Config,
        source: &dyn TabularSource,
        sink: &dyn ReportSink,
    ) -> Result<RunSummary> {
        let output = Self::execute(config, source).await?;

        // Step 6: load. Each sheet is fully replaced so reruns overwrite
        // rather than append.
        let report_cells: Vec<Vec<String>> = output.report.iter().map(ReportRow::cells).collect();
        sink.write_table(
            &config.report_sheet_id,
            FINAL_REPORT_SHEET,
            &ReportRow::header(),
            &report_cells,
        )
        .await?;

        let breakdown_cells: Vec<Vec<String>> =
            output.breakdown.iter().map(BreakdownRow::cells).collect();
        sink.write_table(
            &config.report_sheet_id,
            SCORE_BREAKDOWN_SHEET,
            &BreakdownRow::header(),
            &breakdown_cells,
        )
        .await?;

        info!(
            run_id = %output.summary.run_id,
            "Wrote {} report rows ({} rows dropped during normalization)",
            output.summary.report_rows,
            output.summary.total_dropped()
        );
        Ok(output.summary)
    }
}

fn normalize_all(rows: &[RawRow], source: SourceKind) -> (Vec<NormalizedRecord>, usize) {
    let mut records = Vec::with_capacity(rows.len());
    let mut dropped = 0usize;

    for row in rows {
        match normalize::normalize_row(row, source) {
            Ok(record) => records.push(record),
            Err(reason) => {
                dropped += 1;
                debug!("Dropping {} row: {}", source, reason);
            }
        }
    }

    if dropped > 0 {
        warn!("{} {} rows dropped during normalization", dropped, source);
    }
    counter!("kpi_rows_read_total", "source" => source.as_str()).increment(rows.len() as u64);
    counter!("kpi_rows_dropped_total", "source" => source.as_str()).increment(dropped as u64);

    (records, dropped)
}
