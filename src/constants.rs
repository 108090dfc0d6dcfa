//! Sheet and column name constants to ensure consistency across the codebase.
//! These constants define the canonical headers the pipeline understands and
//! the worksheet names used by the source spreadsheets and the report output.

use crate::types::SourceKind;

// Worksheet names on the source side. The attendance worksheet lives in the
// same spreadsheet as the lead worksheet.
pub const LEAD_SHEET: &str = "Lead";
pub const ATTENDANCE_SHEET: &str = "Attendance";
pub const PROJECT_HOURS_SHEET: &str = "Project_Hours";

// Worksheet names on the report side.
pub const FINAL_REPORT_SHEET: &str = "Final_Report";
pub const SCORE_BREAKDOWN_SHEET: &str = "Score_Breakdown";

// Key columns shared by all three sources.
pub const COL_PERSON_ID: &str = "QAI_ID";
pub const COL_MONTH: &str = "Month";

// Lead worksheet columns.
pub const COL_DISPLAY_NAME: &str = "Lead";
pub const COL_QUALITY: &str = "Quality Score (RCA)";
pub const COL_TIMELINESS: &str = "Project Delivery Timeliness";
pub const COL_DOCUMENTATION: &str = "Documentation & Reporting";
pub const COL_COMMUNICATION: &str = "Communication Efficiency";
pub const COL_DISCIPLINE: &str = "Discipline & Punctuality";

// Project hours worksheet columns.
pub const COL_PROJECT_NAME: &str = "Project name";
pub const COL_PROJECT_HOUR: &str = "Project Hour";
pub const COL_PDR: &str = "PDR";

// Attendance worksheet columns.
pub const COL_ATTENDANCE: &str = "Score";
pub const COL_TRAINING: &str = "Training and assessment performance";

/// Delimiter used when concatenating project names into one report cell.
pub const PROJECT_DELIMITER: &str = ", ";

/// Legacy header spellings, mapped to the canonical column they stand for.
/// The source spreadsheets predate this pipeline and renamed columns over
/// time; lookups fall back through these aliases.
pub fn header_aliases(source: SourceKind) -> &'static [(&'static str, &'static str)] {
    match source {
        SourceKind::Lead => &[],
        SourceKind::Contribution => &[
            ("Project Batch", COL_PROJECT_NAME),
            ("SUM of Effective Work Hour", COL_PROJECT_HOUR),
        ],
        SourceKind::Attendance => &[
            ("ID", COL_PERSON_ID),
            ("Attendance Score", COL_ATTENDANCE),
        ],
    }
}

/// Metric columns coerced to numbers for each source.
pub fn metric_columns(source: SourceKind) -> &'static [&'static str] {
    match source {
        SourceKind::Lead => &[
            COL_QUALITY,
            COL_TIMELINESS,
            COL_DOCUMENTATION,
            COL_COMMUNICATION,
            COL_DISCIPLINE,
        ],
        SourceKind::Contribution => &[COL_PROJECT_HOUR, COL_PDR],
        SourceKind::Attendance => &[COL_ATTENDANCE, COL_TRAINING],
    }
}
