//! Record normalizer: canonicalizes identifiers, period labels, and numeric
//! fields of one raw row. Failures are per-row and never pipeline-fatal; the
//! caller counts dropped rows.

use crate::constants::{
    self, COL_DISPLAY_NAME, COL_MONTH, COL_PERSON_ID, COL_PROJECT_NAME,
};
use crate::types::{CellValue, NormalizedRecord, Period, RawRow, SourceKind};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use std::fmt;

/// Why a raw row was dropped instead of normalized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    BadPersonId,
    BadPeriod,
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DropReason::BadPersonId => f.write_str("unrecognizable person id"),
            DropReason::BadPeriod => f.write_str("unrecognizable period"),
        }
    }
}

static SEPARATOR_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\s\-]+").unwrap());
static UNDERSCORE_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"_+").unwrap());
static PERSON_ID_FORMAT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^QAI_?([A-Z0-9]+)$").unwrap());

const MONTH_ABBREVIATIONS: [&str; 12] = [
    "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
];

/// Canonicalize a person identifier to the `QAI_<SUFFIX>` format.
///
/// Whitespace and hyphen runs become single underscores and the result is
/// uppercased; anything that does not carry the `QAI` prefix after cleanup
/// is not recognizable and yields `None`.
pub fn canonical_person_id(raw: &str) -> Option<String> {
    let cleaned = SEPARATOR_RUNS.replace_all(raw.trim(), "_").to_uppercase();
    let cleaned = UNDERSCORE_RUNS.replace_all(&cleaned, "_");
    let cleaned = cleaned.trim_matches('_');
    PERSON_ID_FORMAT
        .captures(cleaned)
        .map(|caps| format!("QAI_{}", &caps[1]))
}

/// Map a textual month to its canonical period.
///
/// Accepts full English names, three-letter abbreviations (prefix match, so
/// "Sept" and "sep." both work), and numeric 1-12.
pub fn parse_period(raw: &str) -> Option<Period> {
    let value = raw.trim().to_lowercase();
    if value.is_empty() {
        return None;
    }
    if let Ok(n) = value.parse::<u8>() {
        return Period::from_month(n);
    }
    MONTH_ABBREVIATIONS
        .iter()
        .position(|abbr| value.starts_with(abbr))
        .and_then(|idx| Period::from_month(idx as u8 + 1))
}

fn period_from_cell(cell: &CellValue) -> Option<Period> {
    match cell {
        CellValue::Text(s) => parse_period(s),
        CellValue::Number(n) if n.fract() == 0.0 => Period::from_month(*n as u8),
        _ => None,
    }
}

/// Look up a canonical column, falling back through the source's legacy
/// header aliases.
fn cell<'a>(row: &'a RawRow, source: SourceKind, column: &str) -> Option<&'a CellValue> {
    if let Some(value) = row.get(column) {
        return Some(value);
    }
    constants::header_aliases(source)
        .iter()
        .find(|(alias, canonical)| *canonical == column && row.contains_key(*alias))
        .and_then(|(alias, _)| row.get(*alias))
}

/// Produce zero or one normalized record from a raw row.
///
/// A row without a recognizable person id or period is dropped, not
/// defaulted. Metric cells that fail to parse are recorded as absent, never
/// as zero, so scoring can tell "no data" from a true zero.
pub fn normalize_row(
    row: &RawRow,
    source: SourceKind,
) -> std::result::Result<NormalizedRecord, DropReason> {
    let person_id = cell(row, source, COL_PERSON_ID)
        .and_then(CellValue::as_text)
        .and_then(canonical_person_id)
        .ok_or(DropReason::BadPersonId)?;

    let period = cell(row, source, COL_MONTH)
        .and_then(period_from_cell)
        .ok_or(DropReason::BadPeriod)?;

    let mut metrics = HashMap::new();
    for column in constants::metric_columns(source) {
        if let Some(value) = cell(row, source, column).and_then(CellValue::to_f64) {
            metrics.insert(*column, value);
        }
    }

    let display_name = match source {
        SourceKind::Lead => cell(row, source, COL_DISPLAY_NAME)
            .and_then(CellValue::as_text)
            .map(str::to_string),
        _ => None,
    };

    let project_name = match source {
        SourceKind::Contribution => cell(row, source, COL_PROJECT_NAME)
            .and_then(CellValue::as_text)
            .map(str::to_string),
        _ => None,
    };

    Ok(NormalizedRecord {
        person_id,
        period,
        display_name,
        project_name,
        metrics,
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{COL_ATTENDANCE, COL_PROJECT_HOUR, COL_QUALITY};

    fn text_row(pairs: &[(&str, &str)]) -> RawRow {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), CellValue::Text(v.to_string())))
            .collect()
    }

    #[test]
    fn person_ids_canonicalize_to_prefix_format() {
        assert_eq!(canonical_person_id(" qai 007 "), Some("QAI_007".into()));
        assert_eq!(canonical_person_id("QAI007"), Some("QAI_007".into()));
        assert_eq!(canonical_person_id("qai--42"), Some("QAI_42".into()));
        assert_eq!(canonical_person_id("QAI__A1"), Some("QAI_A1".into()));
    }

    #[test]
    fn person_ids_without_prefix_are_rejected() {
        assert_eq!(canonical_person_id("007"), None);
        assert_eq!(canonical_person_id("bob"), None);
        assert_eq!(canonical_person_id(""), None);
        assert_eq!(canonical_person_id("QAI_"), None);
    }

    #[test]
    fn periods_parse_from_names_abbreviations_and_numbers() {
        assert_eq!(parse_period("January"), Period::from_month(1));
        assert_eq!(parse_period("sep."), Period::from_month(9));
        assert_eq!(parse_period("Sept"), Period::from_month(9));
        assert_eq!(parse_period(" 12 "), Period::from_month(12));
        assert_eq!(parse_period("13"), None);
        assert_eq!(parse_period("sometime"), None);
    }

    #[test]
    fn rows_without_keys_are_dropped_with_reason() {
        let row = text_row(&[("QAI_ID", "nobody"), ("Month", "March")]);
        assert_eq!(
            normalize_row(&row, SourceKind::Lead).unwrap_err(),
            DropReason::BadPersonId
        );

        let row = text_row(&[("QAI_ID", "QAI_1"), ("Month", "never")]);
        assert_eq!(
            normalize_row(&row, SourceKind::Lead).unwrap_err(),
            DropReason::BadPeriod
        );
    }

    #[test]
    fn unparseable_metrics_are_absent_not_zero() {
        let row = text_row(&[
            ("QAI_ID", "QAI_1"),
            ("Month", "March"),
            (COL_QUALITY, "n/a"),
            ("Project Delivery Timeliness", ""),
        ]);
        let record = normalize_row(&row, SourceKind::Lead).unwrap();
        assert!(!record.metrics.contains_key(COL_QUALITY));
        assert!(record.metrics.is_empty());
    }

    #[test]
    fn thousands_separators_parse() {
        let row = text_row(&[
            ("QAI_ID", "QAI_1"),
            ("Month", "March"),
            (COL_QUALITY, "1,234.5"),
        ]);
        let record = normalize_row(&row, SourceKind::Lead).unwrap();
        assert_eq!(record.metrics.get(COL_QUALITY), Some(&1234.5));
    }

    #[test]
    fn attendance_header_aliases_resolve() {
        let row = text_row(&[
            ("ID", "QAI_9"),
            ("Month", "feb"),
            ("Attendance Score", "92"),
        ]);
        let record = normalize_row(&row, SourceKind::Attendance).unwrap();
        assert_eq!(record.person_id, "QAI_9");
        assert_eq!(record.metrics.get(COL_ATTENDANCE), Some(&92.0));
    }

    #[test]
    fn contribution_rows_carry_project_names() {
        let row = text_row(&[
            ("QAI_ID", "QAI_2"),
            ("Month", "4"),
            ("Project Batch", "Batch A"),
            ("SUM of Effective Work Hour", "12"),
        ]);
        let record = normalize_row(&row, SourceKind::Contribution).unwrap();
        assert_eq!(record.project_name.as_deref(), Some("Batch A"));
        assert_eq!(record.metrics.get(COL_PROJECT_HOUR), Some(&12.0));
    }
}
