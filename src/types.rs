use crate::error::Result;
use std::collections::HashMap;
use std::fmt;

/// One loosely-typed spreadsheet cell as returned by a tabular backend.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Number(f64),
    Empty,
}

impl CellValue {
    /// Text content of the cell, trimmed. `None` for empty cells.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => {
                let s = s.trim();
                if s.is_empty() {
                    None
                } else {
                    Some(s)
                }
            }
            CellValue::Number(_) | CellValue::Empty => None,
        }
    }

    /// Coerce the cell to a float. Text cells tolerate surrounding whitespace
    /// and thousands separators but reject anything containing letters, so
    /// `"1,234.5"` parses and `"n/a"` does not. Returns `None` rather than
    /// zero for anything unparseable.
    pub fn to_f64(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            CellValue::Empty => None,
            CellValue::Text(s) => {
                let s = s.trim();
                if s.is_empty() || s.chars().any(|c| c.is_ascii_alphabetic()) {
                    return None;
                }
                s.replace(',', "").parse::<f64>().ok()
            }
        }
    }
}

/// Raw row from a source table: column header -> cell value. May be malformed.
pub type RawRow = HashMap<String, CellValue>;

/// Which of the three input tables a record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    Lead,
    Contribution,
    Attendance,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Lead => "lead",
            SourceKind::Contribution => "contribution",
            SourceKind::Attendance => "attendance",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical calendar-month reporting bucket.
///
/// Periods order chronologically (January first) and display as the full
/// English month name, which is also the spelling written to the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Period(u8);

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

impl Period {
    /// Build from a 1-based month number.
    pub fn from_month(month: u8) -> Option<Period> {
        if (1..=12).contains(&month) {
            Some(Period(month))
        } else {
            None
        }
    }

    pub fn month(&self) -> u8 {
        self.0
    }

    pub fn name(&self) -> &'static str {
        MONTH_NAMES[(self.0 - 1) as usize]
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Canonical unit after cleaning one raw row.
///
/// `person_id` and `period` are never empty; a row that cannot produce both
/// is dropped by the normalizer, not defaulted. A metric that is missing or
/// unparseable is absent from `metrics` so scoring can tell "no data" from a
/// true zero.
#[derive(Debug, Clone)]
pub struct NormalizedRecord {
    pub person_id: String,
    pub period: Period,
    /// Person's display name; carried by the lead sheet only.
    pub display_name: Option<String>,
    /// Project the row refers to; carried by the contribution sheet only.
    pub project_name: Option<String>,
    pub metrics: HashMap<&'static str, f64>,
    pub source: SourceKind,
}

/// Sufficient statistics folded from all contribution rows for one key.
///
/// `rating_hours` accumulates rating x hours over rows where both are
/// present; `rated_hours` is the matching hours denominator. Rows missing
/// either value fall back to the plain `rating_sum` / `rating_count` mean.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContributionStats {
    pub hours_total: f64,
    pub rated_hours: f64,
    pub rating_hours: f64,
    pub rating_sum: f64,
    pub rating_count: u32,
}

impl ContributionStats {
    /// Hour-weighted mean rating on the 0-5 input scale, or `None` when no
    /// rating was ever recorded for the key. Hours weight projects within a
    /// person, so a person's big projects dominate their small ones.
    pub fn weighted_rating(&self) -> Option<f64> {
        if self.rating_count == 0 {
            return None;
        }
        if self.rated_hours > 0.0 {
            Some(self.rating_hours / self.rated_hours)
        } else {
            Some(self.rating_sum / f64::from(self.rating_count))
        }
    }
}

/// One person-period combination with data contributed from 0-3 sources.
///
/// Exists for every key present in at least one source; a person missing
/// from a source still gets a partial score rather than being dropped.
#[derive(Debug, Clone)]
pub struct JoinedRecord {
    pub person_id: String,
    pub period: Period,
    pub display_name: Option<String>,
    pub lead: Option<HashMap<&'static str, f64>>,
    pub contribution: Option<ContributionStats>,
    pub attendance: Option<HashMap<&'static str, f64>>,
    /// Project names in first-seen order; duplicates preserved.
    pub project_names: Vec<String>,
}

impl JoinedRecord {
    pub fn new(person_id: String, period: Period) -> Self {
        JoinedRecord {
            person_id,
            period,
            display_name: None,
            lead: None,
            contribution: None,
            attendance: None,
            project_names: Vec::new(),
        }
    }
}

/// Abstract bulk reader over a remote tabular store.
///
/// Implementations must return stable, trimmed column headers. A missing or
/// unreadable sheet is fatal to the run (`KpiError::SourceUnavailable`).
#[async_trait::async_trait]
pub trait TabularSource: Send + Sync {
    async fn read_table(&self, source_id: &str, sheet_name: &str) -> Result<Vec<RawRow>>;
}
