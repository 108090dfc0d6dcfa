//! KPI scoring engine: maps one joined record to the fixed 8-dimension
//! weighted score on the 5.00-point scale.

use crate::constants::{
    COL_ATTENDANCE, COL_COMMUNICATION, COL_DISCIPLINE, COL_DOCUMENTATION, COL_QUALITY,
    COL_TIMELINESS, COL_TRAINING,
};
use crate::types::JoinedRecord;
use std::collections::BTreeMap;

/// Top of the reporting scale.
pub const SCALE_MAX: f64 = 5.0;

/// The eight fixed KPI dimensions. Ordering here is the column order of the
/// breakdown sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Dimension {
    Quality,
    Timeliness,
    Documentation,
    Communication,
    Discipline,
    Contribution,
    Attendance,
    Training,
}

impl Dimension {
    pub const ALL: [Dimension; 8] = [
        Dimension::Quality,
        Dimension::Timeliness,
        Dimension::Documentation,
        Dimension::Communication,
        Dimension::Discipline,
        Dimension::Contribution,
        Dimension::Attendance,
        Dimension::Training,
    ];

    /// Fixed weight; the eight weights sum to 1.0.
    pub fn weight(self) -> f64 {
        match self {
            Dimension::Quality => 0.20,
            Dimension::Timeliness => 0.10,
            Dimension::Documentation => 0.10,
            Dimension::Communication => 0.10,
            Dimension::Discipline => 0.075,
            Dimension::Contribution => 0.15,
            Dimension::Attendance => 0.075,
            Dimension::Training => 0.20,
        }
    }

    /// Column header used for this dimension in the breakdown sheet.
    pub fn label(self) -> &'static str {
        match self {
            Dimension::Quality => "Quality (RCA)",
            Dimension::Timeliness => "Project Timeliness",
            Dimension::Documentation => "Documentation & Reporting",
            Dimension::Communication => "Communication Efficiency",
            Dimension::Discipline => "Discipline & Punctuality",
            Dimension::Contribution => "Contribution",
            Dimension::Attendance => "Attendance",
            Dimension::Training => "Training & Assessment",
        }
    }
}

/// A joined record plus its component sub-scores and final weighted score.
///
/// Created once per run and immutable thereafter. A dimension whose
/// underlying metric was missing has no entry in `component_scores`, which
/// is how reporting tells "scored 0" from "not evaluated".
#[derive(Debug, Clone)]
pub struct ScoredRecord {
    pub joined: JoinedRecord,
    pub component_scores: BTreeMap<Dimension, f64>,
    pub final_score: f64,
}

fn clamp01(value: f64) -> f64 {
    value.clamp(0.0, 1.0)
}

/// Raw metric for one dimension, normalized to [0,1] with the source's fixed
/// scale-down rule: lead and attendance metrics arrive on 0-100, contribution
/// ratings on 0-5.
fn component(record: &JoinedRecord, dimension: Dimension) -> Option<f64> {
    let lead = |column: &str| {
        record
            .lead
            .as_ref()
            .and_then(|m| m.get(column))
            .map(|v| clamp01(v / 100.0))
    };
    let attendance = |column: &str| {
        record
            .attendance
            .as_ref()
            .and_then(|m| m.get(column))
            .map(|v| clamp01(v / 100.0))
    };

    match dimension {
        Dimension::Quality => lead(COL_QUALITY),
        Dimension::Timeliness => lead(COL_TIMELINESS),
        Dimension::Documentation => lead(COL_DOCUMENTATION),
        Dimension::Communication => lead(COL_COMMUNICATION),
        Dimension::Discipline => lead(COL_DISCIPLINE),
        Dimension::Contribution => record
            .contribution
            .as_ref()
            .and_then(|stats| stats.weighted_rating())
            .map(|rating| clamp01(rating / SCALE_MAX)),
        Dimension::Attendance => attendance(COL_ATTENDANCE),
        Dimension::Training => attendance(COL_TRAINING),
    }
}

/// Score one joined record.
///
/// Missing dimensions contribute zero to the weighted sum without
/// re-normalizing the remaining weights: absence is penalized, not ignored.
pub fn score_record(record: JoinedRecord) -> ScoredRecord {
    let mut component_scores = BTreeMap::new();
    let mut weighted_sum = 0.0;

    for dimension in Dimension::ALL {
        if let Some(value) = component(&record, dimension) {
            component_scores.insert(dimension, value);
            weighted_sum += value * dimension.weight();
        }
    }

    let final_score = (weighted_sum * SCALE_MAX).clamp(0.0, SCALE_MAX);

    ScoredRecord {
        joined: record,
        component_scores,
        final_score,
    }
}
