//! Report aggregator: collapses scored records into the ordered report rows
//! written to the sink. Ordering is deterministic so repeated runs produce
//! diff-friendly, byte-identical output.

use crate::constants::PROJECT_DELIMITER;
use crate::pipeline::score::{Dimension, ScoredRecord};
use serde::Serialize;
use std::collections::HashSet;
use tabled::Tabled;

/// One row of the final report sheet, one per (period, person).
#[derive(Debug, Clone, PartialEq, Serialize, Tabled)]
pub struct ReportRow {
    #[serde(rename = "Month")]
    #[tabled(rename = "Month")]
    pub period: String,
    #[serde(rename = "QAI_ID")]
    #[tabled(rename = "QAI_ID")]
    pub person_id: String,
    #[serde(rename = "Lead")]
    #[tabled(rename = "Lead")]
    pub display_name: String,
    #[serde(rename = "Projects")]
    #[tabled(rename = "Projects")]
    pub projects: String,
    #[serde(rename = "Project Count")]
    #[tabled(rename = "Project Count")]
    pub project_count: usize,
    #[serde(rename = "Final KPI Score")]
    #[tabled(rename = "Final KPI Score")]
    pub final_score: String,
}

impl ReportRow {
    pub fn header() -> Vec<String> {
        [
            "Month",
            "QAI_ID",
            "Lead",
            "Projects",
            "Project Count",
            "Final KPI Score",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect()
    }

    pub fn cells(&self) -> Vec<String> {
        vec![
            self.period.clone(),
            self.person_id.clone(),
            self.display_name.clone(),
            self.projects.clone(),
            self.project_count.to_string(),
            self.final_score.clone(),
        ]
    }
}

/// Per-dimension sub-scores for one (period, person); an empty cell marks a
/// dimension that was never evaluated, as opposed to one scored zero.
#[derive(Debug, Clone, PartialEq)]
pub struct BreakdownRow {
    pub period: String,
    pub person_id: String,
    pub components: Vec<Option<f64>>,
}

impl BreakdownRow {
    pub fn header() -> Vec<String> {
        let mut header = vec!["Month".to_string(), "QAI_ID".to_string()];
        header.extend(Dimension::ALL.iter().map(|d| d.label().to_string()));
        header
    }

    pub fn cells(&self) -> Vec<String> {
        let mut cells = vec![self.period.clone(), self.person_id.clone()];
        cells.extend(self.components.iter().map(|component| match component {
            Some(value) => format!("{value:.4}"),
            None => String::new(),
        }));
        cells
    }
}

/// Order scored records and shape them into report and breakdown rows.
///
/// Primary order is the period (chronological), secondary the display name
/// (lexicographic, falling back to the person id for people the lead sheet
/// never named), with the person id as the final tie-break.
pub fn build_report(mut scored: Vec<ScoredRecord>) -> (Vec<ReportRow>, Vec<BreakdownRow>) {
    scored.sort_by(|a, b| {
        let a_name = display_name(a);
        let b_name = display_name(b);
        a.joined
            .period
            .cmp(&b.joined.period)
            .then_with(|| a_name.cmp(b_name))
            .then_with(|| a.joined.person_id.cmp(&b.joined.person_id))
    });

    let mut report_rows = Vec::with_capacity(scored.len());
    let mut breakdown_rows = Vec::with_capacity(scored.len());

    for record in &scored {
        let distinct: HashSet<&str> = record
            .joined
            .project_names
            .iter()
            .map(String::as_str)
            .collect();

        report_rows.push(ReportRow {
            period: record.joined.period.to_string(),
            person_id: record.joined.person_id.clone(),
            display_name: display_name(record).to_string(),
            projects: record.joined.project_names.join(PROJECT_DELIMITER),
            project_count: distinct.len(),
            final_score: format!("{:.2}", record.final_score),
        });

        breakdown_rows.push(BreakdownRow {
            period: record.joined.period.to_string(),
            person_id: record.joined.person_id.clone(),
            components: Dimension::ALL
                .iter()
                .map(|d| record.component_scores.get(d).copied())
                .collect(),
        });
    }

    (report_rows, breakdown_rows)
}

fn display_name(record: &ScoredRecord) -> &str {
    record
        .joined
        .display_name
        .as_deref()
        .unwrap_or(&record.joined.person_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::score::score_record;
    use crate::types::{JoinedRecord, Period};

    fn scored(person: &str, month: u8, name: Option<&str>, projects: &[&str]) -> ScoredRecord {
        let mut joined = JoinedRecord::new(person.to_string(), Period::from_month(month).unwrap());
        joined.display_name = name.map(str::to_string);
        joined.project_names = projects.iter().map(|p| p.to_string()).collect();
        score_record(joined)
    }

    #[test]
    fn rows_order_by_period_then_display_name() {
        let records = vec![
            scored("QAI_3", 2, Some("Zoe"), &[]),
            scored("QAI_1", 2, Some("Avery"), &[]),
            scored("QAI_2", 1, Some("Morgan"), &[]),
        ];

        let (rows, _) = build_report(records);
        let order: Vec<(&str, &str)> = rows
            .iter()
            .map(|r| (r.period.as_str(), r.display_name.as_str()))
            .collect();
        assert_eq!(
            order,
            vec![
                ("January", "Morgan"),
                ("February", "Avery"),
                ("February", "Zoe"),
            ]
        );
    }

    #[test]
    fn ordering_is_stable_under_input_permutation() {
        let forward = vec![
            scored("QAI_1", 1, Some("Avery"), &[]),
            scored("QAI_2", 1, Some("Morgan"), &[]),
            scored("QAI_3", 3, None, &[]),
        ];
        let mut reversed = forward.clone();
        reversed.reverse();

        let (rows_a, _) = build_report(forward);
        let (rows_b, _) = build_report(reversed);
        assert_eq!(rows_a, rows_b);
    }

    #[test]
    fn project_list_keeps_duplicates_but_count_is_distinct() {
        let records = vec![scored(
            "QAI_1",
            1,
            None,
            &["Alpha", "Beta", "Alpha"],
        )];

        let (rows, _) = build_report(records);
        assert_eq!(rows[0].projects, "Alpha, Beta, Alpha");
        assert_eq!(rows[0].project_count, 2);
    }

    #[test]
    fn unnamed_people_fall_back_to_person_id() {
        let (rows, _) = build_report(vec![scored("QAI_7", 1, None, &[])]);
        assert_eq!(rows[0].display_name, "QAI_7");
    }

    #[test]
    fn scores_format_to_two_decimals() {
        let (rows, _) = build_report(vec![scored("QAI_1", 1, None, &[])]);
        assert_eq!(rows[0].final_score, "0.00");
    }

    #[test]
    fn breakdown_marks_unevaluated_dimensions_with_empty_cells() {
        let (_, breakdown) = build_report(vec![scored("QAI_1", 1, None, &[])]);
        assert_eq!(breakdown[0].cells().len(), 10);
        assert!(breakdown[0].cells()[2..].iter().all(String::is_empty));
    }
}
