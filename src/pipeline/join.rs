//! Multi-source joiner: outer union of normalized records over the
//! (person, period) key. A key present in any source yields a joined record;
//! sources without a matching row stay absent rather than defaulting.

use crate::constants::{COL_PDR, COL_PROJECT_HOUR};
use crate::types::{ContributionStats, JoinedRecord, NormalizedRecord, Period, SourceKind};
use std::collections::HashMap;

/// Per-metric running mean, so duplicate lead/attendance rows for one key
/// average instead of clobbering each other.
#[derive(Debug, Default)]
struct MeanAccumulator {
    sums: HashMap<&'static str, (f64, u32)>,
}

impl MeanAccumulator {
    fn add(&mut self, metrics: &HashMap<&'static str, f64>) {
        for (name, value) in metrics {
            let entry = self.sums.entry(name).or_insert((0.0, 0));
            entry.0 += value;
            entry.1 += 1;
        }
    }

    fn finish(self) -> HashMap<&'static str, f64> {
        self.sums
            .into_iter()
            .map(|(name, (sum, count))| (name, sum / f64::from(count)))
            .collect()
    }
}

#[derive(Debug, Default)]
struct JoinAccumulator {
    display_name: Option<String>,
    lead: Option<MeanAccumulator>,
    contribution: Option<ContributionStats>,
    attendance: Option<MeanAccumulator>,
    project_names: Vec<String>,
}

impl JoinAccumulator {
    fn absorb(&mut self, record: NormalizedRecord) {
        match record.source {
            SourceKind::Lead => {
                if self.display_name.is_none() {
                    self.display_name = record.display_name;
                }
                self.lead
                    .get_or_insert_with(MeanAccumulator::default)
                    .add(&record.metrics);
            }
            SourceKind::Attendance => {
                self.attendance
                    .get_or_insert_with(MeanAccumulator::default)
                    .add(&record.metrics);
            }
            SourceKind::Contribution => {
                let stats = self.contribution.get_or_insert_with(ContributionStats::default);
                let hours = record.metrics.get(COL_PROJECT_HOUR).copied();
                let rating = record.metrics.get(COL_PDR).copied();
                if let Some(h) = hours {
                    stats.hours_total += h;
                }
                if let Some(r) = rating {
                    stats.rating_sum += r;
                    stats.rating_count += 1;
                    if let Some(h) = hours {
                        stats.rating_hours += r * h;
                        stats.rated_hours += h;
                    }
                }
                if let Some(name) = record.project_name {
                    // First-seen order, duplicates preserved; project_count
                    // dedupes later in the aggregator.
                    self.project_names.push(name);
                }
            }
        }
    }

    fn finish(self, person_id: String, period: Period) -> JoinedRecord {
        JoinedRecord {
            person_id,
            period,
            display_name: self.display_name,
            lead: self.lead.map(MeanAccumulator::finish),
            contribution: self.contribution,
            attendance: self.attendance.map(MeanAccumulator::finish),
            project_names: self.project_names,
        }
    }
}

/// Merge the three normalized collections into one joined record per key.
///
/// The resulting map has no ordering guarantee; the aggregator imposes the
/// final order.
pub fn join_sources(
    lead: Vec<NormalizedRecord>,
    contribution: Vec<NormalizedRecord>,
    attendance: Vec<NormalizedRecord>,
) -> HashMap<(String, Period), JoinedRecord> {
    let mut accumulators: HashMap<(String, Period), JoinAccumulator> = HashMap::new();

    for record in lead.into_iter().chain(contribution).chain(attendance) {
        let key = (record.person_id.clone(), record.period);
        accumulators.entry(key).or_default().absorb(record);
    }

    accumulators
        .into_iter()
        .map(|((person_id, period), acc)| {
            let joined = acc.finish(person_id.clone(), period);
            ((person_id, period), joined)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{COL_ATTENDANCE, COL_QUALITY};

    fn record(
        person: &str,
        month: u8,
        source: SourceKind,
        metrics: &[(&'static str, f64)],
    ) -> NormalizedRecord {
        NormalizedRecord {
            person_id: person.to_string(),
            period: Period::from_month(month).unwrap(),
            display_name: None,
            project_name: None,
            metrics: metrics.iter().copied().collect(),
            source,
        }
    }

    #[test]
    fn outer_union_keeps_keys_from_every_source() {
        let lead = vec![record("QAI_1", 1, SourceKind::Lead, &[(COL_QUALITY, 90.0)])];
        let attendance = vec![record(
            "QAI_2",
            1,
            SourceKind::Attendance,
            &[(COL_ATTENDANCE, 80.0)],
        )];

        let joined = join_sources(lead, vec![], attendance);

        assert_eq!(joined.len(), 2);
        let only_lead = &joined[&("QAI_1".to_string(), Period::from_month(1).unwrap())];
        assert!(only_lead.lead.is_some());
        assert!(only_lead.attendance.is_none());
        assert!(only_lead.contribution.is_none());
    }

    #[test]
    fn duplicate_lead_rows_average_per_metric() {
        let lead = vec![
            record("QAI_1", 1, SourceKind::Lead, &[(COL_QUALITY, 80.0)]),
            record("QAI_1", 1, SourceKind::Lead, &[(COL_QUALITY, 100.0)]),
            // A row missing the metric must not drag the mean down.
            record("QAI_1", 1, SourceKind::Lead, &[]),
        ];

        let joined = join_sources(lead, vec![], vec![]);
        let rec = &joined[&("QAI_1".to_string(), Period::from_month(1).unwrap())];
        assert_eq!(rec.lead.as_ref().unwrap()[COL_QUALITY], 90.0);
    }

    #[test]
    fn contribution_rows_fold_hours_and_names_in_order() {
        let mut first = record(
            "QAI_1",
            2,
            SourceKind::Contribution,
            &[(COL_PROJECT_HOUR, 30.0), (COL_PDR, 4.0)],
        );
        first.project_name = Some("Alpha".to_string());
        let mut second = record(
            "QAI_1",
            2,
            SourceKind::Contribution,
            &[(COL_PROJECT_HOUR, 10.0), (COL_PDR, 2.0)],
        );
        second.project_name = Some("Beta".to_string());
        let mut repeat = record("QAI_1", 2, SourceKind::Contribution, &[]);
        repeat.project_name = Some("Alpha".to_string());

        let joined = join_sources(vec![], vec![first, second, repeat], vec![]);
        let rec = &joined[&("QAI_1".to_string(), Period::from_month(2).unwrap())];
        let stats = rec.contribution.as_ref().unwrap();

        assert_eq!(rec.project_names, vec!["Alpha", "Beta", "Alpha"]);
        assert_eq!(stats.hours_total, 40.0);
        // (4*30 + 2*10) / 40 = 3.5
        assert_eq!(stats.weighted_rating(), Some(3.5));
    }

    #[test]
    fn zero_hour_ratings_fall_back_to_plain_mean() {
        let contribution = vec![
            record("QAI_1", 3, SourceKind::Contribution, &[(COL_PDR, 4.0)]),
            record("QAI_1", 3, SourceKind::Contribution, &[(COL_PDR, 2.0)]),
        ];

        let joined = join_sources(vec![], contribution, vec![]);
        let rec = &joined[&("QAI_1".to_string(), Period::from_month(3).unwrap())];
        assert_eq!(rec.contribution.as_ref().unwrap().weighted_rating(), Some(3.0));
    }

    #[test]
    fn display_name_comes_from_first_named_lead_row() {
        let mut anonymous = record("QAI_1", 1, SourceKind::Lead, &[]);
        anonymous.display_name = None;
        let mut named = record("QAI_1", 1, SourceKind::Lead, &[]);
        named.display_name = Some("Avery".to_string());

        let joined = join_sources(vec![anonymous, named], vec![], vec![]);
        let rec = &joined[&("QAI_1".to_string(), Period::from_month(1).unwrap())];
        assert_eq!(rec.display_name.as_deref(), Some("Avery"));
    }
}
