//! Grouping and correctness partitioning of raw responses.
//!
//! Records are grouped by question id in first-seen order. Within a group,
//! responses are appended to `chosen` (correct) or `rejected` (incorrect) in
//! stream order; nothing is reordered, skipped, or deduplicated.

use indexmap::IndexMap;
use indexmap::map::Entry;
use tracing::info;

use crate::benchmarks::Domain;
use crate::data::{
    Correctness, NormalizedRecord, PromptText, QuestionId, RawResponseRecord, ResponseText,
    record_id,
};
use crate::errors::DatasetError;

/// Per-question accumulator.
#[derive(Debug)]
struct GroupAccumulator {
    prompt: PromptText,
    chosen: Vec<ResponseText>,
    rejected: Vec<ResponseText>,
}

/// Counters describing one benchmark's partition.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PartitionStats {
    /// Raw records consumed.
    pub raw_records: usize,
    /// Distinct question groups emitted.
    pub questions: usize,
    /// Responses placed in `chosen` lists.
    pub chosen: usize,
    /// Responses placed in `rejected` lists.
    pub rejected: usize,
}

/// Single-pass grouping state for one benchmark.
#[derive(Debug)]
pub struct CorrectnessGrouper {
    domain: Domain,
    groups: IndexMap<QuestionId, GroupAccumulator>,
    stats: PartitionStats,
}

impl CorrectnessGrouper {
    /// Fresh grouper for records of `domain`.
    pub fn new(domain: Domain) -> Self {
        Self {
            domain,
            groups: IndexMap::new(),
            stats: PartitionStats::default(),
        }
    }

    /// Add one raw record to its question group.
    ///
    /// Fails with a schema error when the record's prompt disagrees with the
    /// prompt already recorded for the same question id.
    pub fn push(&mut self, record: RawResponseRecord) -> Result<(), DatasetError> {
        let RawResponseRecord {
            question_id,
            prompt_text,
            response_text,
            correctness,
        } = record;

        let group = match self.groups.entry(question_id) {
            Entry::Occupied(entry) => {
                let group = entry.into_mut();
                if group.prompt != prompt_text {
                    return Err(DatasetError::Schema {
                        domain: self.domain.as_str().to_string(),
                        details: format!(
                            "question id carries two different prompts: {:?} vs {:?}",
                            truncate(&group.prompt),
                            truncate(&prompt_text)
                        ),
                    });
                }
                group
            }
            Entry::Vacant(entry) => entry.insert(GroupAccumulator {
                prompt: prompt_text,
                chosen: Vec::new(),
                rejected: Vec::new(),
            }),
        };

        match correctness {
            Correctness::Correct => {
                group.chosen.push(response_text);
                self.stats.chosen += 1;
            }
            Correctness::Incorrect => {
                group.rejected.push(response_text);
                self.stats.rejected += 1;
            }
        }
        self.stats.raw_records += 1;
        Ok(())
    }

    /// Number of distinct question groups seen so far.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// True if no record has been pushed.
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Counters for everything pushed so far.
    pub fn stats(&self) -> PartitionStats {
        PartitionStats {
            questions: self.groups.len(),
            ..self.stats
        }
    }

    /// Emit one normalized record per question, in first-seen order.
    pub fn finish(self) -> Vec<NormalizedRecord> {
        let domain = self.domain;
        self.groups
            .into_iter()
            .map(|(question_id, group)| NormalizedRecord {
                id: record_id(domain, &question_id),
                domain,
                prompt: group.prompt,
                chosen: group.chosen,
                rejected: group.rejected,
            })
            .collect()
    }
}

/// Normalized records and counters for one benchmark.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PartitionedBenchmark {
    /// Records in first-seen question order.
    pub records: Vec<NormalizedRecord>,
    /// Partition counters.
    pub stats: PartitionStats,
}

/// Consume a benchmark's raw record stream and partition it by correctness.
///
/// The first `Err` item, or the first prompt mismatch, aborts the benchmark.
pub fn partition_benchmark<I>(domain: Domain, records: I) -> Result<PartitionedBenchmark, DatasetError>
where
    I: IntoIterator<Item = Result<RawResponseRecord, DatasetError>>,
{
    let mut grouper = CorrectnessGrouper::new(domain);
    for record in records {
        grouper.push(record?)?;
    }
    let stats = grouper.stats();
    info!(
        "[ppe_corr:grouping] {} partitioned raw={} questions={} chosen={} rejected={}",
        domain, stats.raw_records, stats.questions, stats.chosen, stats.rejected
    );
    Ok(PartitionedBenchmark {
        records: grouper.finish(),
        stats,
    })
}

fn truncate(text: &str) -> String {
    const LIMIT: usize = 80;
    if text.chars().count() <= LIMIT {
        return text.to_string();
    }
    let mut out: String = text.chars().take(LIMIT).collect();
    out.push_str("...");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn raw(id: &str, prompt: &str, response: &str, score: i64) -> RawResponseRecord {
        RawResponseRecord::new(
            id,
            prompt,
            response,
            Correctness::from_score(score).unwrap(),
        )
    }

    fn ok_stream(
        records: Vec<RawResponseRecord>,
    ) -> impl Iterator<Item = Result<RawResponseRecord, DatasetError>> {
        records.into_iter().map(Ok)
    }

    #[test]
    fn two_responses_partition_into_chosen_and_rejected() {
        let out = partition_benchmark(
            Domain::Math,
            ok_stream(vec![raw("7", "2+2?", "4", 1), raw("7", "2+2?", "5", 0)]),
        )
        .unwrap();
        assert_eq!(
            out.records,
            vec![NormalizedRecord {
                id: "math_7".into(),
                domain: Domain::Math,
                prompt: "2+2?".into(),
                chosen: vec!["4".into()],
                rejected: vec!["5".into()],
            }]
        );
    }

    #[test]
    fn empty_stream_yields_no_records() {
        let out = partition_benchmark(Domain::Gpqa, ok_stream(Vec::new())).unwrap();
        assert!(out.records.is_empty());
        assert_eq!(out.stats, PartitionStats::default());
    }

    #[test]
    fn groups_are_emitted_in_first_seen_order_not_sorted() {
        let out = partition_benchmark(
            Domain::Ifeval,
            ok_stream(vec![
                raw("b", "pb", "1", 1),
                raw("a", "pa", "2", 0),
                raw("b", "pb", "3", 0),
                raw("c", "pc", "4", 1),
                raw("a", "pa", "5", 1),
            ]),
        )
        .unwrap();
        let ids: Vec<&str> = out.records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["ifeval_b", "ifeval_a", "ifeval_c"]);
        assert_eq!(out.records[1].chosen, vec!["5".to_string()]);
        assert_eq!(out.records[1].rejected, vec!["2".to_string()]);
    }

    #[test]
    fn order_is_preserved_and_duplicates_are_kept() {
        let out = partition_benchmark(
            Domain::MbppPlus,
            ok_stream(vec![
                raw("q", "p", "x", 1),
                raw("q", "p", "dup", 0),
                raw("q", "p", "y", 1),
                raw("q", "p", "dup", 0),
                raw("q", "p", "x", 1),
            ]),
        )
        .unwrap();
        let record = &out.records[0];
        assert_eq!(record.chosen, vec!["x", "y", "x"]);
        assert_eq!(record.rejected, vec!["dup", "dup"]);
    }

    #[test]
    fn single_label_groups_are_still_emitted() {
        let out = partition_benchmark(
            Domain::Math,
            ok_stream(vec![
                raw("wrong", "p1", "a", 0),
                raw("wrong", "p1", "b", 0),
                raw("right", "p2", "c", 1),
            ]),
        )
        .unwrap();
        assert_eq!(out.records.len(), 2);
        assert!(out.records[0].chosen.is_empty());
        assert_eq!(out.records[0].rejected.len(), 2);
        assert!(out.records[1].rejected.is_empty());
    }

    #[test]
    fn every_raw_record_lands_in_exactly_one_list() {
        let mut input = Vec::new();
        for q in 0..17 {
            for k in 0..(q % 5) {
                input.push(raw(
                    &q.to_string(),
                    &format!("prompt {q}"),
                    &format!("r{q}-{k}"),
                    ((q + k) % 2) as i64,
                ));
            }
        }
        let total = input.len();
        let out = partition_benchmark(Domain::MmluPro, ok_stream(input.clone())).unwrap();

        let emitted: usize = out.records.iter().map(NormalizedRecord::response_count).sum();
        assert_eq!(emitted, total);
        assert_eq!(out.stats.raw_records, total);
        assert_eq!(out.stats.chosen + out.stats.rejected, total);

        for item in &input {
            let record = out
                .records
                .iter()
                .find(|r| r.id == format!("mmlu_pro_{}", item.question_id))
                .unwrap();
            let (hit, miss) = match item.correctness {
                Correctness::Correct => (&record.chosen, &record.rejected),
                Correctness::Incorrect => (&record.rejected, &record.chosen),
            };
            assert!(hit.contains(&item.response_text));
            assert!(!miss.contains(&item.response_text));
        }

        let ids: HashSet<&str> = out.records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids.len(), out.records.len());
    }

    #[test]
    fn prompt_mismatch_aborts_with_schema_error() {
        let err = partition_benchmark(
            Domain::Math,
            ok_stream(vec![
                raw("7", "2+2?", "4", 1),
                raw("7", "2+3?", "5", 0),
                raw("8", "1+1?", "2", 1),
            ]),
        )
        .unwrap_err();
        match err {
            DatasetError::Schema { domain, details } => {
                assert_eq!(domain, "math");
                assert!(details.contains("2+3?"), "{details}");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn stream_errors_propagate() {
        let items = vec![
            Ok(raw("1", "p", "a", 1)),
            Err(DatasetError::Retrieval {
                domain: "gpqa".into(),
                reason: "timeout".into(),
            }),
        ];
        let err = partition_benchmark(Domain::Gpqa, items).unwrap_err();
        assert!(matches!(err, DatasetError::Retrieval { .. }));
    }

    #[test]
    fn grouper_tracks_counts_incrementally() {
        let mut grouper = CorrectnessGrouper::new(Domain::Math);
        assert!(grouper.is_empty());
        grouper.push(raw("1", "p", "a", 1)).unwrap();
        grouper.push(raw("2", "q", "b", 0)).unwrap();
        grouper.push(raw("1", "p", "c", 0)).unwrap();
        assert_eq!(grouper.len(), 2);
        assert_eq!(
            grouper.stats(),
            PartitionStats {
                raw_records: 3,
                questions: 2,
                chosen: 1,
                rejected: 2,
            }
        );
    }

    #[test]
    fn long_prompts_are_truncated_in_diagnostics() {
        let long = "x".repeat(200);
        let short = truncate(&long);
        assert_eq!(short.chars().count(), 83);
        assert!(short.ends_with("..."));
        assert_eq!(truncate("short"), "short");
    }
}
