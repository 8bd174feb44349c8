use indexmap::IndexMap;
use tracing::{debug, error, info, warn};

use crate::benchmarks::{BenchmarkSpec, Domain};
use crate::config::{CollectorConfig, FailurePolicy};
use crate::constants::benchmarks::{PROMPTS_PER_BENCHMARK, RESPONSES_PER_PROMPT};
use crate::data::NormalizedRecord;
use crate::errors::DatasetError;
use crate::grouping::{PartitionedBenchmark, partition_benchmark};
use crate::source::BenchmarkSource;

/// A benchmark that failed under `FailurePolicy::Skip`.
#[derive(Debug)]
pub struct BenchmarkFailure {
    /// Domain of the failed benchmark.
    pub domain: Domain,
    /// Error that ended its processing.
    pub error: DatasetError,
}

/// Concatenated output of a collector run.
#[derive(Debug, Default)]
pub struct Collection {
    /// Records of every successful benchmark, benchmark by benchmark.
    pub records: Vec<NormalizedRecord>,
    /// Records emitted per successful domain, in processing order.
    pub counts: IndexMap<Domain, usize>,
    /// Benchmarks skipped after a failure.
    pub failures: Vec<BenchmarkFailure>,
}

impl Collection {
    /// Total number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True if no record was collected.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Drives the grouping engine over a fixed, ordered list of benchmarks.
pub struct UnifiedCollector<S> {
    source: S,
    config: CollectorConfig,
}

impl<S: BenchmarkSource> UnifiedCollector<S> {
    /// Build a collector reading from `source`.
    pub fn new(source: S, config: CollectorConfig) -> Self {
        Self { source, config }
    }

    /// Active configuration.
    pub fn config(&self) -> &CollectorConfig {
        &self.config
    }

    /// Process `benchmarks` in order and concatenate their records.
    ///
    /// Under `FailurePolicy::Abort` the first failure is returned and nothing
    /// is kept; under `FailurePolicy::Skip` the failing domain is left out and
    /// recorded in `Collection::failures`.
    pub fn collect(&self, benchmarks: &[BenchmarkSpec]) -> Result<Collection, DatasetError> {
        let mut collection = Collection::default();
        for (ordinal, benchmark) in benchmarks.iter().enumerate() {
            info!(
                "[ppe_corr:collect] loading {} ({}/{}) split='{}'",
                benchmark.name,
                ordinal + 1,
                benchmarks.len(),
                self.config.split
            );
            match self.process(benchmark) {
                Ok(partitioned) => {
                    let count = partitioned.records.len();
                    collection.counts.insert(benchmark.domain, count);
                    collection.records.extend(partitioned.records);
                    info!(
                        "[ppe_corr:collect] processed {count} prompts from {}",
                        benchmark.name
                    );
                }
                Err(err) => match self.config.failure_policy {
                    FailurePolicy::Abort => {
                        error!(
                            "[ppe_corr:collect] {} failed, aborting run: {err}",
                            benchmark.name
                        );
                        return Err(err);
                    }
                    FailurePolicy::Skip => {
                        warn!(
                            "[ppe_corr:collect] {} failed, skipping domain '{}': {err}",
                            benchmark.name, benchmark.domain
                        );
                        collection.failures.push(BenchmarkFailure {
                            domain: benchmark.domain,
                            error: err,
                        });
                    }
                },
            }
        }
        Ok(collection)
    }

    fn process(&self, benchmark: &BenchmarkSpec) -> Result<PartitionedBenchmark, DatasetError> {
        let stream = self.source.open(benchmark, &self.config.split)?;
        let partitioned = partition_benchmark(benchmark.domain, stream)?;
        let questions = partitioned.records.len();

        match self.config.expected_questions {
            Some(expected) if questions != expected => {
                return Err(DatasetError::Schema {
                    domain: benchmark.domain.as_str().to_string(),
                    details: format!("expected {expected} questions, found {questions}"),
                });
            }
            Some(_) => {}
            None if questions != PROMPTS_PER_BENCHMARK => {
                warn!(
                    "[ppe_corr:collect] {} has {} questions (documented: {})",
                    benchmark.name, questions, PROMPTS_PER_BENCHMARK
                );
            }
            None => {}
        }
        if partitioned.stats.raw_records != questions * RESPONSES_PER_PROMPT {
            debug!(
                "[ppe_corr:collect] {} has {} responses over {} questions (documented: {} per question)",
                benchmark.name, partitioned.stats.raw_records, questions, RESPONSES_PER_PROMPT
            );
        }
        Ok(partitioned)
    }
}
