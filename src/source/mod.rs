//! Benchmark source interfaces and row streaming.
//!
//! Ownership model:
//! - `BenchmarkSource` opens one benchmark split and hands back a stream.
//! - `RawRecordStream` owns the row iterator and explodes each row into
//!   per-response records through a `RowDecoder`.
//! - The stream is consumed once; after the first error it yields nothing.

use indexmap::IndexMap;
use serde_json::Value;
use std::collections::VecDeque;

use crate::benchmarks::{BenchmarkSpec, Domain};
use crate::data::RawResponseRecord;
use crate::errors::DatasetError;

/// Row-to-record decoding for the supported row layouts.
pub mod row_view;
#[cfg(feature = "huggingface")]
/// Hugging Face Hub backed benchmark source.
pub mod huggingface;

pub use row_view::{RowDecoder, parse_correctness};
#[cfg(feature = "huggingface")]
pub use huggingface::{HuggingFaceSource, HuggingFaceSourceConfig};

/// Boxed row iterator produced by source backends.
pub type RowIter = Box<dyn Iterator<Item = Result<Value, DatasetError>>>;

/// Opens benchmark splits as lazy raw-record streams.
pub trait BenchmarkSource {
    /// Resolve `benchmark` for `split` and return its record stream.
    ///
    /// Resolution failures (unknown dataset, no shard for the split) are
    /// reported here; read failures surface as `Err` items of the stream.
    fn open(&self, benchmark: &BenchmarkSpec, split: &str)
    -> Result<RawRecordStream, DatasetError>;
}

/// Lazy, finite, non-restartable sequence of raw response records for one benchmark.
pub struct RawRecordStream {
    rows: RowIter,
    decoder: RowDecoder,
    pending: VecDeque<RawResponseRecord>,
    rows_read: usize,
    finished: bool,
}

impl RawRecordStream {
    /// Stream records decoded from `rows` using the benchmark's layout.
    pub fn from_rows(benchmark: &BenchmarkSpec, rows: RowIter) -> Self {
        Self {
            rows,
            decoder: RowDecoder::new(benchmark.domain, benchmark.layout),
            pending: VecDeque::new(),
            rows_read: 0,
            finished: false,
        }
    }

    /// Domain of the records in this stream.
    pub fn domain(&self) -> Domain {
        self.decoder.domain()
    }

    /// Number of source rows pulled so far.
    pub fn rows_read(&self) -> usize {
        self.rows_read
    }
}

impl Iterator for RawRecordStream {
    type Item = Result<RawResponseRecord, DatasetError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(record) = self.pending.pop_front() {
                return Some(Ok(record));
            }
            if self.finished {
                return None;
            }
            let row = match self.rows.next() {
                Some(Ok(row)) => row,
                Some(Err(err)) => {
                    self.finished = true;
                    return Some(Err(err));
                }
                None => {
                    self.finished = true;
                    return None;
                }
            };
            let row_index = self.rows_read;
            self.rows_read += 1;
            match self.decoder.decode(row_index, &row) {
                Ok(records) => self.pending.extend(records),
                Err(err) => {
                    self.finished = true;
                    return Some(Err(err));
                }
            }
        }
    }
}

/// In-memory benchmark source for tests and pre-fetched rows.
#[derive(Default)]
pub struct InMemorySource {
    rows: IndexMap<Domain, Vec<Result<Value, String>>>,
    unavailable: IndexMap<Domain, String>,
}

impl InMemorySource {
    /// Create an empty source; unregistered domains resolve to empty streams.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the rows served for `domain`.
    pub fn with_rows(mut self, domain: Domain, rows: Vec<Value>) -> Self {
        self.rows
            .insert(domain, rows.into_iter().map(Ok).collect());
        self
    }

    /// Append a row that fails to read with `reason` after the registered rows.
    pub fn with_read_failure(mut self, domain: Domain, reason: impl Into<String>) -> Self {
        self.rows.entry(domain).or_default().push(Err(reason.into()));
        self
    }

    /// Make `open` fail for `domain` as if the dataset could not be resolved.
    pub fn with_unavailable(mut self, domain: Domain, reason: impl Into<String>) -> Self {
        self.unavailable.insert(domain, reason.into());
        self
    }
}

impl BenchmarkSource for InMemorySource {
    fn open(
        &self,
        benchmark: &BenchmarkSpec,
        _split: &str,
    ) -> Result<RawRecordStream, DatasetError> {
        let domain = benchmark.domain;
        if let Some(reason) = self.unavailable.get(&domain) {
            return Err(DatasetError::Retrieval {
                domain: domain.as_str().to_string(),
                reason: reason.clone(),
            });
        }
        let rows: Vec<Result<Value, DatasetError>> = self
            .rows
            .get(&domain)
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .map(|row| {
                row.map_err(|reason| DatasetError::Retrieval {
                    domain: domain.as_str().to_string(),
                    reason,
                })
            })
            .collect();
        Ok(RawRecordStream::from_rows(benchmark, Box::new(rows.into_iter())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::benchmarks::{CORRECTNESS_BENCHMARKS, RowLayout};
    use crate::data::Correctness;
    use serde_json::json;

    fn math() -> BenchmarkSpec {
        CORRECTNESS_BENCHMARKS[1]
    }

    #[test]
    fn stream_explodes_rows_in_order() {
        let source = InMemorySource::new().with_rows(
            Domain::Math,
            vec![
                json!({"question_id": 1, "prompt": "a", "response_1": "x", "response_2": "y", "scores": [0, 1]}),
                json!({"question_id": 2, "prompt": "b", "response_1": "z", "scores": [1]}),
            ],
        );
        let mut stream = source.open(&math(), "train").unwrap();
        let records: Vec<RawResponseRecord> = stream.by_ref().map(Result::unwrap).collect();
        let texts: Vec<&str> = records.iter().map(|r| r.response_text.as_str()).collect();
        assert_eq!(texts, vec!["x", "y", "z"]);
        assert_eq!(records[1].correctness, Correctness::Correct);
        assert_eq!(stream.rows_read(), 2);
        assert_eq!(stream.domain(), Domain::Math);
    }

    #[test]
    fn stream_stops_after_first_error() {
        let benchmark = BenchmarkSpec {
            layout: RowLayout::LONG,
            ..math()
        };
        let source = InMemorySource::new()
            .with_rows(
                Domain::Math,
                vec![
                    json!({"question_id": "1", "prompt": "a", "response": "x", "score": 1}),
                    json!({"question_id": "1", "prompt": "a", "response": "y", "score": 7}),
                    json!({"question_id": "2", "prompt": "b", "response": "z", "score": 0}),
                ],
            );
        let items: Vec<_> = source.open(&benchmark, "train").unwrap().collect();
        assert_eq!(items.len(), 2);
        assert!(items[0].is_ok());
        assert!(matches!(items[1], Err(DatasetError::Schema { .. })));
    }

    #[test]
    fn read_failures_surface_as_retrieval_errors() {
        let source = InMemorySource::new().with_read_failure(Domain::Math, "connection reset");
        let items: Vec<_> = source.open(&math(), "train").unwrap().collect();
        assert!(matches!(
            items.as_slice(),
            [Err(DatasetError::Retrieval { .. })]
        ));
    }

    #[test]
    fn unavailable_domains_fail_to_open() {
        let source = InMemorySource::new().with_unavailable(Domain::Math, "404");
        let err = source.open(&math(), "train").err().unwrap();
        assert_eq!(err.domain(), Some("math"));
    }

    #[test]
    fn unregistered_domain_is_an_empty_stream() {
        let source = InMemorySource::new();
        assert_eq!(source.open(&math(), "train").unwrap().count(), 0);
    }
}
