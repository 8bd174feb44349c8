#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

/// Command-line runner shared by the `ppe_corr` binary.
pub mod app;
/// Fixed benchmark table and domain tags.
pub mod benchmarks;
/// Collector that drives every benchmark in order.
pub mod collector;
/// Collector configuration types.
pub mod config;
/// Centralized constants for benchmarks, columns, and output defaults.
pub mod constants;
/// Raw and normalized record types.
pub mod data;
/// Question grouping and correctness partitioning.
pub mod grouping;
/// Run summary helpers.
pub mod metrics;
/// Atomic JSON artifact writer.
pub mod output;
/// Benchmark source traits and built-in sources.
pub mod source;
/// Shared type aliases.
pub mod types;

mod errors;

pub use benchmarks::{BenchmarkSpec, CORRECTNESS_BENCHMARKS, Domain, RowLayout};
pub use collector::{BenchmarkFailure, Collection, UnifiedCollector};
pub use config::{CollectorConfig, FailurePolicy};
pub use data::{Correctness, NormalizedRecord, RawResponseRecord};
pub use errors::DatasetError;
pub use grouping::{CorrectnessGrouper, PartitionStats, PartitionedBenchmark, partition_benchmark};
pub use metrics::RunSummary;
pub use output::write_collection;
pub use source::{BenchmarkSource, InMemorySource, RawRecordStream};
#[cfg(feature = "huggingface")]
pub use source::{HuggingFaceSource, HuggingFaceSourceConfig};
pub use types::{DomainTag, QuestionId, RecordId};
