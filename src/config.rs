use crate::constants::output::DEFAULT_SPLIT;
use crate::types::SplitName;

/// What the collector does when one benchmark fails.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Stop the run and report the failing benchmark.
    #[default]
    Abort,
    /// Leave the failing domain out of the output and keep going.
    Skip,
}

/// Top-level collector configuration.
#[derive(Clone, Debug)]
pub struct CollectorConfig {
    /// Split read from every benchmark, e.g. `train`.
    pub split: SplitName,
    /// Behavior when a benchmark fails to retrieve or decode.
    pub failure_policy: FailurePolicy,
    /// Exact number of questions each benchmark must yield.
    ///
    /// `None` accepts whatever the source contains and only logs a warning
    /// when the count differs from the documented prompt count.
    pub expected_questions: Option<usize>,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            split: DEFAULT_SPLIT.to_string(),
            failure_policy: FailurePolicy::Abort,
            expected_questions: None,
        }
    }
}
