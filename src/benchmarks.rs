use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::constants::columns::{LONG_RESPONSE, LONG_SCORE, WIDE_RESPONSE_PREFIX, WIDE_SCORES};
use crate::errors::DatasetError;

/// Closed set of benchmark domains present in the output collection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    /// MMLU-Pro multiple choice.
    MmluPro,
    /// MATH competition problems.
    Math,
    /// GPQA graduate-level science questions.
    Gpqa,
    /// IFEval instruction following.
    Ifeval,
    /// MBPP+ Python programming.
    MbppPlus,
}

impl Domain {
    /// All domains in processing order.
    pub const ALL: [Domain; 5] = [
        Domain::MmluPro,
        Domain::Math,
        Domain::Gpqa,
        Domain::Ifeval,
        Domain::MbppPlus,
    ];

    /// Stable string tag used in record ids and the `domain` field.
    pub fn as_str(self) -> &'static str {
        match self {
            Domain::MmluPro => "mmlu_pro",
            Domain::Math => "math",
            Domain::Gpqa => "gpqa",
            Domain::Ifeval => "ifeval",
            Domain::MbppPlus => "mbpp_plus",
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Domain {
    type Err = DatasetError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let needle = raw.trim();
        Domain::ALL
            .into_iter()
            .find(|domain| domain.as_str().eq_ignore_ascii_case(needle))
            .ok_or_else(|| DatasetError::Configuration(format!("unknown domain '{needle}'")))
    }
}

/// How a benchmark's rows carry responses and their correctness labels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RowLayout {
    /// One row per question with numbered response columns and a parallel score list.
    ///
    /// `scores[k - 1]` labels the column `{response_prefix}{k}`.
    Wide {
        /// Prefix of the 1-based numbered response columns.
        response_prefix: &'static str,
        /// List column holding one correctness label per response.
        scores_column: &'static str,
    },
    /// One row per response.
    Long {
        /// Column holding the response text.
        response_column: &'static str,
        /// Column holding the correctness label.
        score_column: &'static str,
    },
}

impl RowLayout {
    /// Layout used by the PPE Best-of-K parquet exports.
    pub const PPE_WIDE: RowLayout = RowLayout::Wide {
        response_prefix: WIDE_RESPONSE_PREFIX,
        scores_column: WIDE_SCORES,
    };

    /// Flat one-response-per-row layout.
    pub const LONG: RowLayout = RowLayout::Long {
        response_column: LONG_RESPONSE,
        score_column: LONG_SCORE,
    };
}

/// One entry of the fixed benchmark table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BenchmarkSpec {
    /// Human readable benchmark name used in logs.
    pub name: &'static str,
    /// Hugging Face dataset repository id.
    pub dataset: &'static str,
    /// Domain tag applied to every record from this benchmark.
    pub domain: Domain,
    /// Row layout of the dataset shards.
    pub layout: RowLayout,
}

/// The five correctness benchmarks, in processing order.
pub static CORRECTNESS_BENCHMARKS: [BenchmarkSpec; 5] = [
    BenchmarkSpec {
        name: "mmlu_pro_best_of_k",
        dataset: "lmarena-ai/PPE-MMLU-Pro-Best-of-K",
        domain: Domain::MmluPro,
        layout: RowLayout::PPE_WIDE,
    },
    BenchmarkSpec {
        name: "math_best_of_k",
        dataset: "lmarena-ai/PPE-MATH-Best-of-K",
        domain: Domain::Math,
        layout: RowLayout::PPE_WIDE,
    },
    BenchmarkSpec {
        name: "gpqa_best_of_k",
        dataset: "lmarena-ai/PPE-GPQA-Best-of-K",
        domain: Domain::Gpqa,
        layout: RowLayout::PPE_WIDE,
    },
    BenchmarkSpec {
        name: "ifeval_best_of_k",
        dataset: "lmarena-ai/PPE-IFEval-Best-of-K",
        domain: Domain::Ifeval,
        layout: RowLayout::PPE_WIDE,
    },
    BenchmarkSpec {
        name: "mbpp_plus_best_of_k",
        dataset: "lmarena-ai/PPE-MBPP-Plus-Best-of-K",
        domain: Domain::MbppPlus,
        layout: RowLayout::PPE_WIDE,
    },
];

/// Table entries restricted to `domains`, keeping table order.
///
/// An empty filter selects every benchmark.
pub fn select_benchmarks(domains: &[Domain]) -> Vec<BenchmarkSpec> {
    CORRECTNESS_BENCHMARKS
        .iter()
        .filter(|spec| domains.is_empty() || domains.contains(&spec.domain))
        .copied()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn benchmark_table_covers_each_domain_once_in_order() {
        let domains: Vec<Domain> = CORRECTNESS_BENCHMARKS
            .iter()
            .map(|spec| spec.domain)
            .collect();
        assert_eq!(domains, Domain::ALL.to_vec());
        let datasets: HashSet<&str> = CORRECTNESS_BENCHMARKS
            .iter()
            .map(|spec| spec.dataset)
            .collect();
        assert_eq!(datasets.len(), 5);
    }

    #[test]
    fn domain_tags_round_trip_through_from_str() {
        for domain in Domain::ALL {
            assert_eq!(domain.as_str().parse::<Domain>().unwrap(), domain);
        }
        assert_eq!(" MATH ".parse::<Domain>().unwrap(), Domain::Math);
        assert!("humaneval".parse::<Domain>().is_err());
    }

    #[test]
    fn domain_serializes_as_snake_case_tag() {
        assert_eq!(
            serde_json::to_string(&Domain::MbppPlus).unwrap(),
            "\"mbpp_plus\""
        );
    }

    #[test]
    fn select_benchmarks_keeps_table_order() {
        let picked = select_benchmarks(&[Domain::Ifeval, Domain::MmluPro]);
        let domains: Vec<Domain> = picked.iter().map(|spec| spec.domain).collect();
        assert_eq!(domains, vec![Domain::MmluPro, Domain::Ifeval]);
        assert_eq!(select_benchmarks(&[]).len(), 5);
    }
}
