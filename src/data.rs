use serde::{Deserialize, Serialize};

use crate::benchmarks::Domain;
use crate::constants::benchmarks::RECORD_ID_SEPARATOR;

pub use crate::types::{PromptText, QuestionId, RecordId, ResponseText};

/// Binary correctness label attached to a raw response.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Correctness {
    /// Score `1`.
    Correct,
    /// Score `0`.
    Incorrect,
}

impl Correctness {
    /// Map a numeric score onto the label. Only `0` and `1` are valid.
    pub fn from_score(score: i64) -> Option<Self> {
        match score {
            1 => Some(Correctness::Correct),
            0 => Some(Correctness::Incorrect),
            _ => None,
        }
    }

    /// Numeric form of the label.
    pub fn score(self) -> u8 {
        match self {
            Correctness::Correct => 1,
            Correctness::Incorrect => 0,
        }
    }
}

/// One candidate response as read from a benchmark source.
///
/// The domain is implied by the benchmark being read and is not stored here.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawResponseRecord {
    /// Question identifier, unique only within its benchmark.
    pub question_id: QuestionId,
    /// Prompt text of the question.
    pub prompt_text: PromptText,
    /// Candidate response text.
    pub response_text: ResponseText,
    /// Correctness label of the response.
    pub correctness: Correctness,
}

impl RawResponseRecord {
    /// Convenience constructor.
    pub fn new(
        question_id: impl Into<QuestionId>,
        prompt_text: impl Into<PromptText>,
        response_text: impl Into<ResponseText>,
        correctness: Correctness,
    ) -> Self {
        Self {
            question_id: question_id.into(),
            prompt_text: prompt_text.into(),
            response_text: response_text.into(),
            correctness,
        }
    }
}

/// Output unit: one question group of one benchmark.
///
/// Serializes with exactly the fields `id`, `domain`, `prompt`, `chosen`, `rejected`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedRecord {
    /// `{domain}_{question_id}`; unique across the whole collection.
    pub id: RecordId,
    /// Benchmark domain the group came from.
    pub domain: Domain,
    /// Prompt shared by every response in the group.
    pub prompt: PromptText,
    /// Correct responses in source order.
    pub chosen: Vec<ResponseText>,
    /// Incorrect responses in source order.
    pub rejected: Vec<ResponseText>,
}

impl NormalizedRecord {
    /// Number of responses carried by this record.
    pub fn response_count(&self) -> usize {
        self.chosen.len() + self.rejected.len()
    }
}

/// Build the output record id for a question of `domain`.
pub fn record_id(domain: Domain, question_id: &str) -> RecordId {
    format!("{}{RECORD_ID_SEPARATOR}{question_id}", domain.as_str())
}
