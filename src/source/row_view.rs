use serde_json::{Map, Value};

use crate::benchmarks::{Domain, RowLayout};
use crate::constants::columns::{PROMPT, QUESTION_ID, ROW_ENVELOPE};
use crate::data::{Correctness, RawResponseRecord};
use crate::errors::DatasetError;

/// Decodes benchmark rows into per-response records according to a row layout.
#[derive(Clone, Copy, Debug)]
pub struct RowDecoder {
    domain: Domain,
    layout: RowLayout,
}

impl RowDecoder {
    /// Build a decoder for rows of `domain` stored in `layout`.
    pub fn new(domain: Domain, layout: RowLayout) -> Self {
        Self { domain, layout }
    }

    /// Domain the decoded records belong to.
    pub fn domain(&self) -> Domain {
        self.domain
    }

    /// Explode one row into raw response records, in column order.
    ///
    /// Wide rows yield one record per numbered response column; long rows
    /// yield exactly one record.
    pub fn decode(
        &self,
        row_index: usize,
        row_value: &Value,
    ) -> Result<Vec<RawResponseRecord>, DatasetError> {
        let row_payload = match row_value.get(ROW_ENVELOPE) {
            Some(inner @ Value::Object(_)) => inner,
            _ => row_value,
        };
        let row = row_payload
            .as_object()
            .ok_or_else(|| self.schema_error(row_index, "row is not a JSON object".to_string()))?;

        let question_id = self.question_id(row_index, row)?;
        let prompt = self.required_text(row_index, row, PROMPT)?;

        match self.layout {
            RowLayout::Wide {
                response_prefix,
                scores_column,
            } => {
                let scores = row
                    .get(scores_column)
                    .and_then(Value::as_array)
                    .ok_or_else(|| {
                        self.schema_error(
                            row_index,
                            format!("missing list column '{scores_column}'"),
                        )
                    })?;

                let mut responses = Vec::new();
                loop {
                    let column = format!("{response_prefix}{}", responses.len() + 1);
                    let Some(value) = row.get(&column) else {
                        break;
                    };
                    let text = value.as_str().ok_or_else(|| {
                        self.schema_error(row_index, format!("column '{column}' is not a string"))
                    })?;
                    responses.push(text);
                }

                if responses.len() != scores.len() {
                    return Err(self.schema_error(
                        row_index,
                        format!(
                            "question '{question_id}' has {} response columns but {} scores",
                            responses.len(),
                            scores.len()
                        ),
                    ));
                }

                responses
                    .into_iter()
                    .zip(scores)
                    .enumerate()
                    .map(|(idx, (response, score))| {
                        let correctness = parse_correctness(score).ok_or_else(|| {
                            self.schema_error(
                                row_index,
                                format!(
                                    "question '{question_id}' {scores_column}[{idx}] is not 0/1: {score}"
                                ),
                            )
                        })?;
                        Ok(RawResponseRecord::new(
                            question_id.clone(),
                            prompt,
                            response,
                            correctness,
                        ))
                    })
                    .collect()
            }
            RowLayout::Long {
                response_column,
                score_column,
            } => {
                let response = self.required_text(row_index, row, response_column)?;
                let score = row.get(score_column).ok_or_else(|| {
                    self.schema_error(row_index, format!("missing column '{score_column}'"))
                })?;
                let correctness = parse_correctness(score).ok_or_else(|| {
                    self.schema_error(
                        row_index,
                        format!("question '{question_id}' {score_column} is not 0/1: {score}"),
                    )
                })?;
                Ok(vec![RawResponseRecord::new(
                    question_id,
                    prompt,
                    response,
                    correctness,
                )])
            }
        }
    }

    fn question_id(&self, row_index: usize, row: &Map<String, Value>) -> Result<String, DatasetError> {
        match row.get(QUESTION_ID) {
            Some(Value::String(s)) if !s.trim().is_empty() => Ok(s.clone()),
            Some(Value::Number(n)) => Ok(n.to_string()),
            Some(other) => Err(self.schema_error(
                row_index,
                format!("column '{QUESTION_ID}' has unsupported value {other}"),
            )),
            None => Err(self.schema_error(row_index, format!("missing column '{QUESTION_ID}'"))),
        }
    }

    fn required_text<'a>(
        &self,
        row_index: usize,
        row: &'a Map<String, Value>,
        column: &str,
    ) -> Result<&'a str, DatasetError> {
        match row.get(column) {
            Some(Value::String(s)) => Ok(s.as_str()),
            Some(Value::Null) | None => {
                Err(self.schema_error(row_index, format!("missing column '{column}'")))
            }
            Some(_) => Err(self.schema_error(row_index, format!("column '{column}' is not a string"))),
        }
    }

    fn schema_error(&self, row_index: usize, details: String) -> DatasetError {
        DatasetError::Schema {
            domain: self.domain.as_str().to_string(),
            details: format!("row {row_index}: {details}"),
        }
    }
}

/// Read a binary correctness label from integer, boolean, or integral float encodings.
pub fn parse_correctness(value: &Value) -> Option<Correctness> {
    match value {
        Value::Bool(true) => Some(Correctness::Correct),
        Value::Bool(false) => Some(Correctness::Incorrect),
        Value::Number(n) => {
            if let Some(score) = n.as_i64() {
                return Correctness::from_score(score);
            }
            match n.as_f64() {
                Some(score) if score == 1.0 => Some(Correctness::Correct),
                Some(score) if score == 0.0 => Some(Correctness::Incorrect),
                _ => None,
            }
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn wide() -> RowDecoder {
        RowDecoder::new(Domain::Math, RowLayout::PPE_WIDE)
    }

    #[test]
    fn wide_row_pairs_each_response_with_its_score() {
        let row = json!({
            "question_id": 7,
            "prompt": "2+2?",
            "response_1": "4",
            "response_2": "5",
            "response_3": "four",
            "scores": [1, 0, true],
            "model_name": "ignored",
        });
        let records = wide().decode(0, &row).unwrap();
        assert_eq!(
            records,
            vec![
                RawResponseRecord::new("7", "2+2?", "4", Correctness::Correct),
                RawResponseRecord::new("7", "2+2?", "5", Correctness::Incorrect),
                RawResponseRecord::new("7", "2+2?", "four", Correctness::Correct),
            ]
        );
    }

    #[test]
    fn wide_row_stops_at_first_missing_response_column() {
        let row = json!({
            "question_id": "q",
            "prompt": "p",
            "response_1": "a",
            "response_3": "orphan",
            "scores": [0],
        });
        let records = wide().decode(0, &row).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].response_text, "a");
    }

    #[test]
    fn wide_row_with_score_count_mismatch_is_schema_error() {
        let row = json!({
            "question_id": "q",
            "prompt": "p",
            "response_1": "a",
            "response_2": "b",
            "scores": [1],
        });
        let err = wide().decode(3, &row).unwrap_err();
        match err {
            DatasetError::Schema { domain, details } => {
                assert_eq!(domain, "math");
                assert!(details.contains("row 3"), "{details}");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn non_binary_scores_are_rejected() {
        let row = json!({
            "question_id": "q",
            "prompt": "p",
            "response_1": "a",
            "scores": [2],
        });
        assert!(matches!(
            wide().decode(0, &row),
            Err(DatasetError::Schema { .. })
        ));
        assert_eq!(parse_correctness(&json!(0.5)), None);
        assert_eq!(parse_correctness(&json!("1")), None);
        assert_eq!(parse_correctness(&json!(1.0)), Some(Correctness::Correct));
    }

    #[test]
    fn missing_required_fields_are_schema_errors() {
        let decoder = RowDecoder::new(Domain::Gpqa, RowLayout::LONG);
        for row in [
            json!({"prompt": "p", "response": "a", "score": 1}),
            json!({"question_id": "q", "response": "a", "score": 1}),
            json!({"question_id": "q", "prompt": "p", "score": 1}),
            json!({"question_id": "q", "prompt": "p", "response": "a"}),
            json!({"question_id": "q", "prompt": "p", "response": null, "score": 1}),
            json!(["not", "an", "object"]),
        ] {
            assert!(
                matches!(decoder.decode(0, &row), Err(DatasetError::Schema { .. })),
                "expected schema error for {row}"
            );
        }
    }

    #[test]
    fn long_row_unwraps_datasets_server_envelope() {
        let decoder = RowDecoder::new(Domain::Ifeval, RowLayout::LONG);
        let row = json!({
            "row_idx": 0,
            "row": {"question_id": "a1", "prompt": "p", "response": "r", "score": 0},
        });
        let records = decoder.decode(0, &row).unwrap();
        assert_eq!(
            records,
            vec![RawResponseRecord::new("a1", "p", "r", Correctness::Incorrect)]
        );
        assert_eq!(decoder.domain(), Domain::Ifeval);
    }
}
