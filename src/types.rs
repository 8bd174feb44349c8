/// Benchmark domain tag as it appears in output records and summaries.
/// Examples: `mmlu_pro`, `math`, `mbpp_plus`
pub type DomainTag = String;
/// Source-local question identifier (unique only within one benchmark).
/// Examples: `7`, `1a2b3c`
pub type QuestionId = String;
/// Output record identifier, `{domain}_{question_id}`.
/// Example: `math_7`
pub type RecordId = String;
/// Prompt text shared by every response in a question group.
/// Example: `What is 2+2?`
pub type PromptText = String;
/// A single candidate response.
/// Example: `The answer is 4.`
pub type ResponseText = String;
/// Hugging Face dataset repository id.
/// Example: `lmarena-ai/PPE-MATH-Best-of-K`
pub type DatasetId = String;
/// Dataset split selector.
/// Examples: `train`, `test`
pub type SplitName = String;
