/// Constants describing the PPE Best-of-K benchmarks.
pub mod benchmarks {
    /// Documented number of prompts per benchmark.
    pub const PROMPTS_PER_BENCHMARK: usize = 512;
    /// Documented number of sampled responses per prompt.
    pub const RESPONSES_PER_PROMPT: usize = 32;
    /// Separator between domain tag and question id in output record ids.
    pub const RECORD_ID_SEPARATOR: &str = "_";
}

/// Column names read from benchmark rows.
pub mod columns {
    /// Question identifier column.
    pub const QUESTION_ID: &str = "question_id";
    /// Prompt text column.
    pub const PROMPT: &str = "prompt";
    /// Prefix of the numbered response columns in wide rows (`response_1`, ...).
    pub const WIDE_RESPONSE_PREFIX: &str = "response_";
    /// Per-response correctness list in wide rows.
    pub const WIDE_SCORES: &str = "scores";
    /// Response column in long rows.
    pub const LONG_RESPONSE: &str = "response";
    /// Correctness column in long rows.
    pub const LONG_SCORE: &str = "score";
    /// Envelope key used by datasets-server style row dumps.
    pub const ROW_ENVELOPE: &str = "row";
}

/// Constants used by the Hugging Face source adapter.
pub mod huggingface {
    /// Shard file extensions accepted for local and remote files.
    pub const SHARD_EXTENSIONS: [&str; 3] = ["parquet", "jsonl", "ndjson"];
    /// Retry count handed to the hf-hub client.
    pub const DOWNLOAD_RETRIES: usize = 5;
}

/// Defaults for the command surface and output writer.
pub mod output {
    /// Default output artifact path.
    pub const DEFAULT_OUTPUT_PATH: &str = "PPE_Corr.json";
    /// Default split read from every benchmark.
    pub const DEFAULT_SPLIT: &str = "train";
    /// Extension appended to the artifact path while it is being written.
    pub const TEMP_EXTENSION: &str = "tmp";
}
