use thiserror::Error;

use crate::types::DomainTag;

/// Error type for retrieval, schema, and output failures.
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("benchmark '{domain}' could not be retrieved: {reason}")]
    Retrieval { domain: DomainTag, reason: String },
    #[error("benchmark '{domain}' produced a malformed record: {details}")]
    Schema { domain: DomainTag, details: String },
    #[error("failed writing output artifact {path}: {reason}")]
    Output { path: String, reason: String },
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl DatasetError {
    /// Domain tag the failure is attributed to, if any.
    pub fn domain(&self) -> Option<&str> {
        match self {
            DatasetError::Retrieval { domain, .. } | DatasetError::Schema { domain, .. } => {
                Some(domain)
            }
            DatasetError::Output { .. } | DatasetError::Configuration(_) => None,
        }
    }
}
