use std::fmt;

use crate::benchmarks::Domain;
use crate::collector::Collection;

/// Per-domain share of the output collection.
#[derive(Clone, Debug, PartialEq)]
pub struct DomainShare {
    pub domain: Domain,
    pub count: usize,
    pub share: f64,
}

/// End-of-run summary rendered after the artifact is written.
#[derive(Clone, Debug, PartialEq)]
pub struct RunSummary {
    pub total: usize,
    /// Sorted by domain tag.
    pub per_domain: Vec<DomainShare>,
    /// Domains skipped after a failure, with the reason.
    pub skipped: Vec<(Domain, String)>,
}

impl RunSummary {
    /// Summarize a finished collection.
    pub fn from_collection(collection: &Collection) -> Self {
        let total = collection.records.len();
        let mut per_domain: Vec<DomainShare> = collection
            .counts
            .iter()
            .map(|(domain, count)| DomainShare {
                domain: *domain,
                count: *count,
                share: if total == 0 {
                    0.0
                } else {
                    *count as f64 / total as f64
                },
            })
            .collect();
        per_domain.sort_by(|a, b| a.domain.as_str().cmp(b.domain.as_str()));
        let skipped = collection
            .failures
            .iter()
            .map(|failure| (failure.domain, failure.error.to_string()))
            .collect();
        Self {
            total,
            per_domain,
            skipped,
        }
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Total items: {}", self.total)?;
        for entry in &self.per_domain {
            writeln!(
                f,
                "  {:<10} {:>6} ({:>5.1}%)",
                entry.domain.as_str(),
                entry.count,
                entry.share * 100.0
            )?;
        }
        for (domain, reason) in &self.skipped {
            writeln!(f, "  skipped {domain}: {reason}")?;
        }
        Ok(())
    }
}
