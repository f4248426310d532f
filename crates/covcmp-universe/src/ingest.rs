//! Ingestion collaborator boundary (spec §4.7 Non-goals): PDF → row
//! parsing lives outside this crate. The core only depends on the
//! `ProposalIngestSource` trait, never on a concrete parser, mirroring
//! the `CancerEvidenceSource` dependency-inversion boundary in
//! `covcmp-cancer`.

use crate::types::ProposalCoverage;
use async_trait::async_trait;
use covcmp_foundation::error::CoreError;
use covcmp_registry::InsurerCode;

/// Supplies already-ingested, already-deduplicated proposal rows for one
/// insurer. Implementations own PDF parsing, unit explosion, dedup by
/// `(insurer, proposal_id, normalized_name)`, and content hashing; none
/// of that happens in this crate.
#[async_trait]
pub trait ProposalIngestSource: Send + Sync {
    async fn fetch_proposal_coverage(&self, insurer: InsurerCode) -> Result<Vec<ProposalCoverage>, CoreError>;
}

/// Deterministic in-memory double for tests: no PDF parsing, no I/O,
/// just whatever rows the test seeded it with. Never used outside
/// `#[cfg(test)]` — the synthetic-row prohibition (spec §9) applies to
/// production ingestion, which this type deliberately never is.
#[cfg(test)]
pub struct InMemoryIngestSource {
    rows: Vec<ProposalCoverage>,
}

#[cfg(test)]
impl InMemoryIngestSource {
    pub fn new(rows: Vec<ProposalCoverage>) -> Self {
        Self { rows }
    }
}

#[cfg(test)]
#[async_trait]
impl ProposalIngestSource for InMemoryIngestSource {
    async fn fetch_proposal_coverage(&self, insurer: InsurerCode) -> Result<Vec<ProposalCoverage>, CoreError> {
        Ok(self.rows.iter().filter(|row| row.insurer == insurer).cloned().collect())
    }
}
