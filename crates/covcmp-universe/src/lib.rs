//! Proposal universe (spec §4.7, "Universe Lock"): the ingestion-side
//! contract types plus the single joined read the Compare Orchestrator
//! uses as its sole admission gate. Ingestion itself — PDF parsing, unit
//! explosion, dedup, content hashing — lives behind `ProposalIngestSource`,
//! a collaborator this crate depends on but does not implement.

pub mod amount;
pub mod content_hash;
pub mod ingest;
pub mod line_patterns;
pub mod slots;
pub mod types;
pub mod universe;

pub use amount::{parse_amount, ParsedAmount};
pub use content_hash::content_hash;
pub use ingest::ProposalIngestSource;
pub use line_patterns::{parse_proposal_line, ParsedLine};
pub use slots::extract_slots;
pub use types::{
    CoverageMapping, CoverageSlots, DiseaseScopeNorm, FullCoverage, MappingEvidence, MappingStatus, PayoutLimit,
    PayoutLimitKind, ProposalCoverage, SlotEvidence, SourceConfidence,
};
pub use universe::{PgUniverseStore, UniverseReader};
