//! Proposal universe data model (spec §3): `ProposalCoverage` →
//! `CoverageMapping` → `CoverageSlots`, each attached 1-to-1 to its
//! parent and immutable once written by the ingestion layer.

use covcmp_registry::{CanonicalCoverageCode, InsurerCode};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A row in `proposal_coverage_universe`. Owned exclusively by the
/// ingestion layer; the core only ever reads it. `(insurer,
/// normalized_name)` is the Universe Lock key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProposalCoverage {
    pub insurer: InsurerCode,
    pub proposal_id: String,
    pub raw_coverage_name: String,
    pub normalized_name: String,
    pub currency: String,
    pub amount_value: i64,
    pub payout_amount_unit: String,
    pub source_page: u32,
    pub span_text: String,
    pub content_hash: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MappingStatus {
    Mapped,
    Unmapped,
    Ambiguous,
}

/// How the raw coverage title was resolved to a canonical code, kept
/// for audit display — never re-derived at read time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappingEvidence {
    pub lookup_key: String,
    pub matched_alias: Option<String>,
    pub source_file: Option<String>,
    pub match_type: String,
}

/// `proposal_coverage_mapped`, attached 1-to-1 to a `ProposalCoverage`.
/// Invariant: `MAPPED ⇒ canonical_coverage_code.is_some()`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverageMapping {
    pub mapping_status: MappingStatus,
    pub canonical_coverage_code: Option<CanonicalCoverageCode>,
    pub mapping_evidence: MappingEvidence,
}

impl CoverageMapping {
    pub fn mapped(code: CanonicalCoverageCode, evidence: MappingEvidence) -> Self {
        Self { mapping_status: MappingStatus::Mapped, canonical_coverage_code: Some(code), mapping_evidence: evidence }
    }

    pub fn unmapped(evidence: MappingEvidence) -> Self {
        Self { mapping_status: MappingStatus::Unmapped, canonical_coverage_code: None, mapping_evidence: evidence }
    }

    pub fn ambiguous(evidence: MappingEvidence) -> Self {
        Self { mapping_status: MappingStatus::Ambiguous, canonical_coverage_code: None, mapping_evidence: evidence }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceConfidence {
    ProposalConfirmed,
    PolicyRequired,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiseaseScopeNorm {
    pub include_group_id: String,
    pub exclude_group_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayoutLimitKind {
    Once,
    Multiple,
    Unlimited,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayoutLimit {
    #[serde(rename = "type")]
    pub kind: PayoutLimitKind,
    pub count: Option<u32>,
    pub period: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotEvidence {
    pub doc_id: Option<String>,
    pub page: Option<u32>,
    pub span_text: Option<String>,
}

/// `proposal_coverage_slots`, attached 1-to-1 to a `CoverageMapping`
/// and existing only if `mapping_status == MAPPED`.
///
/// `disease_scope_norm` and `hospitalization_exclusions` stay `None`
/// until the policy-scope pipeline fills them in; they are never
/// guessed here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverageSlots {
    pub event_type: Option<String>,
    pub disease_scope_raw: Option<String>,
    pub disease_scope_norm: Option<DiseaseScopeNorm>,
    pub waiting_period_days: Option<u32>,
    pub reduction_periods: Vec<String>,
    pub payout_limit: Option<PayoutLimit>,
    pub treatment_method: HashSet<String>,
    pub hospitalization_exclusions: Option<serde_json::Value>,
    pub renewal_flag: bool,
    pub renewal_period_years: Option<u32>,
    pub source_confidence: SourceConfidence,
    pub qualification_suffix: Option<String>,
    pub evidence: SlotEvidence,
}

impl CoverageSlots {
    pub fn empty(source_confidence: SourceConfidence) -> Self {
        Self {
            event_type: None,
            disease_scope_raw: None,
            disease_scope_norm: None,
            waiting_period_days: None,
            reduction_periods: Vec::new(),
            payout_limit: None,
            treatment_method: HashSet::new(),
            hospitalization_exclusions: None,
            renewal_flag: false,
            renewal_period_years: None,
            source_confidence,
            qualification_suffix: None,
            evidence: SlotEvidence { doc_id: None, page: None, span_text: None },
        }
    }
}

/// The joined read-side record the Compare Orchestrator treats as the
/// sole admission gate — never three separate 1-to-1 fetches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FullCoverage {
    pub coverage: ProposalCoverage,
    pub mapping: CoverageMapping,
    pub slots: Option<CoverageSlots>,
}
