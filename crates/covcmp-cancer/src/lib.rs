//! Cancer coverage subsystem (spec §4.3-§4.6): the single most intricate
//! part of the engine, because "암진단비" is never one coverage. Cancer
//! coverages are split by scope — general / similar / in-situ / borderline
//! — and only policy evidence, never the proposal document, may decide
//! which scopes a given insurer's coverage covers (AH-1 through AH-6).

pub mod compare_integration;
pub mod scope_detector;
pub mod split_mapper;
pub mod typer;

pub use compare_integration::{
    CancerCanonicalDecision, CancerCompareContext, CancerCompareIntegration, CancerEvidenceSource,
    DecisionMethod, DecisionStatus, DecisionEvidenceSpan, RawEvidenceSpan, CANCER_EVIDENCE_KEYWORDS,
};
pub use scope_detector::{
    build_scope_evidence_from_policy, detect_scope_from_text, extract_hint_from_coverage_name,
    PolicyDocumentChunk, PolicyTextSpan,
};
pub use split_mapper::{
    canonical_display_name, generate_split_report, legacy_to_canonical_map,
    split_cancer_coverage_by_scope, split_coverage, CancerScopeEvidence, CoverageSplitResult,
    EvidenceConfidence, EvidenceSpanRecord, InvalidEvidenceState, NameBasedHint, SplitMethod,
    SplitReport, SplitResult,
};
pub use typer::{classify_evidence, CancerEvidenceType, EvidenceTypeResult};
