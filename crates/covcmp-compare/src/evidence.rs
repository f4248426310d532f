//! Evidence aggregation for the Compare Orchestrator (spec §4.10): group
//! by `DocumentType` in the fixed priority order, suppress POLICY unless
//! either side shows a disease-scope indicator, sort each group by
//! `(page, excerpt)`, and require at least one PROPOSAL span — proposals
//! are the system of record.

use covcmp_foundation::error::CoreError;
use covcmp_registry::{CanonicalCoverageCode, DocumentType, InsurerCode};
use serde::{Deserialize, Serialize};

/// One `coverage_evidence` row (spec §3), read-only to the core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceSpan {
    pub insurer: InsurerCode,
    pub doc_type: DocumentType,
    pub doc_id: String,
    pub page: u32,
    pub excerpt: String,
    pub canonical_coverage_code: Option<CanonicalCoverageCode>,
    pub evidence_type: Option<String>,
}

/// Group, filter, and order evidence spans for presentation.
/// `disease_scope_seen` gates POLICY spans: they are dropped entirely
/// when neither side of the comparison showed a disease-scope indicator
/// (spec Testable Property 10), even if the caller supplied some.
pub fn aggregate_evidence(spans: Vec<EvidenceSpan>, disease_scope_seen: bool) -> Result<Vec<EvidenceSpan>, CoreError> {
    let mut filtered: Vec<EvidenceSpan> = spans
        .into_iter()
        .filter(|span| disease_scope_seen || span.doc_type != DocumentType::Policy)
        .collect();

    if !filtered.iter().any(|span| span.doc_type == DocumentType::Proposal) {
        return Err(CoreError::DataInsufficient(
            "proposal evidence required: no PROPOSAL-type evidence available".to_string(),
        ));
    }

    filtered.sort_by(|a, b| a.doc_type.cmp(&b.doc_type).then_with(|| a.page.cmp(&b.page)).then_with(|| a.excerpt.cmp(&b.excerpt)));
    Ok(filtered)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span(doc_type: DocumentType, page: u32, excerpt: &str) -> EvidenceSpan {
        EvidenceSpan {
            insurer: InsurerCode::Samsung,
            doc_type,
            doc_id: "D-1".into(),
            page,
            excerpt: excerpt.into(),
            canonical_coverage_code: None,
            evidence_type: None,
        }
    }

    #[test]
    fn policy_evidence_is_suppressed_without_disease_scope_indicator() {
        let spans = vec![span(DocumentType::Proposal, 1, "b"), span(DocumentType::Policy, 2, "a")];
        let result = aggregate_evidence(spans, false).unwrap();
        assert!(result.iter().all(|s| s.doc_type != DocumentType::Policy));
    }

    #[test]
    fn policy_evidence_is_kept_with_disease_scope_indicator() {
        let spans = vec![span(DocumentType::Proposal, 1, "b"), span(DocumentType::Policy, 2, "a")];
        let result = aggregate_evidence(spans, true).unwrap();
        assert!(result.iter().any(|s| s.doc_type == DocumentType::Policy));
    }

    #[test]
    fn groups_are_ordered_by_priority_then_page_then_excerpt() {
        let spans = vec![
            span(DocumentType::Policy, 1, "z"),
            span(DocumentType::Proposal, 2, "b"),
            span(DocumentType::Proposal, 1, "a"),
        ];
        let result = aggregate_evidence(spans, true).unwrap();
        let order: Vec<_> = result.iter().map(|s| (s.doc_type, s.page, s.excerpt.clone())).collect();
        assert_eq!(
            order,
            vec![
                (DocumentType::Proposal, 1, "a".to_string()),
                (DocumentType::Proposal, 2, "b".to_string()),
                (DocumentType::Policy, 1, "z".to_string()),
            ]
        );
    }

    #[test]
    fn missing_proposal_evidence_is_an_error() {
        let spans = vec![span(DocumentType::Policy, 1, "a")];
        assert!(aggregate_evidence(spans, true).is_err());
    }
}
