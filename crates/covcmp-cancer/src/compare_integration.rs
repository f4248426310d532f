//! Cancer Compare Integration (spec §4.6): the constitutional flow
//! query → Excel alias recall → policy evidence → DECIDED/UNDECIDED.
//!
//! Compare execution uses ONLY decided canonical codes (AH-5). UNDECIDED
//! yields an empty set for compare purposes; it is never a silent fallback
//! to the over-recalled Excel candidates, and there is no LLM step anywhere
//! in this chain.

use crate::typer::{classify_evidence, CancerEvidenceType};
use async_trait::async_trait;
use covcmp_alias_index::AliasIndex;
use covcmp_foundation::error::CoreError;
use covcmp_registry::CancerCanonical;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::debug;

/// Cancer-relevant keywords used to gate the policy-evidence lookup (spec
/// §4.8). Kept here so any [`CancerEvidenceSource`] implementation shares
/// the same gate rather than inventing its own.
pub const CANCER_EVIDENCE_KEYWORDS: &[&str] = &[
    "암",
    "악성신생물",
    "유사암",
    "갑상선암",
    "기타피부암",
    "제자리암",
    "상피내암",
    "경계성종양",
    "C00",
    "C97",
    "D00",
    "D09",
    "D37",
    "D48",
    "C73",
    "C44",
];

/// One unclassified policy evidence row as fetched from storage, before
/// evidence typing is applied.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawEvidenceSpan {
    pub doc_id: String,
    pub page: i32,
    pub span_text: String,
}

/// Collaborator boundary (spec §4.8/§5): the compare integration never
/// touches `sqlx` directly, it asks this trait for cancer-keyword-gated
/// policy evidence rows for one insurer, ordered by page ascending.
#[async_trait]
pub trait CancerEvidenceSource {
    async fn fetch_cancer_evidence(&self, insurer_code: &str) -> Result<Vec<RawEvidenceSpan>, CoreError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionStatus {
    Decided,
    Undecided,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionMethod {
    NoPolicyEvidence,
    PolicyEvidence,
    InsufficientEvidence,
}

/// An evidence span retained on a DECIDED decision, for audit/UX display.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionEvidenceSpan {
    pub doc_id: String,
    pub page: i32,
    pub span_text: String,
    pub evidence_type: CancerEvidenceType,
    pub rule_id: String,
}

/// Per-insurer cancer canonical decision (spec §4.6). `recalled_candidates`
/// is audit/display data only — [`CancerCanonicalDecision::get_canonical_codes_for_compare`]
/// is the sole sanctioned read path for compare execution (AH-5).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancerCanonicalDecision {
    pub coverage_name_raw: String,
    pub insurer_code: String,
    pub recalled_candidates: HashSet<CancerCanonical>,
    pub decided_canonical_codes: HashSet<CancerCanonical>,
    pub decision_status: DecisionStatus,
    pub decision_method: Option<DecisionMethod>,
    pub decision_evidence_spans: Vec<DecisionEvidenceSpan>,
}

impl CancerCanonicalDecision {
    fn new(coverage_name_raw: String, insurer_code: String, recalled_candidates: HashSet<CancerCanonical>) -> Self {
        Self {
            coverage_name_raw,
            insurer_code,
            recalled_candidates,
            decided_canonical_codes: HashSet::new(),
            decision_status: DecisionStatus::Undecided,
            decision_method: None,
            decision_evidence_spans: Vec::new(),
        }
    }

    /// The only sanctioned way to read canonical codes for comparison
    /// (AH-5): an empty set when UNDECIDED, never `recalled_candidates`.
    pub fn get_canonical_codes_for_compare(&self) -> HashSet<CancerCanonical> {
        match self.decision_status {
            DecisionStatus::Decided => self.decided_canonical_codes.clone(),
            DecisionStatus::Undecided => HashSet::new(),
        }
    }
}

/// All per-insurer decisions for a single compare request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancerCompareContext {
    pub query: String,
    pub decisions: Vec<CancerCanonicalDecision>,
}

/// Orchestrates AH-1 → AH-4 → AH-5 → AH-6 for the `/compare` pipeline.
pub struct CancerCompareIntegration<'a, S: CancerEvidenceSource> {
    alias_index: &'a AliasIndex,
    evidence_source: S,
}

impl<'a, S: CancerEvidenceSource> CancerCompareIntegration<'a, S> {
    pub fn new(alias_index: &'a AliasIndex, evidence_source: S) -> Self {
        Self { alias_index, evidence_source }
    }

    /// Resolve cancer canonical codes for one query + insurer.
    pub async fn resolve_cancer_canonical(
        &self,
        query: &str,
        insurer_code: &str,
    ) -> Result<CancerCanonicalDecision, CoreError> {
        let recalled = self.recall_from_alias(query);
        let mut decision = CancerCanonicalDecision::new(query.to_string(), insurer_code.to_string(), recalled);

        let evidence_spans = self.evidence_source.fetch_cancer_evidence(insurer_code).await?;
        if evidence_spans.is_empty() {
            decision.decision_status = DecisionStatus::Undecided;
            decision.decision_method = Some(DecisionMethod::NoPolicyEvidence);
            return Ok(decision);
        }

        let (decided_codes, typed_spans) = decide_from_evidence(&evidence_spans);

        if decided_codes.is_empty() {
            decision.decision_status = DecisionStatus::Undecided;
            decision.decision_method = Some(DecisionMethod::InsufficientEvidence);
        } else {
            decision.decided_canonical_codes = decided_codes;
            decision.decision_status = DecisionStatus::Decided;
            decision.decision_method = Some(DecisionMethod::PolicyEvidence);
            decision.decision_evidence_spans = typed_spans
                .into_iter()
                .filter(|(_, t)| {
                    matches!(
                        t.evidence_type,
                        CancerEvidenceType::DefinitionIncluded
                            | CancerEvidenceType::SeparateBenefit
                            | CancerEvidenceType::Exclusion
                    )
                })
                .map(|(span, t)| DecisionEvidenceSpan {
                    doc_id: span.doc_id,
                    page: span.page,
                    span_text: span.span_text,
                    evidence_type: t.evidence_type,
                    rule_id: t.matched_pattern.unwrap_or_else(|| "unknown".to_string()),
                })
                .collect();
        }

        Ok(decision)
    }

    /// Resolve cancer canonical decisions for every insurer in a compare
    /// request.
    pub async fn resolve_compare_context(
        &self,
        query: &str,
        insurer_codes: &[String],
    ) -> Result<CancerCompareContext, CoreError> {
        let mut decisions = Vec::with_capacity(insurer_codes.len());
        for insurer_code in insurer_codes {
            decisions.push(self.resolve_cancer_canonical(query, insurer_code).await?);
        }
        Ok(CancerCompareContext { query: query.to_string(), decisions })
    }

    fn recall_from_alias(&self, query: &str) -> HashSet<CancerCanonical> {
        let recalled_strs = self.alias_index.resolve_query(query, true);
        let recalled: HashSet<CancerCanonical> = recalled_strs
            .into_iter()
            .filter_map(|code_str| CancerCanonical::ALL.into_iter().find(|c| c.code() == code_str))
            .collect();
        debug!(query, recalled = recalled.len(), "alias recall complete");
        recalled
    }
}

/// Type every span, then decide canonical codes from the typed evidence.
/// Separate-benefit evidence is checked before definition evidence (spec
/// §4.6) — both may contribute, but the result never falls back to the
/// recalled candidates when empty.
fn decide_from_evidence(
    spans: &[RawEvidenceSpan],
) -> (HashSet<CancerCanonical>, Vec<(RawEvidenceSpan, crate::typer::EvidenceTypeResult)>) {
    let typed: Vec<(RawEvidenceSpan, crate::typer::EvidenceTypeResult)> =
        spans.iter().map(|span| (span.clone(), classify_evidence(&span.span_text))).collect();

    let mut decided = HashSet::new();
    decided.extend(extract_codes_from_separate_benefit(&typed));
    decided.extend(extract_codes_from_definition(&typed));
    (decided, typed)
}

/// "제자리암진단비" / "경계성종양진단비" called out as a separate benefit.
fn extract_codes_from_separate_benefit(
    typed_spans: &[(RawEvidenceSpan, crate::typer::EvidenceTypeResult)],
) -> HashSet<CancerCanonical> {
    let mut codes = HashSet::new();
    for (span, result) in typed_spans {
        if result.evidence_type != CancerEvidenceType::SeparateBenefit {
            continue;
        }
        if span.span_text.contains("제자리암") && span.span_text.contains("진단") {
            codes.insert(CancerCanonical::InSitu);
        }
        if span.span_text.contains("경계성종양") && span.span_text.contains("진단") {
            codes.insert(CancerCanonical::Borderline);
        }
    }
    codes
}

/// "유사암" definition includes "제자리암" → SIMILAR; "일반암" definition
/// that excludes "유사암" → GENERAL.
fn extract_codes_from_definition(
    typed_spans: &[(RawEvidenceSpan, crate::typer::EvidenceTypeResult)],
) -> HashSet<CancerCanonical> {
    let mut codes = HashSet::new();
    for (span, result) in typed_spans {
        if result.evidence_type != CancerEvidenceType::DefinitionIncluded {
            continue;
        }
        if span.span_text.contains("유사암") {
            codes.insert(CancerCanonical::Similar);
        }
        if span.span_text.contains("일반암")
            || (span.span_text.contains("암") && !span.span_text.contains("유사암"))
        {
            codes.insert(CancerCanonical::General);
        }
    }
    codes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn undecided_decision_yields_empty_compare_set() {
        let decision = CancerCanonicalDecision {
            coverage_name_raw: "암진단비".into(),
            insurer_code: "SAMSUNG".into(),
            recalled_candidates: HashSet::from([CancerCanonical::General, CancerCanonical::Similar]),
            decided_canonical_codes: HashSet::new(),
            decision_status: DecisionStatus::Undecided,
            decision_method: Some(DecisionMethod::NoPolicyEvidence),
            decision_evidence_spans: Vec::new(),
        };
        assert!(decision.get_canonical_codes_for_compare().is_empty());
    }

    #[test]
    fn decided_decision_returns_decided_codes_not_recalled() {
        let decision = CancerCanonicalDecision {
            coverage_name_raw: "암진단비".into(),
            insurer_code: "SAMSUNG".into(),
            recalled_candidates: HashSet::from([
                CancerCanonical::General,
                CancerCanonical::Similar,
                CancerCanonical::InSitu,
                CancerCanonical::Borderline,
            ]),
            decided_canonical_codes: HashSet::from([CancerCanonical::General]),
            decision_status: DecisionStatus::Decided,
            decision_method: Some(DecisionMethod::PolicyEvidence),
            decision_evidence_spans: Vec::new(),
        };
        assert_eq!(decision.get_canonical_codes_for_compare(), HashSet::from([CancerCanonical::General]));
    }

    #[test]
    fn decide_from_evidence_extracts_separate_benefit_in_situ() {
        let spans = vec![RawEvidenceSpan {
            doc_id: "DOC1".into(),
            page: 5,
            span_text: "제자리암 진단비는 유사암과 별도로 지급한다.".into(),
        }];
        let (decided, _) = decide_from_evidence(&spans);
        assert!(decided.contains(&CancerCanonical::InSitu));
    }

    #[test]
    fn decide_from_evidence_extracts_general_from_definition() {
        let spans = vec![RawEvidenceSpan {
            doc_id: "DOC1".into(),
            page: 3,
            span_text: "일반암은 다음과 같이 정의한다.".into(),
        }];
        let (decided, _) = decide_from_evidence(&spans);
        assert!(decided.contains(&CancerCanonical::General));
    }
}
