//! Cancer Scope Detector (spec §4.4): policy text → [`CancerScopeEvidence`].
//!
//! Policy (약관), never the proposal, determines coverage scope. Every
//! evidence span carried out of this module has a document id, page, and
//! span text — there is no path that produces a scope decision without them.

use crate::split_mapper::{CancerScopeEvidence, EvidenceConfidence, EvidenceSpanRecord, NameBasedHint};
use crate::typer::{classify_evidence, CancerEvidenceType};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// A policy text span to analyze, with the evidence metadata that must
/// travel with any scope decision derived from it (spec §4.4, §6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyTextSpan {
    pub document_id: String,
    pub page: i32,
    pub span_text: String,
    pub section: Option<String>,
}

fn compile(patterns: &[&str]) -> Vec<Regex> {
    patterns.iter().map(|p| Regex::new(p).unwrap()).collect()
}

static GENERAL_CANCER_PATTERNS: Lazy<Vec<Regex>> =
    Lazy::new(|| compile(&[r"일반암", r"악성신생물", r"C00\s*[-~]\s*C97"]));

static SIMILAR_CANCER_PATTERNS: Lazy<Vec<Regex>> =
    Lazy::new(|| compile(&[r"유사암", r"갑상선암", r"기타피부암", r"C73", r"C44"]));

static IN_SITU_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| compile(&[r"제자리암", r"상피내암", r"D0[0-9]"]));

static BORDERLINE_PATTERNS: Lazy<Vec<Regex>> =
    Lazy::new(|| compile(&[r"경계성종양", r"D3[0-9]", r"D4[0-9]"]));

static EXCLUSION_PATTERNS: Lazy<Vec<Regex>> =
    Lazy::new(|| compile(&[r"제외", r"않는", r"해당하지", r"대상이\s*아님"]));

static SIMILAR_SEPARATE: Lazy<Regex> = Lazy::new(|| Regex::new(r"유사암.*별도|별도.*유사암").unwrap());
static GENERAL_SEPARATE: Lazy<Regex> = Lazy::new(|| Regex::new(r"일반암.*별도|별도.*일반암").unwrap());
static SIMILAR_EXCLUSION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"유사암[^)]*제외|유사암.*은\s*제외").unwrap());
static IN_SITU_EXCLUSION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"제자리암[^)]*제외|제자리암.*은\s*제외").unwrap());
static BORDERLINE_EXCLUSION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"경계성종양[^)]*제외|경계성.*은\s*제외").unwrap());

fn any_match(text: &str, patterns: &[Regex]) -> bool {
    patterns.iter().any(|p| p.is_match(text))
}

/// Deterministic cancer scope detection from a single policy text span
/// (spec §4.4). Evidence type is classified first (AH-4) and governs how
/// the raw keyword hits are interpreted.
pub fn detect_scope_from_text(policy_text: &str, span: &PolicyTextSpan) -> CancerScopeEvidence {
    let text_lower = policy_text.to_lowercase();

    let type_result = classify_evidence(policy_text);
    let evidence_type = type_result.evidence_type;

    let mut includes_general = any_match(&text_lower, &GENERAL_CANCER_PATTERNS);
    let mut includes_similar = any_match(&text_lower, &SIMILAR_CANCER_PATTERNS);
    let mut includes_in_situ = any_match(&text_lower, &IN_SITU_PATTERNS);
    let mut includes_borderline = any_match(&text_lower, &BORDERLINE_PATTERNS);

    match evidence_type {
        CancerEvidenceType::DefinitionIncluded => {
            // "유사암은 ... 제자리암/경계성종양을 포함" — the parent scope
            // holds, but sub-types named inside the definition are not
            // separate canonicals.
            if includes_similar {
                includes_in_situ = false;
                includes_borderline = false;
            }
        }
        CancerEvidenceType::SeparateBenefit => {
            if SIMILAR_SEPARATE.is_match(&text_lower) {
                includes_similar = false;
            }
            if GENERAL_SEPARATE.is_match(&text_lower) {
                includes_general = false;
            }
        }
        CancerEvidenceType::Exclusion => {}
        CancerEvidenceType::Unknown => {
            if SIMILAR_SEPARATE.is_match(&text_lower) {
                includes_similar = false;
            }
            if GENERAL_SEPARATE.is_match(&text_lower) {
                includes_general = false;
            }
        }
    }

    let has_exclusion = any_match(&text_lower, &EXCLUSION_PATTERNS);
    if has_exclusion {
        if SIMILAR_EXCLUSION.is_match(&text_lower) {
            includes_similar = false;
        }
        if IN_SITU_EXCLUSION.is_match(&text_lower) {
            includes_in_situ = false;
        }
        if BORDERLINE_EXCLUSION.is_match(&text_lower) {
            includes_borderline = false;
        }
    }

    let has_any_match = includes_general || includes_similar || includes_in_situ || includes_borderline;
    let confidence = if has_any_match { EvidenceConfidence::EvidenceStrong } else { EvidenceConfidence::Unknown };

    let evidence_spans = if has_any_match {
        vec![EvidenceSpanRecord {
            doc_id: span.document_id.clone(),
            page: span.page,
            span_text: span.span_text.clone(),
            rule_id: "cancer_scope_detector_v2_ah4".to_string(),
            evidence_type: evidence_type.as_str().to_string(),
        }]
    } else {
        Vec::new()
    };

    CancerScopeEvidence::new(
        includes_general,
        includes_similar,
        includes_in_situ,
        includes_borderline,
        evidence_spans,
        confidence,
        None,
    )
    .expect("flags are empty whenever confidence is Unknown by construction above")
}

/// Debug/audit-only hint extracted from a raw coverage name. Spec §4.4 is
/// explicit that this must never feed a canonical-code decision.
pub fn extract_hint_from_coverage_name(coverage_name_raw: &str) -> NameBasedHint {
    let name_lower: String =
        coverage_name_raw.to_lowercase().chars().filter(|c| !c.is_whitespace()).collect();
    let strip = |s: &str| s.chars().filter(|c| !c.is_whitespace()).collect::<String>();

    NameBasedHint {
        mentions_similar: name_lower.contains("유사암"),
        mentions_in_situ: name_lower.contains("제자리암"),
        mentions_borderline: name_lower.contains("경계성종양") || name_lower.contains("경계성"),
        mentions_general: name_lower.contains("암진단") || name_lower.contains("일반암"),
        mentions_exclusion: ["유사암제외", "유사암 제외", "4대유사암제외"]
            .iter()
            .any(|p| name_lower.contains(&strip(p))),
        raw_name: Some(coverage_name_raw.to_string()),
    }
}

/// One source document chunk to scan for cancer scope evidence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyDocumentChunk {
    pub document_id: String,
    pub page: i32,
    pub text: String,
    pub section: Option<String>,
}

/// Aggregate scope evidence across every policy chunk supplied. Returns
/// `None` when not a single chunk produced a match — there is nothing to
/// decide from (spec §4.4).
pub fn build_scope_evidence_from_policy(policy_documents: &[PolicyDocumentChunk]) -> Option<CancerScopeEvidence> {
    if policy_documents.is_empty() {
        return None;
    }

    let mut includes_general = false;
    let mut includes_similar = false;
    let mut includes_in_situ = false;
    let mut includes_borderline = false;
    let mut all_evidence_spans = Vec::new();

    for doc in policy_documents {
        if doc.text.is_empty() {
            continue;
        }
        let span = PolicyTextSpan {
            document_id: doc.document_id.clone(),
            page: doc.page,
            span_text: doc.text.clone(),
            section: doc.section.clone(),
        };
        let evidence = detect_scope_from_text(&doc.text, &span);

        includes_general |= evidence.includes_general();
        includes_similar |= evidence.includes_similar();
        includes_in_situ |= evidence.includes_in_situ();
        includes_borderline |= evidence.includes_borderline();
        all_evidence_spans.extend(evidence.evidence_spans);
    }

    if all_evidence_spans.is_empty() {
        return None;
    }

    CancerScopeEvidence::new(
        includes_general,
        includes_similar,
        includes_in_situ,
        includes_borderline,
        all_evidence_spans,
        EvidenceConfidence::EvidenceStrong,
        None,
    )
    .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span(text: &str) -> PolicyTextSpan {
        PolicyTextSpan {
            document_id: "DOC1".to_string(),
            page: 12,
            span_text: text.to_string(),
            section: None,
        }
    }

    #[test]
    fn general_cancer_range_detected() {
        let evidence = detect_scope_from_text("악성신생물(C00~C97)에 대하여 보장한다.", &span("x"));
        assert!(evidence.includes_general());
    }

    #[test]
    fn definition_included_suppresses_sub_scopes_under_similar() {
        let text = "유사암은 갑상선암, 제자리암, 경계성종양을 포함하여 정의한다.";
        let evidence = detect_scope_from_text(text, &span(text));
        assert!(evidence.includes_similar());
        assert!(!evidence.includes_in_situ());
        assert!(!evidence.includes_borderline());
    }

    #[test]
    fn separate_benefit_allows_sub_scope_and_clears_parent_mention() {
        let text = "제자리암은 유사암과 별도로 지급한다.";
        let evidence = detect_scope_from_text(text, &span(text));
        assert!(evidence.includes_in_situ());
        assert!(!evidence.includes_similar());
    }

    #[test]
    fn exclusion_clears_similar_flag() {
        let text = "유사암(갑상선암 등)은 제외한다.";
        let evidence = detect_scope_from_text(text, &span(text));
        assert!(!evidence.includes_similar());
    }

    #[test]
    fn no_keyword_match_yields_unknown_confidence_and_no_evidence_spans() {
        let text = "본 계약의 만기는 100세이다.";
        let evidence = detect_scope_from_text(text, &span(text));
        assert_eq!(evidence.confidence, EvidenceConfidence::Unknown);
        assert!(evidence.evidence_spans.is_empty());
    }

    #[test]
    fn build_from_empty_document_list_returns_none() {
        assert!(build_scope_evidence_from_policy(&[]).is_none());
    }

    #[test]
    fn build_aggregates_across_chunks() {
        let docs = vec![
            PolicyDocumentChunk {
                document_id: "DOC1".into(),
                page: 1,
                text: "일반암은 악성신생물을 의미한다.".into(),
                section: None,
            },
            PolicyDocumentChunk {
                document_id: "DOC1".into(),
                page: 2,
                text: "제자리암은 별도로 지급한다.".into(),
                section: None,
            },
        ];
        let evidence = build_scope_evidence_from_policy(&docs).unwrap();
        assert!(evidence.includes_general());
        assert!(evidence.includes_in_situ());
        assert_eq!(evidence.evidence_spans.len(), 2);
    }
}
