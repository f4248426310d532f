//! Canonical Split Mapper (spec §4.5): evidence → canonical cancer code(s).
//!
//! Constitutional rule (AH-3): a [`CancerScopeEvidence`] whose confidence is
//! [`EvidenceConfidence::Unknown`] can never carry an `includes_*` flag set
//! to true. The validating constructor is the only way to build one, so the
//! invariant cannot be bypassed deep in the pipeline.

use covcmp_registry::CancerCanonical;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use thiserror::Error;

/// Confidence tier attached to a scope determination (spec §4.4/§4.5).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceConfidence {
    EvidenceStrong,
    EvidenceWeak,
    Unknown,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error(
    "AH-3 constitutional violation: confidence=unknown cannot have includes_*=true; evidence required for scope determination"
)]
pub struct InvalidEvidenceState;

/// One policy span backing an evidence-based scope decision (spec §4.4,
/// §6 "Evidence span" shape).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvidenceSpanRecord {
    pub doc_id: String,
    pub page: i32,
    pub span_text: String,
    pub rule_id: String,
    pub evidence_type: String,
}

/// Name-derived hint (spec §4.4): debug/audit only, never a compare input —
/// mirrors the original's explicit warning that this must not feed
/// canonical-code determination.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NameBasedHint {
    pub mentions_in_situ: bool,
    pub mentions_borderline: bool,
    pub mentions_similar: bool,
    pub mentions_general: bool,
    pub mentions_exclusion: bool,
    pub raw_name: Option<String>,
}

/// Evidence-based cancer coverage scope determination (spec §4.4-§4.5).
/// Construction through [`CancerScopeEvidence::new`] is the only path —
/// there is no public way to flip an `includes_*` flag after the fact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancerScopeEvidence {
    includes_general: bool,
    includes_similar: bool,
    includes_in_situ: bool,
    includes_borderline: bool,
    pub evidence_spans: Vec<EvidenceSpanRecord>,
    pub confidence: EvidenceConfidence,
    pub hint: Option<NameBasedHint>,
}

impl CancerScopeEvidence {
    /// Validates AH-3 at construction time: `confidence == Unknown` forbids
    /// any `includes_*` flag being true.
    pub fn new(
        includes_general: bool,
        includes_similar: bool,
        includes_in_situ: bool,
        includes_borderline: bool,
        evidence_spans: Vec<EvidenceSpanRecord>,
        confidence: EvidenceConfidence,
        hint: Option<NameBasedHint>,
    ) -> Result<Self, InvalidEvidenceState> {
        if confidence == EvidenceConfidence::Unknown
            && (includes_general || includes_similar || includes_in_situ || includes_borderline)
        {
            return Err(InvalidEvidenceState);
        }
        Ok(Self {
            includes_general,
            includes_similar,
            includes_in_situ,
            includes_borderline,
            evidence_spans,
            confidence,
            hint,
        })
    }

    pub fn includes_general(&self) -> bool {
        self.includes_general
    }
    pub fn includes_similar(&self) -> bool {
        self.includes_similar
    }
    pub fn includes_in_situ(&self) -> bool {
        self.includes_in_situ
    }
    pub fn includes_borderline(&self) -> bool {
        self.includes_borderline
    }

    /// Project the four scope flags onto a single canonical code.
    ///
    /// - Exactly one flag set → that code.
    /// - Zero or more than one flag set (ambiguous, or unknown) → `None`,
    ///   meaning "needs manual resolution" (spec §4.5).
    pub fn get_canonical_code(&self) -> Option<CancerCanonical> {
        let matched: Vec<CancerCanonical> = [
            (self.includes_general, CancerCanonical::General),
            (self.includes_similar, CancerCanonical::Similar),
            (self.includes_in_situ, CancerCanonical::InSitu),
            (self.includes_borderline, CancerCanonical::Borderline),
        ]
        .into_iter()
        .filter_map(|(included, code)| included.then_some(code))
        .collect();

        if matched.len() == 1 {
            Some(matched[0])
        } else {
            None
        }
    }
}

/// How a set of canonical codes for a raw coverage name was derived —
/// kept distinct from the evidence-backed path so a caller can never
/// silently treat a guess as a decision (spec §4.5).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitMethod {
    PolicyEvidence,
    Heuristic,
    LegacyMapping,
}

/// Result of [`split_cancer_coverage_by_scope`]: the codes plus how they
/// were derived, so downstream compare logic can refuse the heuristic path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SplitResult {
    pub codes: HashSet<CancerCanonical>,
    pub method: SplitMethod,
}

/// Split a raw cancer coverage name into canonical codes.
///
/// Evidence-based determination is always preferred; the heuristic branch
/// below is NOT constitutional — it exists only for backward compatibility
/// with coverage rows that have no policy evidence on file yet (spec §4.5).
pub fn split_cancer_coverage_by_scope(
    coverage_name_raw: &str,
    evidence: Option<&CancerScopeEvidence>,
) -> SplitResult {
    if let Some(evidence) = evidence {
        let codes = match evidence.get_canonical_code() {
            Some(code) => HashSet::from([code]),
            None => HashSet::new(),
        };
        return SplitResult { codes, method: SplitMethod::PolicyEvidence };
    }

    let name_lower: String =
        coverage_name_raw.to_lowercase().chars().filter(|c| !c.is_whitespace()).collect();

    let mut codes: HashSet<CancerCanonical> = HashSet::new();

    if name_lower.contains("유사암") {
        codes.insert(CancerCanonical::Similar);
    }
    if name_lower.contains("제자리암") {
        codes.insert(CancerCanonical::InSitu);
    }
    if name_lower.contains("경계성종양") || name_lower.contains("경계성") {
        codes.insert(CancerCanonical::Borderline);
    }
    if (name_lower.contains("암진단") || name_lower.contains("일반암")) && codes.is_empty() {
        codes.insert(CancerCanonical::General);
    }
    if name_lower.contains("유사암제외") || name_lower.contains("유사암 제외") {
        codes.remove(&CancerCanonical::Similar);
        if codes.is_empty() {
            codes.insert(CancerCanonical::General);
        }
    }

    SplitResult { codes, method: SplitMethod::Heuristic }
}

/// Result of mapping one coverage instance to its canonical code(s)
/// (spec §4.5 "Canonical Split Mapper"), across the full priority chain:
/// policy evidence, then name heuristic, then legacy Excel mapping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoverageSplitResult {
    pub original_coverage_name: String,
    pub canonical_codes: HashSet<CancerCanonical>,
    pub evidence: Option<CancerScopeEvidence>,
    pub split_method: SplitMethod,
}

impl CoverageSplitResult {
    pub fn is_ambiguous(&self) -> bool {
        self.canonical_codes.len() > 1
    }

    pub fn is_unmapped(&self) -> bool {
        self.canonical_codes.is_empty()
    }

    /// `Some` only when exactly one canonical code applies; ambiguous and
    /// unmapped results both yield `None` rather than guessing.
    pub fn get_primary_canonical_code(&self) -> Option<CancerCanonical> {
        if self.canonical_codes.len() == 1 {
            self.canonical_codes.iter().next().copied()
        } else {
            None
        }
    }
}

/// Map one coverage instance to canonical code(s), trying policy evidence
/// first, the name heuristic second, and the legacy alias-code mapping
/// last (spec §4.5 priority chain). `legacy_alias_code` is the raw alias
/// workbook code (e.g. `A4210`) carried on the coverage row, if any.
pub fn split_coverage(
    coverage_name_raw: &str,
    policy_documents: &[crate::scope_detector::PolicyDocumentChunk],
    legacy_alias_code: Option<&str>,
) -> CoverageSplitResult {
    if let Some(evidence) = crate::scope_detector::build_scope_evidence_from_policy(policy_documents) {
        let split = split_cancer_coverage_by_scope(coverage_name_raw, Some(&evidence));
        if !split.codes.is_empty() {
            return CoverageSplitResult {
                original_coverage_name: coverage_name_raw.to_string(),
                canonical_codes: split.codes,
                evidence: Some(evidence),
                split_method: SplitMethod::PolicyEvidence,
            };
        }
    }

    let heuristic = split_cancer_coverage_by_scope(coverage_name_raw, None);
    if !heuristic.codes.is_empty() {
        return CoverageSplitResult {
            original_coverage_name: coverage_name_raw.to_string(),
            canonical_codes: heuristic.codes,
            evidence: None,
            split_method: SplitMethod::Heuristic,
        };
    }

    if let Some(code) = legacy_alias_code.and_then(|c| legacy_to_canonical_map().get(c).copied()) {
        return CoverageSplitResult {
            original_coverage_name: coverage_name_raw.to_string(),
            canonical_codes: HashSet::from([code]),
            evidence: None,
            split_method: SplitMethod::LegacyMapping,
        };
    }

    CoverageSplitResult {
        original_coverage_name: coverage_name_raw.to_string(),
        canonical_codes: HashSet::new(),
        evidence: None,
        split_method: SplitMethod::Heuristic,
    }
}

/// Summary counters over a batch of [`CoverageSplitResult`]s (spec §4.5,
/// used by the admin workbench to triage unmapped/ambiguous coverages).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SplitReport {
    pub total_coverages: usize,
    pub split_by_method: HashMap<String, usize>,
    pub ambiguous_count: usize,
    pub unmapped_count: usize,
    pub canonical_distribution: HashMap<String, usize>,
}

pub fn generate_split_report(results: &[CoverageSplitResult]) -> SplitReport {
    let mut split_by_method: HashMap<String, usize> = HashMap::new();
    let mut canonical_distribution: HashMap<String, usize> = HashMap::new();
    let mut ambiguous_count = 0;
    let mut unmapped_count = 0;

    for result in results {
        let method_key = match result.split_method {
            SplitMethod::PolicyEvidence => "policy_evidence",
            SplitMethod::Heuristic => "heuristic",
            SplitMethod::LegacyMapping => "legacy_mapping",
        };
        *split_by_method.entry(method_key.to_string()).or_insert(0) += 1;

        if result.is_ambiguous() {
            ambiguous_count += 1;
        }
        if result.is_unmapped() {
            unmapped_count += 1;
        }
        for code in &result.canonical_codes {
            *canonical_distribution.entry(code.code().to_string()).or_insert(0) += 1;
        }
    }

    SplitReport {
        total_coverages: results.len(),
        split_by_method,
        ambiguous_count,
        unmapped_count,
        canonical_distribution,
    }
}

/// Legacy alias-code → canonical mapping kept for backward compatibility
/// with the pre-AH-3 Excel mapping workbook (spec §2 row 3 "legacy code
/// maps"). Never used for evidence-backed decisions — only as a last
/// resort when a proposal alias carries one of these historical codes and
/// no evidence-backed split exists yet.
pub fn legacy_to_canonical_map() -> HashMap<&'static str, CancerCanonical> {
    HashMap::from([
        ("A4200_1", CancerCanonical::General),
        ("A4210", CancerCanonical::Similar),
        ("A4209", CancerCanonical::General),
        ("A4299_1", CancerCanonical::General),
    ])
}

pub fn canonical_display_name(code: CancerCanonical) -> &'static str {
    match code {
        CancerCanonical::General => "일반암진단비 (유사암/제자리암/경계성종양 제외)",
        CancerCanonical::Similar => "유사암진단비 (갑상선암, 기타피부암 등)",
        CancerCanonical::InSitu => "제자리암진단비",
        CancerCanonical::Borderline => "경계성종양진단비",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_confidence_with_any_flag_true_is_rejected() {
        let err = CancerScopeEvidence::new(true, false, false, false, vec![], EvidenceConfidence::Unknown, None)
            .unwrap_err();
        assert_eq!(err, InvalidEvidenceState);
    }

    #[test]
    fn unknown_confidence_with_all_flags_false_is_accepted() {
        let evidence =
            CancerScopeEvidence::new(false, false, false, false, vec![], EvidenceConfidence::Unknown, None)
                .unwrap();
        assert_eq!(evidence.get_canonical_code(), None);
    }

    #[test]
    fn single_flag_projects_to_single_canonical_code() {
        let evidence = CancerScopeEvidence::new(
            false,
            true,
            false,
            false,
            vec![],
            EvidenceConfidence::EvidenceStrong,
            None,
        )
        .unwrap();
        assert_eq!(evidence.get_canonical_code(), Some(CancerCanonical::Similar));
    }

    #[test]
    fn multiple_flags_are_ambiguous() {
        let evidence = CancerScopeEvidence::new(
            true,
            true,
            false,
            false,
            vec![],
            EvidenceConfidence::EvidenceStrong,
            None,
        )
        .unwrap();
        assert_eq!(evidence.get_canonical_code(), None);
    }

    #[test]
    fn split_with_evidence_is_tagged_policy_evidence() {
        let evidence = CancerScopeEvidence::new(
            false,
            false,
            true,
            false,
            vec![],
            EvidenceConfidence::EvidenceStrong,
            None,
        )
        .unwrap();
        let result = split_cancer_coverage_by_scope("암진단비", Some(&evidence));
        assert_eq!(result.method, SplitMethod::PolicyEvidence);
        assert_eq!(result.codes, HashSet::from([CancerCanonical::InSitu]));
    }

    #[test]
    fn split_without_evidence_falls_back_to_heuristic() {
        let result = split_cancer_coverage_by_scope("유사암진단비", None);
        assert_eq!(result.method, SplitMethod::Heuristic);
        assert_eq!(result.codes, HashSet::from([CancerCanonical::Similar]));
    }

    #[test]
    fn heuristic_exclusion_clause_falls_back_to_general() {
        let result = split_cancer_coverage_by_scope("암진단비(유사암제외)", None);
        assert_eq!(result.method, SplitMethod::Heuristic);
        assert_eq!(result.codes, HashSet::from([CancerCanonical::General]));
    }

    #[test]
    fn legacy_map_covers_known_codes() {
        let map = legacy_to_canonical_map();
        assert_eq!(map.get("A4210"), Some(&CancerCanonical::Similar));
        assert_eq!(map.get("A4200_1"), Some(&CancerCanonical::General));
    }

    #[test]
    fn split_coverage_falls_back_through_the_full_priority_chain() {
        let policy_result = split_coverage("유사암진단비", &[], None);
        assert_eq!(policy_result.split_method, SplitMethod::Heuristic);
        assert_eq!(policy_result.canonical_codes, HashSet::from([CancerCanonical::Similar]));

        let legacy_result = split_coverage("알수없는담보명", &[], Some("A4210"));
        assert_eq!(legacy_result.split_method, SplitMethod::LegacyMapping);
        assert_eq!(legacy_result.canonical_codes, HashSet::from([CancerCanonical::Similar]));

        let unmapped_result = split_coverage("알수없는담보명", &[], None);
        assert!(unmapped_result.is_unmapped());
    }

    #[test]
    fn split_report_counts_methods_and_ambiguity() {
        let results = vec![
            split_coverage("유사암진단비", &[], None),
            split_coverage("알수없는담보명", &[], Some("A4210")),
            split_coverage("알수없는담보명", &[], None),
        ];
        let report = generate_split_report(&results);
        assert_eq!(report.total_coverages, 3);
        assert_eq!(report.unmapped_count, 1);
        assert_eq!(report.split_by_method.get("heuristic"), Some(&1));
        assert_eq!(report.split_by_method.get("legacy_mapping"), Some(&1));
    }
}
