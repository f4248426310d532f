//! Compare Orchestrator (spec §4.10): given a compiled request, resolve
//! proposal coverage per insurer via the Universe Lock and emit a
//! `ComparisonResult` from the closed decision table — generalized to N
//! insurers by `crate::overlap` for the 3+ case.

use covcmp_contracts::{ComparisonResult, NextAction, UxMessageCode};
use covcmp_registry::InsurerCode;
use covcmp_universe::{FullCoverage, MappingStatus};

/// A disease-scope indicator is present either as a structured
/// `disease_scope_norm` or as raw text that doesn't already read as a
/// resolved exclusion (a trailing "제외" means the scope question was
/// already settled in the proposal itself — see Scenario A vs Scenario C
/// in spec §8, and the decision recorded in DESIGN.md).
fn has_disease_scope_indicator(coverage: &FullCoverage) -> bool {
    let Some(slots) = &coverage.slots else { return false };
    if slots.disease_scope_norm.is_some() {
        return true;
    }
    slots
        .disease_scope_raw
        .as_deref()
        .map(|raw| !raw.trim().ends_with("제외"))
        .unwrap_or(false)
}

fn is_unmapped_or_ambiguous(coverage: &FullCoverage) -> bool {
    matches!(coverage.mapping.mapping_status, MappingStatus::Unmapped | MappingStatus::Ambiguous)
}

/// Outcome of comparing two (or one) insurers' proposal coverage for a
/// single query.
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonOutcome {
    pub comparison_result: ComparisonResult,
    pub next_action: NextAction,
    pub ux_message_code: UxMessageCode,
    pub message: String,
}

/// Spec §4.10's decision tree, two-insurer form.
pub fn determine_comparison_result(
    coverage_a: Option<&FullCoverage>,
    coverage_b: Option<&FullCoverage>,
    query: &str,
    insurer_a: InsurerCode,
) -> ComparisonOutcome {
    let Some(coverage_a) = coverage_a else {
        return ComparisonOutcome {
            comparison_result: ComparisonResult::OutOfUniverse,
            next_action: NextAction::RequestMoreInfo,
            ux_message_code: UxMessageCode::CoverageNotInUniverse,
            message: format!("'{query}' coverage not found in {insurer_a} proposal universe"),
        };
    };

    let Some(coverage_b) = coverage_b else {
        if is_unmapped_or_ambiguous(coverage_a) {
            return ComparisonOutcome {
                comparison_result: ComparisonResult::Unmapped,
                next_action: NextAction::RequestMoreInfo,
                ux_message_code: UxMessageCode::CoverageUnmapped,
                message: format!(
                    "{} is not mapped to a canonical coverage code",
                    coverage_a.coverage.raw_coverage_name
                ),
            };
        }
        if has_disease_scope_indicator(coverage_a) {
            return ComparisonOutcome {
                comparison_result: ComparisonResult::PolicyRequired,
                next_action: NextAction::VerifyPolicy,
                ux_message_code: UxMessageCode::DiseaseScopeVerificationRequired,
                message: format!(
                    "disease scope verification required for {}",
                    coverage_a.coverage.raw_coverage_name
                ),
            };
        }
        return ComparisonOutcome {
            comparison_result: ComparisonResult::Comparable,
            next_action: NextAction::Compare,
            ux_message_code: UxMessageCode::CoverageFoundSingleInsurer,
            message: format!("{} found in {insurer_a}", coverage_a.coverage.raw_coverage_name),
        };
    };

    if is_unmapped_or_ambiguous(coverage_a) || is_unmapped_or_ambiguous(coverage_b) {
        let unmapped_name = if is_unmapped_or_ambiguous(coverage_a) {
            &coverage_a.coverage.raw_coverage_name
        } else {
            &coverage_b.coverage.raw_coverage_name
        };
        return ComparisonOutcome {
            comparison_result: ComparisonResult::Unmapped,
            next_action: NextAction::RequestMoreInfo,
            ux_message_code: UxMessageCode::CoverageUnmapped,
            message: format!("{unmapped_name} is not mapped to a canonical coverage code"),
        };
    }

    let codes_equal = match (&coverage_a.mapping.canonical_coverage_code, &coverage_b.mapping.canonical_coverage_code) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    };

    if codes_equal {
        if has_disease_scope_indicator(coverage_a) || has_disease_scope_indicator(coverage_b) {
            return ComparisonOutcome {
                comparison_result: ComparisonResult::ComparableWithGaps,
                next_action: NextAction::VerifyPolicy,
                ux_message_code: UxMessageCode::CoverageComparableWithGaps,
                message: "coverage comparison possible but disease scope verification required".to_string(),
            };
        }
        return ComparisonOutcome {
            comparison_result: ComparisonResult::Comparable,
            next_action: NextAction::Compare,
            ux_message_code: UxMessageCode::CoverageMatchComparable,
            message: format!(
                "both insurers have {}",
                coverage_a.mapping.canonical_coverage_code.as_ref().unwrap()
            ),
        };
    }

    ComparisonOutcome {
        comparison_result: ComparisonResult::NonComparable,
        next_action: NextAction::RequestMoreInfo,
        ux_message_code: UxMessageCode::CoverageTypeMismatch,
        message: "different coverage types".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use covcmp_registry::{CancerCanonical, CanonicalCoverageCode};
    use covcmp_universe::{CoverageMapping, CoverageSlots, DiseaseScopeNorm, MappingEvidence, ProposalCoverage, SourceConfidence};

    fn evidence() -> MappingEvidence {
        MappingEvidence { lookup_key: "일반암진단비".into(), matched_alias: None, source_file: None, match_type: "exact".into() }
    }

    fn coverage(insurer: InsurerCode, amount: i64, raw_scope: Option<&str>, mapped: bool) -> FullCoverage {
        let mapping = if mapped {
            CoverageMapping::mapped(CanonicalCoverageCode::Cancer(CancerCanonical::General), evidence())
        } else {
            CoverageMapping::unmapped(evidence())
        };
        let mut slots = CoverageSlots::empty(SourceConfidence::ProposalConfirmed);
        slots.disease_scope_raw = raw_scope.map(str::to_string);
        FullCoverage {
            coverage: ProposalCoverage {
                insurer,
                proposal_id: "P-1".into(),
                raw_coverage_name: "일반암진단비".into(),
                normalized_name: "일반암진단비".into(),
                currency: "KRW".into(),
                amount_value: amount,
                payout_amount_unit: "원".into(),
                source_page: 4,
                span_text: "일반암진단비".into(),
                content_hash: "h".into(),
            },
            mapping,
            slots: if mapped { Some(slots) } else { None },
        }
    }

    #[test]
    fn scenario_a_comparable_when_resolved_exclusion_raw_text() {
        let a = coverage(InsurerCode::Samsung, 30_000_000, Some("유사암 제외"), true);
        let b = coverage(InsurerCode::Meritz, 20_000_000, Some("유사암 제외"), true);
        let outcome = determine_comparison_result(Some(&a), Some(&b), "일반암진단비", InsurerCode::Samsung);
        assert_eq!(outcome.comparison_result, ComparisonResult::Comparable);
        assert_eq!(outcome.next_action, NextAction::Compare);
        assert_eq!(outcome.ux_message_code, UxMessageCode::CoverageMatchComparable);
    }

    #[test]
    fn scenario_b_unmapped_coverage_on_either_side() {
        let a = coverage(InsurerCode::Samsung, 30_000_000, None, false);
        let b = coverage(InsurerCode::Meritz, 20_000_000, None, false);
        let outcome = determine_comparison_result(Some(&a), Some(&b), "특정 생소한 담보", InsurerCode::Samsung);
        assert_eq!(outcome.comparison_result, ComparisonResult::Unmapped);
        assert_eq!(outcome.ux_message_code, UxMessageCode::CoverageUnmapped);
    }

    #[test]
    fn scenario_c_policy_required_for_unresolved_single_insurer_scope() {
        let a = coverage(InsurerCode::Samsung, 10_000_000, Some("유사암"), true);
        let outcome = determine_comparison_result(Some(&a), None, "유사암진단금", InsurerCode::Samsung);
        assert_eq!(outcome.comparison_result, ComparisonResult::PolicyRequired);
        assert_eq!(outcome.next_action, NextAction::VerifyPolicy);
        assert_eq!(outcome.ux_message_code, UxMessageCode::DiseaseScopeVerificationRequired);
    }

    #[test]
    fn scenario_d_out_of_universe_when_coverage_a_missing() {
        let outcome = determine_comparison_result(None, None, "다빈치 수술비", InsurerCode::Samsung);
        assert_eq!(outcome.comparison_result, ComparisonResult::OutOfUniverse);
        assert_eq!(outcome.next_action, NextAction::RequestMoreInfo);
        assert_eq!(outcome.ux_message_code, UxMessageCode::CoverageNotInUniverse);
    }

    #[test]
    fn different_canonical_codes_are_non_comparable() {
        let a = coverage(InsurerCode::Samsung, 10_000_000, None, true);
        let mut b = coverage(InsurerCode::Meritz, 10_000_000, None, true);
        b.mapping = CoverageMapping::mapped(CanonicalCoverageCode::Cancer(CancerCanonical::Similar), evidence());
        let outcome = determine_comparison_result(Some(&a), Some(&b), "암진단비", InsurerCode::Samsung);
        assert_eq!(outcome.comparison_result, ComparisonResult::NonComparable);
        assert_eq!(outcome.ux_message_code, UxMessageCode::CoverageTypeMismatch);
    }

    #[test]
    fn structured_disease_scope_norm_forces_gaps_even_without_raw_hint() {
        let mut a = coverage(InsurerCode::Samsung, 10_000_000, None, true);
        a.slots.as_mut().unwrap().disease_scope_norm =
            Some(DiseaseScopeNorm { include_group_id: "g1".into(), exclude_group_id: None });
        let b = coverage(InsurerCode::Meritz, 10_000_000, None, true);
        let outcome = determine_comparison_result(Some(&a), Some(&b), "일반암진단비", InsurerCode::Samsung);
        assert_eq!(outcome.comparison_result, ComparisonResult::ComparableWithGaps);
        assert_eq!(outcome.next_action, NextAction::VerifyPolicy);
    }
}
