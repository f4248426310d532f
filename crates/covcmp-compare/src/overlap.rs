//! Multi-party overlap (spec §4.11): once a third insurer enters a
//! comparison, a single pairwise decision isn't enough — every pair's
//! disease-scope group membership has to agree before the whole set can
//! be called comparable. This module computes the aggregate state and
//! renders the Korean explanation text, guarded against the five phrases
//! that would read as a recommendation rather than a comparison.

use covcmp_foundation::error::CoreError;
use covcmp_registry::InsurerCode;
use once_cell::sync::Lazy;

/// A disease-code scope as the insurer's proposal/policy actually states
/// it: which groups are included, which are explicitly excluded.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ScopeGroups {
    pub include_group_id: Option<String>,
    pub exclude_group_id: Option<String>,
    pub include_codes: Vec<String>,
    pub exclude_codes: Vec<String>,
}

/// Result of comparing two insurers' scope groups for the same coverage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairOverlapState {
    Unknown,
    FullMatch,
    NoOverlap,
    PartialOverlap,
}

/// Aggregate state across every pair in an N-party comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateOverlapState {
    Unknown,
    FullMatch,
    NoOverlap,
    PartialOverlap,
}

/// Determine how two insurers' disease-scope groups relate. `Unknown`
/// when either side never resolved its scope groups at all — we cannot
/// claim a relationship we haven't actually observed.
pub fn pairwise_overlap(a: &ScopeGroups, b: &ScopeGroups) -> PairOverlapState {
    let a_resolved = a.include_group_id.is_some() || !a.include_codes.is_empty();
    let b_resolved = b.include_group_id.is_some() || !b.include_codes.is_empty();
    if !a_resolved || !b_resolved {
        return PairOverlapState::Unknown;
    }

    if a.include_group_id == b.include_group_id && a.exclude_group_id == b.exclude_group_id {
        return PairOverlapState::FullMatch;
    }

    let a_included: std::collections::HashSet<&str> = a.include_codes.iter().map(String::as_str).collect();
    let b_included: std::collections::HashSet<&str> = b.include_codes.iter().map(String::as_str).collect();
    let a_excluded: std::collections::HashSet<&str> = a.exclude_codes.iter().map(String::as_str).collect();
    let b_excluded: std::collections::HashSet<&str> = b.exclude_codes.iter().map(String::as_str).collect();

    let effective_a: std::collections::HashSet<&str> = a_included.difference(&a_excluded).copied().collect();
    let effective_b: std::collections::HashSet<&str> = b_included.difference(&b_excluded).copied().collect();

    if effective_a.intersection(&effective_b).count() == 0 {
        return PairOverlapState::NoOverlap;
    }
    if effective_a == effective_b {
        return PairOverlapState::FullMatch;
    }
    PairOverlapState::PartialOverlap
}

/// Fold every pairwise state into a single aggregate for the whole group
/// of insurers: any `Unknown` wins (we can't assert comparability we
/// haven't checked), else any `NoOverlap` wins, else all `FullMatch` is
/// required for `FullMatch`, otherwise `PartialOverlap`.
pub fn aggregate_overlap(pairs: &[PairOverlapState]) -> AggregateOverlapState {
    if pairs.iter().any(|p| *p == PairOverlapState::Unknown) {
        return AggregateOverlapState::Unknown;
    }
    if pairs.iter().any(|p| *p == PairOverlapState::NoOverlap) {
        return AggregateOverlapState::NoOverlap;
    }
    if pairs.iter().all(|p| *p == PairOverlapState::FullMatch) {
        return AggregateOverlapState::FullMatch;
    }
    AggregateOverlapState::PartialOverlap
}

/// Comparison state surfaced to the caller, distinct from the two-party
/// [`covcmp_contracts::ComparisonResult`] because overlap runs across an
/// arbitrary number of insurers rather than exactly two.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MultiPartyComparisonState {
    Comparable,
    ComparableWithGaps,
    NonComparable,
}

pub fn comparison_state_for(aggregate: AggregateOverlapState) -> MultiPartyComparisonState {
    match aggregate {
        AggregateOverlapState::FullMatch => MultiPartyComparisonState::Comparable,
        AggregateOverlapState::PartialOverlap => MultiPartyComparisonState::ComparableWithGaps,
        AggregateOverlapState::NoOverlap => MultiPartyComparisonState::NonComparable,
        AggregateOverlapState::Unknown => MultiPartyComparisonState::ComparableWithGaps,
    }
}

/// Korean phrases that would read as a recommendation rather than a
/// neutral comparison (spec §4.11, §4.13, §7). Closed list — never
/// derived, never extended at runtime.
const FORBIDDEN_PHRASES: &[&str] = &["가장 넓은", "가장 유리", "추천", "더 나은", "더 좋은"];

static FORBIDDEN_PHRASE_SET: Lazy<Vec<&'static str>> = Lazy::new(|| FORBIDDEN_PHRASES.to_vec());

/// Reject explanation text containing any forbidden phrase. This is a
/// hard `Result`, not a debug assertion — it must run in release builds
/// against every string about to leave this module.
pub fn check_no_forbidden_phrases(text: &str) -> Result<(), CoreError> {
    for phrase in FORBIDDEN_PHRASE_SET.iter() {
        if text.contains(phrase) {
            return Err(CoreError::PolicyViolation(format!(
                "explanation text contains forbidden phrase '{phrase}'"
            )));
        }
    }
    Ok(())
}

/// Render the neutral Korean explanation for a multi-party overlap
/// result, checked against the forbidden-phrase list before returning.
pub fn explain_overlap(
    insurers: &[InsurerCode],
    aggregate: AggregateOverlapState,
) -> Result<String, CoreError> {
    let names: Vec<String> = insurers.iter().map(|i| i.to_string()).collect();
    let joined = names.join(", ");
    let text = match aggregate {
        AggregateOverlapState::FullMatch => {
            format!("{joined} 모두 동일한 질병코드 그룹을 보장 범위로 사용합니다.")
        }
        AggregateOverlapState::PartialOverlap => {
            format!("{joined}의 질병코드 그룹이 일부만 일치하여 보장 범위에 차이가 있을 수 있습니다.")
        }
        AggregateOverlapState::NoOverlap => {
            format!("{joined}의 질병코드 그룹이 서로 겹치지 않아 비교할 수 없습니다.")
        }
        AggregateOverlapState::Unknown => {
            format!("{joined}의 질병코드 그룹을 확인할 수 없어 약관 확인이 필요합니다.")
        }
    };
    check_no_forbidden_phrases(&text)?;
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn groups(include: &[&str], exclude: &[&str]) -> ScopeGroups {
        ScopeGroups {
            include_group_id: Some(include.join(",")),
            exclude_group_id: if exclude.is_empty() { None } else { Some(exclude.join(",")) },
            include_codes: include.iter().map(|s| s.to_string()).collect(),
            exclude_codes: exclude.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn identical_groups_are_full_match() {
        let a = groups(&["C00", "C01"], &[]);
        let b = groups(&["C00", "C01"], &[]);
        assert_eq!(pairwise_overlap(&a, &b), PairOverlapState::FullMatch);
    }

    #[test]
    fn disjoint_groups_are_no_overlap() {
        let a = groups(&["C00"], &[]);
        let b = groups(&["C50"], &[]);
        assert_eq!(pairwise_overlap(&a, &b), PairOverlapState::NoOverlap);
    }

    #[test]
    fn unresolved_scope_is_unknown() {
        let a = ScopeGroups::default();
        let b = groups(&["C00"], &[]);
        assert_eq!(pairwise_overlap(&a, &b), PairOverlapState::Unknown);
    }

    #[test]
    fn partially_overlapping_codes_are_partial_overlap() {
        let a = groups(&["C00", "C01"], &[]);
        let b = groups(&["C00", "C02"], &[]);
        assert_eq!(pairwise_overlap(&a, &b), PairOverlapState::PartialOverlap);
    }

    #[test]
    fn effective_sets_equal_after_exclusion_are_full_match_despite_different_groups() {
        let a = groups(&["C00", "C73"], &["C73"]);
        let b = groups(&["C00", "C99"], &["C99"]);
        assert_eq!(pairwise_overlap(&a, &b), PairOverlapState::FullMatch);
    }

    #[test]
    fn scenario_e_three_insurer_partial_overlap_yields_comparable_with_gaps() {
        let a = groups(&["C00", "C01"], &[]);
        let b = groups(&["C00", "C01"], &[]);
        let c = groups(&["C00"], &[]);
        let pairs = [pairwise_overlap(&a, &b), pairwise_overlap(&a, &c), pairwise_overlap(&b, &c)];
        let aggregate = aggregate_overlap(&pairs);
        assert_eq!(aggregate, AggregateOverlapState::PartialOverlap);
        assert_eq!(comparison_state_for(aggregate), MultiPartyComparisonState::ComparableWithGaps);

        let insurers = [InsurerCode::Samsung, InsurerCode::Meritz, InsurerCode::Hanwha];
        let explanation = explain_overlap(&insurers, aggregate).unwrap();
        for phrase in FORBIDDEN_PHRASES {
            assert!(!explanation.contains(phrase), "explanation must never contain '{phrase}'");
        }
    }

    #[test]
    fn any_unknown_pair_makes_the_aggregate_unknown() {
        let pairs = [PairOverlapState::FullMatch, PairOverlapState::Unknown];
        assert_eq!(aggregate_overlap(&pairs), AggregateOverlapState::Unknown);
    }

    #[test]
    fn check_no_forbidden_phrases_rejects_recommendation_language() {
        assert!(check_no_forbidden_phrases("이 상품이 가장 유리합니다").is_err());
        assert!(check_no_forbidden_phrases("보장 범위를 비교했습니다").is_ok());
    }
}
