//! Deterministic query → canonical code resolution (spec §4.10 step 1).
//! No LLM, no similarity matching — a fixed keyword table only, grounded
//! on the original router's `QUERY_RESOLUTION_RULES` dict, extended to
//! the full set of cancer canonicals it left implicit.

use covcmp_registry::{CancerCanonical, CanonicalCoverageCode};

const QUERY_RESOLUTION_RULES: &[(&str, CancerCanonical)] = &[
    ("일반암진단비", CancerCanonical::General),
    ("유사암진단금", CancerCanonical::Similar),
    ("유사암진단비", CancerCanonical::Similar),
    ("제자리암진단비", CancerCanonical::InSitu),
    ("경계성종양진단비", CancerCanonical::Borderline),
];

/// Resolve a user query to a canonical coverage code via exact-match
/// lookup only. Returns `None` (never a guess) when the trimmed query
/// isn't one of the fixed keys — callers fall back to raw-name lookup.
pub fn resolve_query_to_canonical(query: &str) -> Option<CanonicalCoverageCode> {
    let trimmed = query.trim();
    QUERY_RESOLUTION_RULES
        .iter()
        .find(|(key, _)| *key == trimmed)
        .map(|(_, canonical)| CanonicalCoverageCode::Cancer(*canonical))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_general_cancer_query() {
        assert_eq!(
            resolve_query_to_canonical("일반암진단비"),
            Some(CanonicalCoverageCode::Cancer(CancerCanonical::General))
        );
    }

    #[test]
    fn unknown_query_resolves_to_none() {
        assert_eq!(resolve_query_to_canonical("다빈치 수술비"), None);
    }

    #[test]
    fn trims_surrounding_whitespace() {
        assert!(resolve_query_to_canonical("  일반암진단비  ").is_some());
    }
}
