//! Contract Registries (spec §4.14): four closed sets that are the single
//! source of truth for comparison_result, next_action, and ux_message_code
//! values. An unknown value anywhere in the pipeline is a fatal
//! `CoreError::Validation`, never a warning — this is what spec §8's
//! Testable Property 2 checks.

use covcmp_foundation::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// `comparison_result` — lower_snake_case by naming convention (spec §4.14).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonResult {
    Comparable,
    ComparableWithGaps,
    NonComparable,
    Unmapped,
    OutOfUniverse,
    PolicyRequired,
}

impl ComparisonResult {
    pub const ALL: [ComparisonResult; 6] = [
        ComparisonResult::Comparable,
        ComparisonResult::ComparableWithGaps,
        ComparisonResult::NonComparable,
        ComparisonResult::Unmapped,
        ComparisonResult::OutOfUniverse,
        ComparisonResult::PolicyRequired,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ComparisonResult::Comparable => "comparable",
            ComparisonResult::ComparableWithGaps => "comparable_with_gaps",
            ComparisonResult::NonComparable => "non_comparable",
            ComparisonResult::Unmapped => "unmapped",
            ComparisonResult::OutOfUniverse => "out_of_universe",
            ComparisonResult::PolicyRequired => "policy_required",
        }
    }
}

impl fmt::Display for ComparisonResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// `next_action` — UPPER_SNAKE_CASE by naming convention (spec §4.14).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NextAction {
    Compare,
    RequestMoreInfo,
    VerifyPolicy,
}

impl NextAction {
    pub const ALL: [NextAction; 3] =
        [NextAction::Compare, NextAction::RequestMoreInfo, NextAction::VerifyPolicy];

    pub fn as_str(&self) -> &'static str {
        match self {
            NextAction::Compare => "COMPARE",
            NextAction::RequestMoreInfo => "REQUEST_MORE_INFO",
            NextAction::VerifyPolicy => "VERIFY_POLICY",
        }
    }
}

impl fmt::Display for NextAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// `ux_message_code` — UPPER_SNAKE_CASE (spec §4.10, §4.14). The set is
/// derived from the source constants (spec §9 Open Question): any code
/// used by a caller but missing here must be added deliberately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UxMessageCode {
    CoverageMatchComparable,
    CoverageUnmapped,
    DiseaseScopeVerificationRequired,
    CoverageNotInUniverse,
    CoverageTypeMismatch,
    CoverageComparableWithGaps,
    CoverageFoundSingleInsurer,
}

impl UxMessageCode {
    pub const ALL: [UxMessageCode; 7] = [
        UxMessageCode::CoverageMatchComparable,
        UxMessageCode::CoverageUnmapped,
        UxMessageCode::DiseaseScopeVerificationRequired,
        UxMessageCode::CoverageNotInUniverse,
        UxMessageCode::CoverageTypeMismatch,
        UxMessageCode::CoverageComparableWithGaps,
        UxMessageCode::CoverageFoundSingleInsurer,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            UxMessageCode::CoverageMatchComparable => "COVERAGE_MATCH_COMPARABLE",
            UxMessageCode::CoverageUnmapped => "COVERAGE_UNMAPPED",
            UxMessageCode::DiseaseScopeVerificationRequired => {
                "DISEASE_SCOPE_VERIFICATION_REQUIRED"
            }
            UxMessageCode::CoverageNotInUniverse => "COVERAGE_NOT_IN_UNIVERSE",
            UxMessageCode::CoverageTypeMismatch => "COVERAGE_TYPE_MISMATCH",
            UxMessageCode::CoverageComparableWithGaps => "COVERAGE_COMPARABLE_WITH_GAPS",
            UxMessageCode::CoverageFoundSingleInsurer => "COVERAGE_FOUND_SINGLE_INSURER",
        }
    }
}

impl fmt::Display for UxMessageCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Validate a raw string against the `ComparisonResult` registry.
/// Converting at the boundary, never deep in the core (spec §9 redesign flag).
pub fn validate_comparison_result(raw: &str) -> Result<ComparisonResult, CoreError> {
    ComparisonResult::ALL
        .into_iter()
        .find(|c| c.as_str() == raw)
        .ok_or_else(|| CoreError::Validation(format!("unknown comparison_result code: {raw}")))
}

pub fn validate_next_action(raw: &str) -> Result<NextAction, CoreError> {
    NextAction::ALL
        .into_iter()
        .find(|a| a.as_str() == raw)
        .ok_or_else(|| CoreError::Validation(format!("unknown next_action code: {raw}")))
}

pub fn validate_ux_message_code(raw: &str) -> Result<UxMessageCode, CoreError> {
    UxMessageCode::ALL
        .into_iter()
        .find(|m| m.as_str() == raw)
        .ok_or_else(|| CoreError::Validation(format!("unknown ux_message_code: {raw}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comparison_result_codes_are_lower_snake_case() {
        for c in ComparisonResult::ALL {
            assert_eq!(c.as_str(), c.as_str().to_ascii_lowercase());
            assert!(!c.as_str().contains(|ch: char| ch.is_ascii_uppercase()));
        }
    }

    #[test]
    fn next_action_and_ux_message_codes_are_upper_snake_case() {
        for a in NextAction::ALL {
            assert_eq!(a.as_str(), a.as_str().to_ascii_uppercase());
        }
        for m in UxMessageCode::ALL {
            assert_eq!(m.as_str(), m.as_str().to_ascii_uppercase());
        }
    }

    #[test]
    fn validators_round_trip_every_member() {
        for c in ComparisonResult::ALL {
            assert_eq!(validate_comparison_result(c.as_str()).unwrap(), c);
        }
        for a in NextAction::ALL {
            assert_eq!(validate_next_action(a.as_str()).unwrap(), a);
        }
        for m in UxMessageCode::ALL {
            assert_eq!(validate_ux_message_code(m.as_str()).unwrap(), m);
        }
    }

    #[test]
    fn validators_reject_unknown_codes() {
        assert!(validate_comparison_result("bogus").is_err());
        assert!(validate_next_action("BOGUS").is_err());
        assert!(validate_ux_message_code("BOGUS").is_err());
    }
}
