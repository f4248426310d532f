//! Deterministic compilation rules (spec §4.9). Every detector here is a
//! fixed keyword table — no inference, same input always yields the same
//! output.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SurgeryMethod {
    DaVinci,
    Robot,
    Laparoscopic,
    Any,
}

impl SurgeryMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            SurgeryMethod::DaVinci => "da_vinci",
            SurgeryMethod::Robot => "robot",
            SurgeryMethod::Laparoscopic => "laparoscopic",
            SurgeryMethod::Any => "any",
        }
    }
}

impl fmt::Display for SurgeryMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CancerSubtype {
    InSitu,
    Borderline,
    Similar,
    General,
}

impl CancerSubtype {
    pub fn label(&self) -> &'static str {
        match self {
            CancerSubtype::InSitu => "제자리암",
            CancerSubtype::Borderline => "경계성종양",
            CancerSubtype::Similar => "유사암",
            CancerSubtype::General => "일반암",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonFocus {
    Amount,
    Definition,
    Condition,
}

impl ComparisonFocus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComparisonFocus::Amount => "amount",
            ComparisonFocus::Definition => "definition",
            ComparisonFocus::Condition => "condition",
        }
    }
}

const SURGERY_METHOD_KEYWORDS: &[(SurgeryMethod, &[&str])] = &[
    (SurgeryMethod::DaVinci, &["다빈치", "da vinci", "davinci"]),
    (SurgeryMethod::Robot, &["로봇", "robot"]),
    (SurgeryMethod::Laparoscopic, &["복강경", "laparoscopic"]),
];

const CANCER_SUBTYPE_KEYWORDS: &[(CancerSubtype, &[&str])] = &[
    (CancerSubtype::InSitu, &["제자리암", "carcinoma in situ"]),
    (CancerSubtype::Borderline, &["경계성종양", "경계성", "borderline"]),
    (CancerSubtype::Similar, &["유사암", "similar cancer"]),
    (CancerSubtype::General, &["일반암", "general cancer", "암진단비"]),
];

/// Coverage name → domain (e.g. "암진단비" → "cancer"). Used to auto-detect
/// a comparison basis when the caller didn't pick one explicitly.
pub fn coverage_domain_rules() -> &'static [(&'static str, &'static str)] {
    &[
        ("암진단비", "cancer"),
        ("일반암진단비", "cancer"),
        ("유사암진단비", "cancer"),
        ("소액암진단비", "cancer"),
        ("암재진단비", "cancer"),
        ("제자리암진단비", "cancer"),
        ("경계성종양진단비", "cancer"),
        ("수술비", "surgery"),
        ("암수술비", "surgery"),
        ("뇌수술비", "surgery"),
        ("심장수술비", "surgery"),
        ("뇌출혈진단비", "brain"),
        ("뇌졸중진단비", "brain"),
        ("뇌혈관질환진단비", "brain"),
        ("급성심근경색진단비", "heart"),
        ("허혈성심장질환진단비", "heart"),
    ]
}

pub fn detect_surgery_method(query: &str) -> Option<SurgeryMethod> {
    let query_lower = query.to_lowercase();
    for (method, keywords) in SURGERY_METHOD_KEYWORDS {
        if keywords.iter().any(|kw| query_lower.contains(kw)) {
            return Some(*method);
        }
    }
    None
}

pub fn detect_cancer_subtypes(query: &str) -> HashSet<CancerSubtype> {
    let query_lower = query.to_lowercase();
    CANCER_SUBTYPE_KEYWORDS
        .iter()
        .filter(|(_, keywords)| keywords.iter().any(|kw| query_lower.contains(kw)))
        .map(|(subtype, _)| *subtype)
        .collect()
}

pub fn detect_comparison_focus(query: &str) -> Option<ComparisonFocus> {
    let query_lower = query.to_lowercase();
    if ["금액", "얼마", "보장금액", "지급금액"].iter().any(|kw| query_lower.contains(kw)) {
        return Some(ComparisonFocus::Amount);
    }
    if ["정의", "범위", "무엇", "어떤"].iter().any(|kw| query_lower.contains(kw)) {
        return Some(ComparisonFocus::Definition);
    }
    if ["조건", "요건", "면책", "한도"].iter().any(|kw| query_lower.contains(kw)) {
        return Some(ComparisonFocus::Condition);
    }
    None
}

pub fn resolve_coverage_domain(coverage_name: &str) -> Option<&'static str> {
    coverage_domain_rules().iter().find(|(name, _)| *name == coverage_name).map(|(_, domain)| *domain)
}

/// Main coverage priority list for a domain — empty when the domain is
/// unrecognized, never a guess.
pub fn get_main_coverage_priority(domain: &str) -> Vec<&'static str> {
    match domain {
        "cancer" => vec!["일반암진단비", "암진단비"],
        "surgery" => vec!["수술비", "암수술비"],
        "brain" => vec!["뇌출혈진단비", "뇌졸중진단비"],
        "heart" => vec!["급성심근경색진단비"],
        _ => vec![],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_da_vinci_surgery_method() {
        assert_eq!(detect_surgery_method("다빈치 로봇수술비 비교"), Some(SurgeryMethod::DaVinci));
    }

    #[test]
    fn detects_multiple_cancer_subtypes() {
        let subtypes = detect_cancer_subtypes("제자리암과 경계성종양 차이");
        assert_eq!(subtypes.len(), 2);
        assert!(subtypes.contains(&CancerSubtype::InSitu));
        assert!(subtypes.contains(&CancerSubtype::Borderline));
    }

    #[test]
    fn detects_comparison_focus_amount_over_definition() {
        assert_eq!(detect_comparison_focus("보장금액이 얼마인가요"), Some(ComparisonFocus::Amount));
    }

    #[test]
    fn unresolved_domain_yields_empty_priority_list() {
        assert!(get_main_coverage_priority("unknown_domain").is_empty());
    }

    #[test]
    fn resolves_known_coverage_domain() {
        assert_eq!(resolve_coverage_domain("암진단비"), Some("cancer"));
        assert_eq!(resolve_coverage_domain("모르는담보"), None);
    }
}
