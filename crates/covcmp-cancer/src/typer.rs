//! Cancer Evidence Typer (spec §4.3): classifies a single policy text span
//! into an evidence type. Rule-based only, never statistical — AH-4.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Evidence type classification (spec §4.3, Glossary "Evidence type").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CancerEvidenceType {
    DefinitionIncluded,
    Exclusion,
    SeparateBenefit,
    Unknown,
}

impl CancerEvidenceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CancerEvidenceType::DefinitionIncluded => "definition_included",
            CancerEvidenceType::Exclusion => "exclusion",
            CancerEvidenceType::SeparateBenefit => "separate_benefit",
            CancerEvidenceType::Unknown => "unknown",
        }
    }
}

impl fmt::Display for CancerEvidenceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Outcome of [`classify_evidence`]: the type, a fixed confidence, and the
/// matched pattern label kept for audit trails (spec §4.8 evidence spans).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceTypeResult {
    pub evidence_type: CancerEvidenceType,
    pub confidence: f64,
    pub matched_pattern: Option<String>,
}

fn compile_all(patterns: &[(&str, &str)]) -> Vec<(Regex, &'static str)> {
    patterns
        .iter()
        .map(|(p, label)| (Regex::new(p).unwrap(), *label))
        .collect()
}

static DEFINITION_PATTERNS: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    compile_all(&[
        (r"포함", "포함"),
        (r"정의", "정의"),
        (r"해당", "해당"),
        (r"분류", "분류"),
        (r"다음과\s*같다", "다음과 같다"),
        (r"아래와\s*같다", "아래와 같다"),
    ])
});

static EXCLUSION_PATTERNS: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    compile_all(&[
        (r"제외", "제외"),
        (r"않는", "않는"),
        (r"해당하지", "해당하지"),
        (r"대상이\s*아님", "대상이 아님"),
        (r"지급하지\s*않", "지급하지 않"),
        (r"면책", "면책"),
    ])
});

static SEPARATE_BENEFIT_PATTERNS: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    compile_all(&[
        (r"별도\s*담보", "별도 담보"),
        (r"별도\s*지급", "별도 지급"),
        (r"별도로\s*지급", "별도로 지급"),
        (r"독립\s*담보", "독립 담보"),
        (r"독립적\s*으로", "독립적으로"),
        (r"구분\s*하여\s*지급", "구분하여 지급"),
    ])
});

/// Classify a policy span's evidence type. Priority order (highest first):
/// separate benefit, exclusion, definition-inclusion, then unknown —
/// a span that matches more than one family is classified by the most
/// specific rule, never averaged or scored (spec §4.3).
pub fn classify_evidence(policy_text: &str) -> EvidenceTypeResult {
    let compact: String = policy_text.to_lowercase().chars().filter(|c| !c.is_whitespace()).collect();

    for (pattern, label) in SEPARATE_BENEFIT_PATTERNS.iter() {
        if pattern.is_match(&compact) {
            return EvidenceTypeResult {
                evidence_type: CancerEvidenceType::SeparateBenefit,
                confidence: 0.9,
                matched_pattern: Some(label.to_string()),
            };
        }
    }

    for (pattern, label) in EXCLUSION_PATTERNS.iter() {
        if pattern.is_match(&compact) {
            return EvidenceTypeResult {
                evidence_type: CancerEvidenceType::Exclusion,
                confidence: 0.9,
                matched_pattern: Some(label.to_string()),
            };
        }
    }

    for (pattern, label) in DEFINITION_PATTERNS.iter() {
        if pattern.is_match(&compact) {
            return EvidenceTypeResult {
                evidence_type: CancerEvidenceType::DefinitionIncluded,
                confidence: 0.8,
                matched_pattern: Some(label.to_string()),
            };
        }
    }

    EvidenceTypeResult { evidence_type: CancerEvidenceType::Unknown, confidence: 0.0, matched_pattern: None }
}
