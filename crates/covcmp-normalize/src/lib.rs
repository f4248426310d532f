//! Alias Normalizer (spec §4.1): deterministic text → match-key
//! transformation with conditional-clause extraction.
//!
//! Applies identically at ingestion time (Excel aliases, proposal raw
//! names) and at query time (user free text) — this identity is what
//! guarantees Universe Lock matching (spec §8 Testable Property 7).

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Bracketed-substring removal: `(...)` and `[...]`.
static PARENS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\([^)]*\)").unwrap());
static BRACKETS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[[^\]]*\]").unwrap());

/// Roman numeral version markers (Ⅰ–Ⅴ) and the `<digit>대` pattern (e.g. "5대").
static ROMAN_NUMERALS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ⅠⅡⅢⅣⅤ]+").unwrap());
static N_DAE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+대").unwrap());

/// All whitespace, including the no-break space (U+00A0), collapses away.
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\s\u{00A0}]+").unwrap());

/// Conditional clauses captured into the side-channel before being
/// stripped from the match key (spec §4.1 `normalize_with_metadata`).
static CONDITIONAL_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"\(유사암\s*제외\)",
        r"\(특정암\s*제외\)",
        r"\(갑상선암\s*제외\)",
        r"\(기타피부암\s*제외\)",
        r"\(\d+년\s*\d+%\)",
        r"\(\d+년\s*감액\)",
        r"\(최초\s*\d+회한\)",
        r"\(연간\s*\d+회한\)",
        r"\(\d+일.*?\d+일\)",
        r"\(요양.*?제외\)",
        r"\(갱신형\)",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

/// A small fixed table of cancer query aliases that collapse to the same
/// base form (spec §4.1, recovered from `normalize_cancer_query` in the
/// original source — not in the distilled spec text but used to
/// supplement cancer guardrail detection in the Alias Index, §4.2).
const CANCER_QUERY_ALIASES: &[(&str, &str)] =
    &[("일반암진단비", "암진단비"), ("암진단", "암진단비"), ("암진단금", "암진단비")];

/// Result of [`normalize_with_metadata`]: the match key plus the
/// conditional-clause side channel. These flags feed policy slot
/// extraction; they are never inputs to the match key itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedAlias {
    pub match_key: String,
    pub original: String,
    pub conditionals: Vec<String>,
    pub has_exclusion: bool,
    pub has_payout_rate: bool,
}

/// Pure deterministic normalization: trim → strip brackets → strip
/// version markers → collapse whitespace → lowercase. Empty input
/// produces empty output (spec §4.1 contract).
pub fn normalize(text: &str) -> String {
    if text.trim().is_empty() {
        return String::new();
    }
    let mut result = text.trim().to_string();
    result = PARENS.replace_all(&result, "").into_owned();
    result = BRACKETS.replace_all(&result, "").into_owned();
    result = ROMAN_NUMERALS.replace_all(&result, "").into_owned();
    result = N_DAE.replace_all(&result, "").into_owned();
    result = WHITESPACE.replace_all(&result, "").into_owned();
    result.to_lowercase()
}

/// Normalize and extract the conditional-clause side channel.
pub fn normalize_with_metadata(text: &str) -> NormalizedAlias {
    if text.trim().is_empty() {
        return NormalizedAlias {
            match_key: String::new(),
            original: String::new(),
            conditionals: Vec::new(),
            has_exclusion: false,
            has_payout_rate: false,
        };
    }

    let original = text.trim().to_string();
    let mut conditionals = Vec::new();
    for pattern in CONDITIONAL_PATTERNS.iter() {
        for m in pattern.find_iter(&original) {
            conditionals.push(m.as_str().to_string());
        }
    }

    let has_exclusion = conditionals.iter().any(|c| c.contains("제외"));
    let has_payout_rate = conditionals.iter().any(|c| c.contains('%'));

    NormalizedAlias {
        match_key: normalize(&original),
        original,
        conditionals,
        has_exclusion,
        has_payout_rate,
    }
}

/// Special-cased normalization for cancer queries: collapses the handful
/// of surface variants of "암진단비" onto one base form before alias-index
/// lookup.
pub fn normalize_cancer_query(query: &str) -> String {
    let normalized = normalize(query);
    for (alias, canonical_form) in CANCER_QUERY_ALIASES {
        if normalized == normalize(alias) {
            return canonical_form.to_string();
        }
    }
    normalized
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn empty_input_yields_empty_output() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("   "), "");
    }

    #[test]
    fn strips_parenthetical_and_bracketed_content() {
        assert_eq!(normalize("암진단비(유사암 제외)"), "암진단비");
        assert_eq!(normalize("암진단비[갱신형]"), "암진단비");
    }

    #[test]
    fn strips_roman_numerals_and_n_dae_markers() {
        assert_eq!(normalize("암보장Ⅱ"), "암보장");
        assert_eq!(normalize("5대고액치료비"), "고액치료비");
    }

    #[test]
    fn collapses_internal_whitespace_including_nbsp() {
        assert_eq!(normalize("암  진단비"), "암진단비");
        assert_eq!(normalize("암\u{00A0}진단비"), "암진단비");
    }

    #[test]
    fn lowercases_latin_characters() {
        assert_eq!(normalize("Da Vinci 수술비"), "davinci수술비");
    }

    #[test]
    fn extracts_conditional_clause_metadata() {
        let meta = normalize_with_metadata("암진단비(유사암 제외)");
        assert_eq!(meta.match_key, "암진단비");
        assert_eq!(meta.conditionals, vec!["(유사암 제외)".to_string()]);
        assert!(meta.has_exclusion);
        assert!(!meta.has_payout_rate);
    }

    #[test]
    fn extracts_payout_rate_clause() {
        let meta = normalize_with_metadata("암진단비(1년50%)");
        assert!(meta.has_payout_rate);
        assert!(!meta.has_exclusion);
    }

    #[test]
    fn cancer_query_aliases_collapse_to_base_form() {
        assert_eq!(normalize_cancer_query("일반암진단비"), "암진단비");
        assert_eq!(normalize_cancer_query("암진단"), "암진단비");
        assert_eq!(normalize_cancer_query("암진단금"), "암진단비");
    }

    proptest! {
        #[test]
        fn normalize_never_panics(s in ".{0,200}") {
            let _ = normalize(&s);
            let _ = normalize_with_metadata(&s);
        }

        #[test]
        fn normalize_is_idempotent_on_its_own_output(s in "[가-힣a-zA-Z0-9]{0,40}") {
            let once = normalize(&s);
            let twice = normalize(&once);
            prop_assert_eq!(once, twice);
        }
    }
}
