//! Deterministic slot extraction from proposal span text (spec §3, §4.7):
//! waiting period, reduction period, payout limit, renewal marker, and
//! treatment method. Same keyword-regex style as the cancer evidence
//! typer/scope detector — no inference, only what the text states.

use crate::types::{CoverageSlots, PayoutLimit, PayoutLimitKind, SourceConfidence};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

static WAITING_PERIOD: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?:면책기간|대기기간)\s*(\d+)\s*일").unwrap());
static REDUCTION_PERIOD: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d+)\s*년\s*(?:이내|미만)?\s*(\d+)\s*%\s*지급").unwrap());
static PAYOUT_ONCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"최초\s*1\s*회\s*한").unwrap());
static PAYOUT_MULTIPLE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d+)\s*회\s*한").unwrap());
static PAYOUT_UNLIMITED: Lazy<Regex> = Lazy::new(|| Regex::new(r"횟수\s*제한\s*없음|무제한").unwrap());
static RENEWAL_MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"갱신형|갱신\s*주기\s*(\d+)\s*년").unwrap());

const TREATMENT_METHOD_KEYWORDS: &[(&str, &str)] = &[
    ("항암방사선", "radiation"),
    ("항암화학", "chemotherapy"),
    ("다빈치", "da_vinci"),
    ("로봇수술", "robot"),
    ("표적항암", "targeted_therapy"),
];

/// Extract every recognizable slot from a single proposal span. Fields
/// with no textual evidence stay at their empty/`None` default rather
/// than being guessed.
pub fn extract_slots(span_text: &str, source_confidence: SourceConfidence) -> CoverageSlots {
    let mut slots = CoverageSlots::empty(source_confidence);

    if let Some(captures) = WAITING_PERIOD.captures(span_text) {
        slots.waiting_period_days = captures.get(1).and_then(|m| m.as_str().parse().ok());
    }

    if let Some(captures) = REDUCTION_PERIOD.captures(span_text) {
        slots.reduction_periods.push(captures.get(0).unwrap().as_str().to_string());
    }

    slots.payout_limit = extract_payout_limit(span_text);

    slots.renewal_flag = RENEWAL_MARKER.is_match(span_text);
    if let Some(captures) = RENEWAL_MARKER.captures(span_text) {
        slots.renewal_period_years = captures.get(1).and_then(|m| m.as_str().parse().ok());
    }

    slots.treatment_method = extract_treatment_methods(span_text);

    slots
}

fn extract_payout_limit(span_text: &str) -> Option<PayoutLimit> {
    if PAYOUT_UNLIMITED.is_match(span_text) {
        return Some(PayoutLimit { kind: PayoutLimitKind::Unlimited, count: None, period: None });
    }
    if PAYOUT_ONCE.is_match(span_text) {
        return Some(PayoutLimit { kind: PayoutLimitKind::Once, count: Some(1), period: None });
    }
    if let Some(captures) = PAYOUT_MULTIPLE.captures(span_text) {
        let count = captures.get(1).and_then(|m| m.as_str().parse().ok());
        return Some(PayoutLimit { kind: PayoutLimitKind::Multiple, count, period: None });
    }
    None
}

fn extract_treatment_methods(span_text: &str) -> HashSet<String> {
    TREATMENT_METHOD_KEYWORDS
        .iter()
        .filter(|(keyword, _)| span_text.contains(keyword))
        .map(|(_, label)| label.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_waiting_period_days() {
        let slots = extract_slots("면책기간 90일 이후 보장 개시", SourceConfidence::ProposalConfirmed);
        assert_eq!(slots.waiting_period_days, Some(90));
    }

    #[test]
    fn extracts_once_payout_limit() {
        let slots = extract_slots("최초1회한 지급", SourceConfidence::ProposalConfirmed);
        assert_eq!(slots.payout_limit.unwrap().kind, PayoutLimitKind::Once);
    }

    #[test]
    fn extracts_unlimited_payout_over_multiple() {
        let slots = extract_slots("횟수 제한 없음, 3회한 지급 아님", SourceConfidence::ProposalConfirmed);
        assert_eq!(slots.payout_limit.unwrap().kind, PayoutLimitKind::Unlimited);
    }

    #[test]
    fn extracts_renewal_flag_and_period() {
        let slots = extract_slots("갱신형, 갱신 주기 3년", SourceConfidence::ProposalConfirmed);
        assert!(slots.renewal_flag);
        assert_eq!(slots.renewal_period_years, Some(3));
    }

    #[test]
    fn extracts_treatment_methods() {
        let slots = extract_slots("다빈치 로봇수술 및 항암화학 치료 포함", SourceConfidence::ProposalConfirmed);
        assert!(slots.treatment_method.contains("da_vinci"));
        assert!(slots.treatment_method.contains("chemotherapy"));
    }

    #[test]
    fn no_keyword_hits_leave_slots_empty() {
        let slots = extract_slots("특약 세부사항 없음", SourceConfidence::Unknown);
        assert!(slots.payout_limit.is_none());
        assert!(slots.treatment_method.is_empty());
        assert!(!slots.renewal_flag);
    }
}
