//! Proposal PDF line-level patterns (spec §6): a coverage line is one of
//! a small closed set of shapes. Anything else is not a coverage row and
//! is skipped rather than guessed at.

use crate::amount::parse_amount;
use once_cell::sync::Lazy;
use regex::Regex;

const COVERAGE_NAME_SUFFIXES: &[&str] = &["진단비", "수술비", "치료비", "입원비"];

static RENEWAL_PREFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*\[갱신형\]\s*").unwrap());

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedLine {
    pub raw_name: String,
    pub amount_value: i64,
    pub qualifier: Option<String>,
    pub is_renewal: bool,
}

/// Parse a single proposal line into `(name, amount, qualifier)`. Tries,
/// in order: the renewal-marked form, then the generic
/// `<name> <amount> [qualifier]` form, falling back to requiring the
/// name end in a known coverage suffix when no amount qualifier is
/// present.
pub fn parse_proposal_line(line: &str) -> Option<ParsedLine> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return None;
    }

    let is_renewal = RENEWAL_PREFIX.is_match(trimmed);
    let without_prefix = RENEWAL_PREFIX.replace(trimmed, "").to_string();

    let amount = parse_amount(&without_prefix)?;
    let amount_start = without_prefix.find(&amount.matched_text)?;
    let name_part = without_prefix[..amount_start].trim();
    let remainder = without_prefix[amount_start + amount.matched_text.len()..].trim();

    if name_part.is_empty() {
        return None;
    }
    if !is_renewal && remainder.is_empty() && !has_known_coverage_suffix(name_part) {
        return None;
    }

    Some(ParsedLine {
        raw_name: name_part.to_string(),
        amount_value: amount.value,
        qualifier: if remainder.is_empty() { None } else { Some(remainder.to_string()) },
        is_renewal,
    })
}

fn has_known_coverage_suffix(name: &str) -> bool {
    COVERAGE_NAME_SUFFIXES.iter().any(|suffix| name.ends_with(suffix))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_name_amount_line() {
        let parsed = parse_proposal_line("일반암진단비 3,000만원").unwrap();
        assert_eq!(parsed.raw_name, "일반암진단비");
        assert_eq!(parsed.amount_value, 30_000_000);
        assert!(!parsed.is_renewal);
    }

    #[test]
    fn parses_renewal_marked_line() {
        let parsed = parse_proposal_line("[갱신형] 유사암진단비 1,000만원 최초1회한").unwrap();
        assert!(parsed.is_renewal);
        assert_eq!(parsed.raw_name, "유사암진단비");
        assert_eq!(parsed.qualifier.as_deref(), Some("최초1회한"));
    }

    #[test]
    fn parses_bare_suffix_name_with_amount() {
        let parsed = parse_proposal_line("암수술비 500만원").unwrap();
        assert_eq!(parsed.raw_name, "암수술비");
        assert_eq!(parsed.amount_value, 5_000_000);
    }

    #[test]
    fn non_coverage_line_without_amount_yields_none() {
        assert!(parse_proposal_line("보험가입자 유의사항").is_none());
    }
}
