//! Amount parsing with Korean currency unit-explosion (spec §6), grounded
//! on the original proposal-chunk amount extractor: try the largest unit
//! first so `"3억원"` never gets mis-parsed as `"3"` via a looser pattern.

use once_cell::sync::Lazy;
use regex::Regex;

struct UnitPattern {
    regex: Regex,
    multiplier: i64,
}

static UNIT_PATTERNS: Lazy<Vec<UnitPattern>> = Lazy::new(|| {
    vec![
        UnitPattern { regex: Regex::new(r"(\d+(?:,\d{3})*)\s*억\s*원?").unwrap(), multiplier: 100_000_000 },
        UnitPattern { regex: Regex::new(r"(\d+(?:,\d{3})*)\s*천만\s*원?").unwrap(), multiplier: 10_000_000 },
        UnitPattern { regex: Regex::new(r"(\d+(?:,\d{3})*)\s*만\s*원?").unwrap(), multiplier: 10_000 },
        UnitPattern { regex: Regex::new(r"(\d+(?:,\d{3})*)\s*원").unwrap(), multiplier: 1 },
    ]
});

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedAmount {
    pub value: i64,
    pub matched_text: String,
}

/// Extract the first currency amount found in `text`, exploding the unit
/// suffix into a plain integer value in KRW. Returns `None` when no
/// pattern matches — never a guessed amount.
pub fn parse_amount(text: &str) -> Option<ParsedAmount> {
    for pattern in UNIT_PATTERNS.iter() {
        if let Some(captures) = pattern.regex.find(text) {
            let digits = pattern.regex.captures(text)?.get(1)?.as_str().replace(',', "");
            let value: i64 = digits.parse().ok()?;
            return Some(ParsedAmount { value: value * pattern.multiplier, matched_text: captures.as_str().to_string() });
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_man_won() {
        let parsed = parse_amount("600만원").unwrap();
        assert_eq!(parsed.value, 6_000_000);
    }

    #[test]
    fn parses_eok_won() {
        let parsed = parse_amount("3억원").unwrap();
        assert_eq!(parsed.value, 300_000_000);
    }

    #[test]
    fn parses_cheonman_won() {
        let parsed = parse_amount("5천만원").unwrap();
        assert_eq!(parsed.value, 50_000_000);
    }

    #[test]
    fn parses_plain_won_with_thousands_separators() {
        let parsed = parse_amount("1,500,000원").unwrap();
        assert_eq!(parsed.value, 1_500_000);
    }

    #[test]
    fn no_amount_yields_none() {
        assert!(parse_amount("보장 내용 없음").is_none());
    }
}
