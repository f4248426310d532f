use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Closed finite set of insurers the system knows how to compare (spec §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InsurerCode {
    Samsung,
    Hanwha,
    Lotte,
    Meritz,
    Kb,
    Hyundai,
    Heungkuk,
    Db,
}

impl InsurerCode {
    pub const ALL: [InsurerCode; 8] = [
        InsurerCode::Samsung,
        InsurerCode::Hanwha,
        InsurerCode::Lotte,
        InsurerCode::Meritz,
        InsurerCode::Kb,
        InsurerCode::Hyundai,
        InsurerCode::Heungkuk,
        InsurerCode::Db,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            InsurerCode::Samsung => "SAMSUNG",
            InsurerCode::Hanwha => "HANWHA",
            InsurerCode::Lotte => "LOTTE",
            InsurerCode::Meritz => "MERITZ",
            InsurerCode::Kb => "KB",
            InsurerCode::Hyundai => "HYUNDAI",
            InsurerCode::Heungkuk => "HEUNGKUK",
            InsurerCode::Db => "DB",
        }
    }
}

impl fmt::Display for InsurerCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown insurer code: {0}")]
pub struct UnknownInsurerCode(pub String);

impl FromStr for InsurerCode {
    type Err = UnknownInsurerCode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "SAMSUNG" => Ok(InsurerCode::Samsung),
            "HANWHA" => Ok(InsurerCode::Hanwha),
            "LOTTE" => Ok(InsurerCode::Lotte),
            "MERITZ" => Ok(InsurerCode::Meritz),
            "KB" => Ok(InsurerCode::Kb),
            "HYUNDAI" => Ok(InsurerCode::Hyundai),
            "HEUNGKUK" => Ok(InsurerCode::Heungkuk),
            "DB" => Ok(InsurerCode::Db),
            other => Err(UnknownInsurerCode(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_display_and_parse() {
        for insurer in InsurerCode::ALL {
            let parsed: InsurerCode = insurer.as_str().parse().unwrap();
            assert_eq!(parsed, insurer);
        }
    }

    #[test]
    fn rejects_unknown_codes() {
        assert!("NONEXISTENT".parse::<InsurerCode>().is_err());
    }

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!("samsung".parse::<InsurerCode>().unwrap(), InsurerCode::Samsung);
    }
}
