use serde::{Deserialize, Serialize};
use std::fmt;

/// The four cancer canonical scopes. Constitutional and fixed (spec §3):
/// modifications require an explicit schema amendment, never a runtime
/// decision. This is the only sum type in the workspace that is permitted
/// to stand in directly for a `CanonicalCoverageCode::Cancer` variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CancerCanonical {
    General,
    Similar,
    InSitu,
    Borderline,
}

impl CancerCanonical {
    pub const ALL: [CancerCanonical; 4] = [
        CancerCanonical::General,
        CancerCanonical::Similar,
        CancerCanonical::InSitu,
        CancerCanonical::Borderline,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            CancerCanonical::General => "CA_DIAG_GENERAL",
            CancerCanonical::Similar => "CA_DIAG_SIMILAR",
            CancerCanonical::InSitu => "CA_DIAG_IN_SITU",
            CancerCanonical::Borderline => "CA_DIAG_BORDERLINE",
        }
    }
}

impl fmt::Display for CancerCanonical {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn codes_are_unique() {
        let codes: HashSet<_> = CancerCanonical::ALL.iter().map(|c| c.code()).collect();
        assert_eq!(codes.len(), CancerCanonical::ALL.len());
    }
}
