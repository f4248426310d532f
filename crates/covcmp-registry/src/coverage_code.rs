use crate::cancer::CancerCanonical;
use covcmp_foundation::error::CoreError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// A stable, industry-wide coverage identifier (spec §3, Glossary
/// "Canonical coverage code / 신정원 통일코드"). The only allowed coverage
/// identifier for comparison.
///
/// The cancer family is constitutional and always valid. Any other code
/// is only constructible by validating it against a [`CoverageStandardRegistry`]
/// — there is no `From<String>` impl, by design, so a canonical code can
/// never be fabricated from an unchecked string deep in the core.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CanonicalCoverageCode {
    Cancer(CancerCanonical),
    Other(String),
}

impl CanonicalCoverageCode {
    pub fn code(&self) -> &str {
        match self {
            CanonicalCoverageCode::Cancer(c) => c.code(),
            CanonicalCoverageCode::Other(s) => s.as_str(),
        }
    }

    pub fn is_cancer(&self) -> bool {
        matches!(self, CanonicalCoverageCode::Cancer(_))
    }
}

impl fmt::Display for CanonicalCoverageCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// One row of the `coverage_standard` master table (spec §6): the
/// canonical registry, never written by the core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoverageStandard {
    pub coverage_code: String,
    pub coverage_name: String,
}

/// Process-wide read-only map loaded once from a migration (spec §5).
/// Validates that every non-cancer canonical code referenced anywhere in
/// the system actually exists here — the "every mapping into the system
/// references an existing canonical code" invariant of spec §3.
#[derive(Debug, Clone)]
pub struct CoverageStandardRegistry {
    by_code: HashMap<String, CoverageStandard>,
}

impl CoverageStandardRegistry {
    /// Builds the registry from the rows of `coverage_standard`, plus the
    /// four constitutional cancer canonicals (which are always present
    /// regardless of what the master table contains).
    pub fn new(rows: impl IntoIterator<Item = CoverageStandard>) -> Self {
        let mut by_code: HashMap<String, CoverageStandard> =
            rows.into_iter().map(|r| (r.coverage_code.clone(), r)).collect();
        for cancer in CancerCanonical::ALL {
            by_code.entry(cancer.code().to_string()).or_insert_with(|| CoverageStandard {
                coverage_code: cancer.code().to_string(),
                coverage_name: format!("{cancer:?}"),
            });
        }
        Self { by_code }
    }

    /// Resolve a raw `cre_cvr_cd` string (Excel §6) into a validated
    /// [`CanonicalCoverageCode`]. Fails with [`CoreError::Validation`] if
    /// the code is not in the registry — "no implicit creation."
    pub fn resolve(&self, code: &str) -> Result<CanonicalCoverageCode, CoreError> {
        for cancer in CancerCanonical::ALL {
            if cancer.code() == code {
                return Ok(CanonicalCoverageCode::Cancer(cancer));
            }
        }
        if self.by_code.contains_key(code) {
            Ok(CanonicalCoverageCode::Other(code.to_string()))
        } else {
            Err(CoreError::Validation(format!(
                "canonical coverage code '{code}' is not registered in coverage_standard"
            )))
        }
    }

    pub fn display_name(&self, canonical: &CanonicalCoverageCode) -> Option<&str> {
        self.by_code.get(canonical.code()).map(|r| r.coverage_name.as_str())
    }

    pub fn contains(&self, code: &str) -> bool {
        self.by_code.contains_key(code)
            || CancerCanonical::ALL.iter().any(|c| c.code() == code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> CoverageStandardRegistry {
        CoverageStandardRegistry::new([CoverageStandard {
            coverage_code: "SURGERY_ROBOT".into(),
            coverage_name: "로봇수술비".into(),
        }])
    }

    #[test]
    fn resolves_cancer_canonicals_without_master_rows() {
        let reg = CoverageStandardRegistry::new([]);
        assert!(reg.resolve("CA_DIAG_GENERAL").is_ok());
    }

    #[test]
    fn resolves_registered_other_code() {
        let reg = registry();
        let resolved = reg.resolve("SURGERY_ROBOT").unwrap();
        assert_eq!(resolved, CanonicalCoverageCode::Other("SURGERY_ROBOT".into()));
    }

    #[test]
    fn rejects_unregistered_code() {
        let reg = registry();
        assert!(reg.resolve("NOT_A_REAL_CODE").is_err());
    }
}
