//! Alias Index (spec §4.2): builds `normalized_alias -> set<canonical_code>`
//! from the insurer alias workbook. Loaded once at startup and frozen
//! (spec §5 "initialize-then-freeze"); the public API after [`AliasIndex::load`]
//! returns has no mutation methods.

use covcmp_foundation::error::CoreError;
use covcmp_normalize::normalize;
use covcmp_registry::CancerCanonical;
use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Columns required in the Excel mapping workbook (spec §6, exact names).
const COL_CANONICAL_CODE: &str = "cre_cvr_cd";
const COL_CANONICAL_DISPLAY: &str = "신정원코드명";
const COL_RAW_ALIAS: &str = "담보명(가입설계서)";

/// Cancer query keywords that trigger the guardrail (spec §4.2), compared
/// after whitespace stripping.
const CANCER_QUERY_KEYWORDS: &[&str] = &[
    "암진단", "일반암", "유사암", "제자리암", "경계성종양", "기타피부암", "갑상선암",
];

#[derive(Debug, Error)]
pub enum AliasIndexError {
    #[error("failed to open workbook {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: calamine::XlsxError,
    },
    #[error("workbook has no sheets")]
    NoSheets,
    #[error("missing required column(s) in workbook: {0:?}")]
    MissingColumns(Vec<&'static str>),
    #[error("spreadsheet read error: {0}")]
    Spreadsheet(#[from] calamine::XlsxError),
}

impl From<AliasIndexError> for CoreError {
    fn from(e: AliasIndexError) -> Self {
        CoreError::DataInsufficient(e.to_string())
    }
}

/// A frozen, process-wide alias index. Construction is the only fallible
/// step; once built, resolution never fails — an unmapped query simply
/// yields an empty result (spec §4.2 contract).
#[derive(Debug, Clone)]
pub struct AliasIndex {
    index: HashMap<String, BTreeSet<String>>,
    canonical_to_display: HashMap<String, String>,
}

impl AliasIndex {
    /// Idempotent: calling this twice on the same workbook produces an
    /// equal index. Fails fast if the workbook is absent or malformed —
    /// downstream components must refuse to proceed (spec §4.2).
    pub fn load(path: impl AsRef<Path>) -> Result<Self, AliasIndexError> {
        use calamine::{open_workbook_auto, Reader};

        let path_ref = path.as_ref();
        let mut workbook =
            open_workbook_auto(path_ref).map_err(|source| AliasIndexError::Open {
                path: path_ref.display().to_string(),
                source,
            })?;

        let sheet_name = workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or(AliasIndexError::NoSheets)?;
        let range = workbook.worksheet_range(&sheet_name)?;

        let mut rows = range.rows();
        let header = rows.next().ok_or(AliasIndexError::NoSheets)?;
        let col_index = |name: &str| header.iter().position(|c| c.to_string() == name);

        let idx_code = col_index(COL_CANONICAL_CODE);
        let idx_display = col_index(COL_CANONICAL_DISPLAY);
        let idx_alias = col_index(COL_RAW_ALIAS);

        let mut missing = Vec::new();
        if idx_code.is_none() {
            missing.push(COL_CANONICAL_CODE);
        }
        if idx_display.is_none() {
            missing.push(COL_CANONICAL_DISPLAY);
        }
        if idx_alias.is_none() {
            missing.push(COL_RAW_ALIAS);
        }
        if !missing.is_empty() {
            return Err(AliasIndexError::MissingColumns(missing));
        }
        let (idx_code, idx_display, idx_alias) =
            (idx_code.unwrap(), idx_display.unwrap(), idx_alias.unwrap());

        let mut index: HashMap<String, BTreeSet<String>> = HashMap::new();
        let mut canonical_to_display: HashMap<String, String> = HashMap::new();

        for row in rows {
            let canonical_code = row.get(idx_code).map(|c| c.to_string()).unwrap_or_default();
            let canonical_code = canonical_code.trim();
            if canonical_code.is_empty() || canonical_code == "nan" {
                continue;
            }
            let canonical_display =
                row.get(idx_display).map(|c| c.to_string()).unwrap_or_default();
            let raw_alias = row.get(idx_alias).map(|c| c.to_string()).unwrap_or_default();

            let normalized_alias = normalize(&raw_alias);
            if normalized_alias.is_empty() {
                continue;
            }

            index
                .entry(normalized_alias)
                .or_default()
                .insert(canonical_code.to_string());
            canonical_to_display
                .entry(canonical_code.to_string())
                .or_insert(canonical_display.trim().to_string());
        }

        info!(
            aliases = index.len(),
            canonical_codes = canonical_to_display.len(),
            "alias index built from workbook"
        );

        Ok(Self { index, canonical_to_display })
    }

    /// Resolve a query to a sorted, deduplicated list of canonical codes.
    /// If the query is cancer-related and the guardrail is enabled, the
    /// result is unioned with all four cancer-family canonicals.
    pub fn resolve_query(&self, query: &str, apply_cancer_guardrail: bool) -> Vec<String> {
        let normalized_query = normalize(query);
        if normalized_query.is_empty() {
            return Vec::new();
        }

        let mut codes: BTreeSet<String> =
            self.index.get(&normalized_query).cloned().unwrap_or_default();

        if apply_cancer_guardrail && is_cancer_query(&normalized_query) {
            debug!(query, "cancer guardrail triggered, unioning cancer canonicals");
            for cancer in CancerCanonical::ALL {
                codes.insert(cancer.code().to_string());
            }
        }

        codes.into_iter().collect()
    }

    pub fn get_display_name(&self, canonical_code: &str) -> Option<&str> {
        self.canonical_to_display.get(canonical_code).map(|s| s.as_str())
    }

    /// All four cancer-family canonicals, regardless of whether the
    /// workbook happened to carry rows for them.
    pub fn cancer_canonical_codes(&self) -> BTreeSet<String> {
        CancerCanonical::ALL.iter().map(|c| c.code().to_string()).collect()
    }

    pub fn alias_count(&self) -> usize {
        self.index.len()
    }

    /// Whether a query trips the cancer-family keyword guardrail, exposed
    /// so callers can decide whether to run evidence-based cancer scope
    /// decisioning before falling back to a plain alias lookup.
    pub fn is_cancer_query(&self, query: &str) -> bool {
        is_cancer_query(&normalize(query))
    }
}

fn is_cancer_query(normalized_query: &str) -> bool {
    CANCER_QUERY_KEYWORDS
        .iter()
        .any(|kw| normalized_query.contains(&normalize(kw)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toy_index() -> AliasIndex {
        let mut index = HashMap::new();
        index.insert("암진단비".to_string(), BTreeSet::from(["CA_DIAG_GENERAL".to_string()]));
        index.insert(
            "다빈치수술비".to_string(),
            BTreeSet::from(["SURGERY_ROBOT".to_string()]),
        );
        let mut display = HashMap::new();
        display.insert("CA_DIAG_GENERAL".to_string(), "암진단비(일반암)".to_string());
        display.insert("SURGERY_ROBOT".to_string(), "다빈치로봇수술비".to_string());
        AliasIndex { index, canonical_to_display: display }
    }

    #[test]
    fn resolves_direct_alias_match() {
        let idx = toy_index();
        assert_eq!(idx.resolve_query("다빈치 수술비", false), vec!["SURGERY_ROBOT".to_string()]);
    }

    #[test]
    fn cancer_guardrail_unions_all_cancer_canonicals() {
        let idx = toy_index();
        let resolved = idx.resolve_query("유사암진단비", true);
        assert_eq!(resolved.len(), 4);
        assert!(resolved.contains(&"CA_DIAG_SIMILAR".to_string()));
    }

    #[test]
    fn guardrail_disabled_does_not_expand() {
        let idx = toy_index();
        let resolved = idx.resolve_query("듣도보도못한유사암특약", false);
        assert!(resolved.is_empty());
    }

    #[test]
    fn unmapped_query_yields_empty_not_error() {
        let idx = toy_index();
        assert!(idx.resolve_query("전혀다른담보", false).is_empty());
    }

    #[test]
    fn load_fails_fast_on_missing_workbook() {
        let err = AliasIndex::load("/nonexistent/path/workbook.xlsx");
        assert!(err.is_err());
    }
}
