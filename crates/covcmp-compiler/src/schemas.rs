//! Compiler input/output schemas (spec §4.9). Every field is
//! schema-validated and none are inferred — `#[serde(deny_unknown_fields)]`
//! mirrors the Pydantic `Config.extra = "forbid"` of the original.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// User-selected options (never inferred — these come from the
/// clarification panel, not from the query text).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CompileOptions {
    pub surgery_method: Option<String>,
    pub cancer_subtypes: Option<Vec<String>>,
    pub comparison_focus: Option<String>,
}

/// Input to the deterministic compiler.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CompileInput {
    pub user_query: String,
    pub selected_insurers: Vec<String>,
    pub selected_comparison_basis: Option<String>,
    pub options: Option<CompileOptions>,
}

/// Debug information kept fact-only: what rule version ran, what slots
/// were resolved, and the decision trace — never a recommendation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CompilerDebug {
    pub rule_version: String,
    pub resolved_coverage_codes: Option<Vec<String>>,
    #[serde(default)]
    pub selected_slots: IndexMap<String, Value>,
    #[serde(default)]
    pub decision_trace: Vec<String>,
    #[serde(default)]
    pub warnings: Vec<String>,
}

/// Output from the deterministic compiler: a compare-request-compatible
/// payload plus the debug trace for reproducibility.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CompileOutput {
    pub compiled_request: IndexMap<String, Value>,
    pub compiler_debug: CompilerDebug,
}
