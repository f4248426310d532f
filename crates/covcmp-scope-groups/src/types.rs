//! Row types for `disease_code_group`, `disease_code_group_member`, and
//! `coverage_disease_scope` (spec §3, §4.12).

use covcmp_registry::InsurerCode;
use serde::{Deserialize, Serialize};

/// A disease-code group: either a medical/KCD classification shared
/// across insurers (`insurer = None`) or an insurer-specific insurance
/// concept like 유사암/소액암 (`insurer = Some(_)`, enforced by
/// [`crate::pipeline::create_disease_code_group`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiseaseCodeGroup {
    pub group_id: String,
    pub group_label: String,
    pub insurer: Option<InsurerCode>,
    pub version_tag: String,
    pub basis_doc_id: String,
    pub basis_page: u32,
    pub basis_span: String,
}

/// A single member of a group: either one KCD-7 code or a `[from, to]`
/// range. Never both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GroupMember {
    Code(String),
    Range { from: String, to: String },
}

/// `coverage_disease_scope`: links a canonical coverage for one
/// insurer's proposal to the group(s) that define its disease scope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverageDiseaseScope {
    pub canonical_coverage_code: String,
    pub insurer: InsurerCode,
    pub proposal_id: String,
    pub include_group_id: String,
    pub exclude_group_id: Option<String>,
    pub source_doc_id: String,
    pub source_page: u32,
    pub span_text: String,
    pub extraction_rule_id: String,
}
