//! Types matching `schema/next4.v1.json` (spec §4.13). This is the single
//! source of truth the UI renders without further processing — every
//! field here already carries its final display form.

use covcmp_registry::{DocumentType, InsurerCode};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StatusCode {
    Ok,
    MissingEvidence,
    Unmapped,
    Ambiguous,
    OutOfUniverse,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotKey {
    WaitingPeriod,
    PaymentFrequency,
    DiagnosisDefinition,
    MethodCondition,
    ExclusionScope,
    PayoutLimit,
    DiseaseScope,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmountInfo {
    pub amount_value: f64,
    pub amount_unit: String,
    pub display_text: String,
    pub evidence_ref_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Header {
    pub user_query: String,
    pub normalized_query: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsurerSnapshot {
    pub insurer: InsurerCode,
    pub headline_amount: Option<AmountInfo>,
    pub status: StatusCode,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub comparison_basis: String,
    pub insurers: Vec<InsurerSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayoutCondition {
    pub slot_key: SlotKey,
    pub value_text: String,
    pub evidence_ref_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactTableRow {
    pub insurer: InsurerCode,
    pub coverage_title_normalized: String,
    pub benefit_amount: Option<AmountInfo>,
    pub payout_conditions: Vec<PayoutCondition>,
    pub term_text: Option<String>,
    pub note_text: Option<String>,
    pub row_status: StatusCode,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactTable {
    pub columns: Vec<String>,
    pub rows: Vec<FactTableRow>,
}

impl FactTable {
    pub fn default_columns() -> Vec<String> {
        vec!["보험사", "담보명(정규화)", "보장금액", "지급 조건 요약", "보험기간", "비고"]
            .into_iter()
            .map(str::to_string)
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidencePanel {
    pub id: String,
    pub insurer: InsurerCode,
    pub doc_type: DocumentType,
    pub doc_title: Option<String>,
    pub page: String,
    pub excerpt: String,
    pub bbox: Option<BBox>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalInfo {
    pub topk: Option<u32>,
    pub strategy: Option<String>,
    pub doc_priority: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Debug {
    pub resolved_coverage_codes: Option<Vec<String>>,
    pub retrieval: Option<RetrievalInfo>,
    pub warnings: Option<Vec<String>>,
    pub execution_time_ms: Option<f64>,
}

/// Complete ViewModel for UI presentation (spec §4.13). Backend
/// generates this, frontend renders it without further processing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewModel {
    pub schema_version: String,
    pub generated_at: chrono::DateTime<chrono::Utc>,
    pub header: Header,
    pub snapshot: Snapshot,
    pub fact_table: FactTable,
    pub evidence_panels: Vec<EvidencePanel>,
    pub debug: Option<Debug>,
}
