//! ViewModel Assembler + Schema Guard (spec §4.13): converts a resolved
//! comparison into the single JSON structure the UI renders, then checks
//! the result against the frozen `next4.v1` schema before handing it
//! back. Fact-only, deterministic, and the schema check is a hard gate —
//! never a warning.

pub mod assembler;
pub mod schema;
pub mod types;

pub use assembler::{assemble_view_model, format_amount, generate_evidence_id, map_status, SCHEMA_VERSION};
pub use schema::validate_view_model;
pub use types::{
    AmountInfo, BBox, Debug, EvidencePanel, FactTable, FactTableRow, Header, InsurerSnapshot, PayoutCondition,
    RetrievalInfo, SlotKey, Snapshot, StatusCode, ViewModel,
};
