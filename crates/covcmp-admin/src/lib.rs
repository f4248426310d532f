//! Admin Mapping Workbench (spec §4.15): the event queue UNMAPPED/
//! AMBIGUOUS coverage lands in, and the only write path onto
//! `coverage_code_alias`/`coverage_name_map` — every bind goes through an
//! audit-logged, transactional approve/reject/snooze.

pub mod logic;
pub mod memory;
pub mod pg;
pub mod store;
pub mod types;

pub use memory::InMemoryAdminMappingStore;
pub use pg::PgAdminMappingStore;
pub use store::AdminMappingStore;
pub use types::{
    ApprovalResult, ApproveEventRequest, AuditAction, AuditLogEntry, CreateMappingEventRequest, DetectedStatus,
    EventState, MappingEvent, MappingEventSummary, RejectEventRequest, ResolutionType, SnoozeEventRequest,
    TargetType,
};
