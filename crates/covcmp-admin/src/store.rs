//! The `AdminMappingStore` boundary (spec §4.15): every operation the
//! workbench exposes, implemented once against Postgres (`pg.rs`) and
//! once in memory for tests. Approve/reject/snooze are each expected to
//! be all-or-nothing — an implementation runs its writes inside a single
//! transaction and lets `?` roll it back on any failure.

use crate::types::{
    ApprovalResult, ApproveEventRequest, CreateMappingEventRequest, MappingEventSummary, RejectEventRequest,
    SnoozeEventRequest,
};
use crate::types::{AuditLogEntry, EventState, MappingEvent, TargetType};
use async_trait::async_trait;
use covcmp_foundation::error::CoreError;
use uuid::Uuid;

#[async_trait]
pub trait AdminMappingStore: Send + Sync {
    async fn create_or_update_event(&self, request: CreateMappingEventRequest) -> Result<Uuid, CoreError>;

    async fn approve_event(&self, request: ApproveEventRequest) -> Result<ApprovalResult, CoreError>;

    async fn reject_event(&self, request: RejectEventRequest) -> Result<i64, CoreError>;

    async fn snooze_event(&self, request: SnoozeEventRequest) -> Result<i64, CoreError>;

    async fn get_queue(
        &self,
        state: Option<EventState>,
        insurer: Option<covcmp_registry::InsurerCode>,
        page: u32,
        page_size: u32,
    ) -> Result<(Vec<MappingEventSummary>, i64), CoreError>;

    async fn get_event_detail(&self, event_id: Uuid) -> Result<Option<MappingEvent>, CoreError>;

    async fn get_audit_logs(
        &self,
        target_type: Option<TargetType>,
        target_id: Option<String>,
        limit: u32,
    ) -> Result<Vec<AuditLogEntry>, CoreError>;
}
