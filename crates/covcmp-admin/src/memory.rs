//! In-memory `AdminMappingStore` used by tests and local tooling. Holds
//! the same four tables the Postgres implementation writes
//! (`mapping_event_queue`, `coverage_code_alias`, `coverage_name_map`,
//! `admin_audit_log`) plus a seedable canonical registry
//! (`coverage_standard`) so the canonical coverage rule can be exercised
//! without a database.

use crate::logic::{approve_audit_snapshots, assert_open, conflict_error, detect_conflict, resolution_target_text, terminal_audit_snapshots};
use crate::store::AdminMappingStore;
use crate::types::{
    ApprovalResult, ApproveEventRequest, AuditAction, AuditLogEntry, CreateMappingEventRequest, DetectedStatus,
    EventState, MappingEvent, MappingEventSummary, RejectEventRequest, ResolutionType, SnoozeEventRequest,
    TargetType,
};
use async_trait::async_trait;
use chrono::Utc;
use covcmp_foundation::error::CoreError;
use covcmp_registry::InsurerCode;
use std::collections::HashMap;
use std::sync::Mutex;
use uuid::Uuid;

#[derive(Default)]
struct State {
    events: Vec<MappingEvent>,
    audit_log: Vec<AuditLogEntry>,
    canonical_codes: std::collections::HashSet<String>,
    aliases: HashMap<(InsurerCode, String), String>,
    name_maps: HashMap<(InsurerCode, String), String>,
    next_audit_id: i64,
}

pub struct InMemoryAdminMappingStore {
    state: Mutex<State>,
}

impl Default for InMemoryAdminMappingStore {
    fn default() -> Self {
        Self {
            state: Mutex::new(State {
                next_audit_id: 1,
                ..State::default()
            }),
        }
    }
}

impl InMemoryAdminMappingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the canonical registry (신정원 통일코드) a coverage_code must
    /// exist in before an APPROVE may bind it.
    pub fn seed_canonical_code(&self, coverage_code: impl Into<String>) {
        self.state.lock().unwrap().canonical_codes.insert(coverage_code.into());
    }
}

#[async_trait]
impl AdminMappingStore for InMemoryAdminMappingStore {
    async fn create_or_update_event(&self, request: CreateMappingEventRequest) -> Result<Uuid, CoreError> {
        let mut state = self.state.lock().unwrap();
        let existing_id = state
            .events
            .iter()
            .find(|e| {
                e.insurer == request.insurer
                    && e.raw_coverage_title == request.raw_coverage_title
                    && e.detected_status == request.detected_status
                    && e.state == EventState::Open
            })
            .map(|e| e.id);

        if let Some(id) = existing_id {
            let event = state.events.iter_mut().find(|e| e.id == id).unwrap();
            event.query_text = request.query_text;
            event.normalized_query = request.normalized_query;
            event.candidate_coverage_codes = request.candidate_coverage_codes;
            event.evidence_ref_ids = request.evidence_ref_ids;
            event.updated_at = Utc::now();
            Ok(id)
        } else {
            let now = Utc::now();
            let id = Uuid::new_v4();
            state.events.push(MappingEvent {
                id,
                created_at: now,
                updated_at: now,
                insurer: request.insurer,
                query_text: request.query_text,
                normalized_query: request.normalized_query,
                raw_coverage_title: request.raw_coverage_title,
                detected_status: request.detected_status,
                candidate_coverage_codes: request.candidate_coverage_codes,
                evidence_ref_ids: request.evidence_ref_ids,
                state: EventState::Open,
                resolved_coverage_code: None,
                resolution_type: None,
                resolution_note: None,
                resolved_at: None,
                resolved_by: None,
            });
            Ok(id)
        }
    }

    async fn approve_event(&self, request: ApproveEventRequest) -> Result<ApprovalResult, CoreError> {
        let mut state = self.state.lock().unwrap();

        let event = state
            .events
            .iter()
            .find(|e| e.id == request.event_id)
            .cloned()
            .ok_or_else(|| CoreError::Validation(format!("event {} not found", request.event_id)))?;
        assert_open(request.event_id, event.state)?;

        if !state.canonical_codes.contains(&request.coverage_code) {
            return Err(CoreError::DataInsufficient(format!(
                "coverage code '{}' does not exist in canonical source (신정원 통일코드)",
                request.coverage_code
            )));
        }

        let target_text = resolution_target_text(request.resolution_type, &event).to_string();
        match request.resolution_type {
            ResolutionType::Alias => {
                let key = (event.insurer, target_text.clone());
                if let Some(conflict) = detect_conflict(state.aliases.get(&key).map(|s| s.as_str()), &request.coverage_code) {
                    return Err(conflict_error(&conflict));
                }
            }
            ResolutionType::NameMap => {
                let key = (event.insurer, target_text.clone());
                if let Some(conflict) = detect_conflict(state.name_maps.get(&key).map(|s| s.as_str()), &request.coverage_code) {
                    return Err(conflict_error(&conflict));
                }
            }
            ResolutionType::ManualNote => {}
        }

        let (before, after) = approve_audit_snapshots(&event, &request.coverage_code, request.resolution_type);

        match request.resolution_type {
            ResolutionType::Alias => {
                state.aliases.insert((event.insurer, target_text), request.coverage_code.clone());
            }
            ResolutionType::NameMap => {
                state.name_maps.insert((event.insurer, target_text), request.coverage_code.clone());
            }
            ResolutionType::ManualNote => {}
        }

        let now = Utc::now();
        let stored = state.events.iter_mut().find(|e| e.id == request.event_id).unwrap();
        stored.state = EventState::Approved;
        stored.resolved_coverage_code = Some(request.coverage_code.clone());
        stored.resolution_type = Some(request.resolution_type);
        stored.resolution_note = request.note.clone();
        stored.resolved_at = Some(now);
        stored.resolved_by = Some(request.actor.clone());

        let audit_id = state.next_audit_id;
        state.next_audit_id += 1;
        state.audit_log.push(AuditLogEntry {
            id: audit_id,
            created_at: now,
            actor: request.actor,
            action: AuditAction::Approve,
            target_type: TargetType::Event,
            target_id: request.event_id.to_string(),
            before: Some(before),
            after: Some(after),
            evidence_ref_ids: event.evidence_ref_ids,
            note: request.note,
        });

        Ok(ApprovalResult {
            success: true,
            event_id: request.event_id,
            resolved_coverage_code: request.coverage_code.clone(),
            resolution_type: request.resolution_type,
            audit_log_id: audit_id,
            message: format!("Event approved and {:?} mapping created", request.resolution_type),
        })
    }

    async fn reject_event(&self, request: RejectEventRequest) -> Result<i64, CoreError> {
        let mut state = self.state.lock().unwrap();
        let prior_state = state
            .events
            .iter()
            .find(|e| e.id == request.event_id)
            .map(|e| e.state)
            .ok_or_else(|| CoreError::Validation(format!("event {} not found", request.event_id)))?;

        let (before, after) = terminal_audit_snapshots(prior_state, EventState::Rejected);

        let now = Utc::now();
        let event = state.events.iter_mut().find(|e| e.id == request.event_id).unwrap();
        event.state = EventState::Rejected;
        event.resolution_note = request.note.clone();
        event.resolved_at = Some(now);
        event.resolved_by = Some(request.actor.clone());

        let audit_id = state.next_audit_id;
        state.next_audit_id += 1;
        state.audit_log.push(AuditLogEntry {
            id: audit_id,
            created_at: now,
            actor: request.actor,
            action: AuditAction::Reject,
            target_type: TargetType::Event,
            target_id: request.event_id.to_string(),
            before: Some(before),
            after: Some(after),
            evidence_ref_ids: None,
            note: request.note,
        });
        Ok(audit_id)
    }

    async fn snooze_event(&self, request: SnoozeEventRequest) -> Result<i64, CoreError> {
        let mut state = self.state.lock().unwrap();
        let prior_state = state
            .events
            .iter()
            .find(|e| e.id == request.event_id)
            .map(|e| e.state)
            .ok_or_else(|| CoreError::Validation(format!("event {} not found", request.event_id)))?;

        let (before, after) = terminal_audit_snapshots(prior_state, EventState::Snoozed);

        let now = Utc::now();
        let event = state.events.iter_mut().find(|e| e.id == request.event_id).unwrap();
        event.state = EventState::Snoozed;
        event.resolution_note = request.note.clone();
        event.resolved_at = Some(now);
        event.resolved_by = Some(request.actor.clone());

        let audit_id = state.next_audit_id;
        state.next_audit_id += 1;
        state.audit_log.push(AuditLogEntry {
            id: audit_id,
            created_at: now,
            actor: request.actor,
            action: AuditAction::Snooze,
            target_type: TargetType::Event,
            target_id: request.event_id.to_string(),
            before: Some(before),
            after: Some(after),
            evidence_ref_ids: None,
            note: request.note,
        });
        Ok(audit_id)
    }

    async fn get_queue(
        &self,
        state_filter: Option<EventState>,
        insurer_filter: Option<InsurerCode>,
        page: u32,
        page_size: u32,
    ) -> Result<(Vec<MappingEventSummary>, i64), CoreError> {
        let state = self.state.lock().unwrap();
        let mut matching: Vec<&MappingEvent> = state
            .events
            .iter()
            .filter(|e| state_filter.map_or(true, |s| e.state == s))
            .filter(|e| insurer_filter.map_or(true, |i| e.insurer == i))
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let total = matching.len() as i64;
        let offset = ((page.max(1) - 1) * page_size) as usize;
        let page_slice = matching.into_iter().skip(offset).take(page_size as usize);

        let summaries = page_slice
            .map(|e| MappingEventSummary {
                id: e.id,
                created_at: e.created_at,
                updated_at: e.updated_at,
                insurer: e.insurer,
                raw_coverage_title: e.raw_coverage_title.clone(),
                detected_status: e.detected_status,
                state: e.state,
                candidate_count: e.candidate_coverage_codes.as_ref().map_or(0, |c| c.len() as i64),
            })
            .collect();
        Ok((summaries, total))
    }

    async fn get_event_detail(&self, event_id: Uuid) -> Result<Option<MappingEvent>, CoreError> {
        Ok(self.state.lock().unwrap().events.iter().find(|e| e.id == event_id).cloned())
    }

    async fn get_audit_logs(
        &self,
        target_type: Option<TargetType>,
        target_id: Option<String>,
        limit: u32,
    ) -> Result<Vec<AuditLogEntry>, CoreError> {
        let state = self.state.lock().unwrap();
        let mut matching: Vec<AuditLogEntry> = state
            .audit_log
            .iter()
            .filter(|a| target_type.map_or(true, |t| a.target_type == t))
            .filter(|a| target_id.as_deref().map_or(true, |id| a.target_id == id))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        matching.truncate(limit as usize);
        Ok(matching)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_request(insurer: InsurerCode, raw_title: &str) -> CreateMappingEventRequest {
        CreateMappingEventRequest {
            insurer,
            query_text: raw_title.to_string(),
            normalized_query: Some(raw_title.to_string()),
            raw_coverage_title: raw_title.to_string(),
            detected_status: DetectedStatus::Unmapped,
            candidate_coverage_codes: Some(vec!["CA_DIAG_GENERAL".into()]),
            evidence_ref_ids: None,
        }
    }

    #[tokio::test]
    async fn scenario_f_admin_approve_happy_path() {
        let store = InMemoryAdminMappingStore::new();
        store.seed_canonical_code("CA_DIAG_GENERAL");

        let event_id = store
            .create_or_update_event(create_request(InsurerCode::Samsung, "일반암 진단비"))
            .await
            .unwrap();

        let result = store
            .approve_event(ApproveEventRequest {
                event_id,
                coverage_code: "CA_DIAG_GENERAL".into(),
                resolution_type: ResolutionType::NameMap,
                note: None,
                actor: "admin".into(),
            })
            .await
            .unwrap();

        assert!(result.success);
        assert_eq!(result.resolved_coverage_code, "CA_DIAG_GENERAL");
        assert_eq!(result.resolution_type, ResolutionType::NameMap);

        let detail = store.get_event_detail(event_id).await.unwrap().unwrap();
        assert_eq!(detail.state, EventState::Approved);
        assert_eq!(detail.resolved_coverage_code.as_deref(), Some("CA_DIAG_GENERAL"));

        let logs = store.get_audit_logs(Some(TargetType::Event), Some(event_id.to_string()), 10).await.unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].before.as_ref().unwrap()["state"], serde_json::json!("OPEN"));
        assert_eq!(logs[0].after.as_ref().unwrap()["state"], serde_json::json!("APPROVED"));
        assert_eq!(
            logs[0].after.as_ref().unwrap()["resolved_coverage_code"],
            serde_json::json!("CA_DIAG_GENERAL")
        );
    }

    #[tokio::test]
    async fn approve_rejects_unknown_canonical_code() {
        let store = InMemoryAdminMappingStore::new();
        let event_id = store
            .create_or_update_event(create_request(InsurerCode::Samsung, "일반암 진단비"))
            .await
            .unwrap();

        let err = store
            .approve_event(ApproveEventRequest {
                event_id,
                coverage_code: "INVALID_CODE".into(),
                resolution_type: ResolutionType::NameMap,
                note: None,
                actor: "admin".into(),
            })
            .await
            .unwrap_err();
        assert_eq!(err.http_status(), 424);
    }

    #[tokio::test]
    async fn approve_rejects_conflicting_name_map_binding() {
        let store = InMemoryAdminMappingStore::new();
        store.seed_canonical_code("CA_DIAG_GENERAL");
        store.seed_canonical_code("CA_DIAG_OTHER");

        let first = store
            .create_or_update_event(create_request(InsurerCode::Samsung, "일반암 진단비"))
            .await
            .unwrap();
        store
            .approve_event(ApproveEventRequest {
                event_id: first,
                coverage_code: "CA_DIAG_GENERAL".into(),
                resolution_type: ResolutionType::NameMap,
                note: None,
                actor: "admin".into(),
            })
            .await
            .unwrap();

        let second = store
            .create_or_update_event(CreateMappingEventRequest {
                detected_status: DetectedStatus::Ambiguous,
                ..create_request(InsurerCode::Samsung, "일반암 진단비")
            })
            .await
            .unwrap();

        let err = store
            .approve_event(ApproveEventRequest {
                event_id: second,
                coverage_code: "CA_DIAG_OTHER".into(),
                resolution_type: ResolutionType::NameMap,
                note: None,
                actor: "admin".into(),
            })
            .await
            .unwrap_err();
        assert_eq!(err.http_status(), 409);
    }

    #[tokio::test]
    async fn approve_refuses_non_open_event() {
        let store = InMemoryAdminMappingStore::new();
        store.seed_canonical_code("CA_DIAG_GENERAL");
        let event_id = store
            .create_or_update_event(create_request(InsurerCode::Samsung, "일반암 진단비"))
            .await
            .unwrap();
        store.reject_event(RejectEventRequest { event_id, note: None, actor: "admin".into() }).await.unwrap();

        let err = store
            .approve_event(ApproveEventRequest {
                event_id,
                coverage_code: "CA_DIAG_GENERAL".into(),
                resolution_type: ResolutionType::NameMap,
                note: None,
                actor: "admin".into(),
            })
            .await
            .unwrap_err();
        assert_eq!(err.http_status(), 400);
    }

    #[tokio::test]
    async fn reject_and_snooze_transition_state_and_log() {
        let store = InMemoryAdminMappingStore::new();
        let event_id = store
            .create_or_update_event(create_request(InsurerCode::Meritz, "유사암 진단금"))
            .await
            .unwrap();

        store
            .snooze_event(SnoozeEventRequest { event_id, note: Some("follow up".into()), actor: "admin".into() })
            .await
            .unwrap();
        let detail = store.get_event_detail(event_id).await.unwrap().unwrap();
        assert_eq!(detail.state, EventState::Snoozed);
        assert_eq!(detail.resolution_note.as_deref(), Some("follow up"));
    }

    #[tokio::test]
    async fn deduplication_updates_the_open_event_instead_of_creating_a_second() {
        let store = InMemoryAdminMappingStore::new();
        let request = create_request(InsurerCode::Meritz, "유사암 진단금");

        let first = store.create_or_update_event(request.clone()).await.unwrap();
        let second = store.create_or_update_event(request).await.unwrap();
        assert_eq!(first, second);

        let (events, total) = store.get_queue(Some(EventState::Open), None, 1, 50).await.unwrap();
        assert_eq!(total, 1);
        assert_eq!(events.len(), 1);
    }
}
