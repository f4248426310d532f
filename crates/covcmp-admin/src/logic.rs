//! Pure decision logic for the Admin Mapping Workbench, factored out of
//! the transactional store so it is testable without a database
//! (spec §4.15: safe defaults, canonical coverage rule, auditability).

use crate::types::{EventState, MappingEvent, ResolutionType};
use covcmp_foundation::error::CoreError;

/// Refuse to act on anything but an OPEN event — approve/reject/snooze
/// are each a terminal transition out of OPEN.
pub fn assert_open(event_id: impl std::fmt::Display, state: EventState) -> Result<(), CoreError> {
    if state == EventState::Open {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "event {event_id} is not OPEN (state: {state:?})"
        )))
    }
}

/// Text a resolution binds to the target table's unique key: ALIAS keys
/// on the (possibly normalized) query text, NAME_MAP and MANUAL_NOTE key
/// on the raw coverage title as it was detected.
pub fn resolution_target_text<'a>(resolution_type: ResolutionType, event: &'a MappingEvent) -> &'a str {
    match resolution_type {
        ResolutionType::Alias => event.normalized_query.as_deref().unwrap_or(&event.query_text),
        ResolutionType::NameMap | ResolutionType::ManualNote => &event.raw_coverage_title,
    }
}

/// Safe defaults: an existing binding to a *different* code is a
/// conflict; no existing binding, or a binding to the same code, is not.
pub fn detect_conflict(existing_code: Option<&str>, requested_code: &str) -> Option<String> {
    existing_code
        .filter(|existing| *existing != requested_code)
        .map(|existing| existing.to_string())
}

pub fn conflict_error(existing_code: &str) -> CoreError {
    CoreError::Conflict {
        existing_code: existing_code.to_string(),
    }
}

/// Before/after snapshots for the audit log entry an APPROVE appends.
pub fn approve_audit_snapshots(
    event: &MappingEvent,
    coverage_code: &str,
    resolution_type: ResolutionType,
) -> (serde_json::Value, serde_json::Value) {
    let before = serde_json::json!({
        "state": event.state,
        "resolved_coverage_code": event.resolved_coverage_code,
        "resolution_type": event.resolution_type,
    });
    let after = serde_json::json!({
        "state": EventState::Approved,
        "resolved_coverage_code": coverage_code,
        "resolution_type": resolution_type,
    });
    (before, after)
}

/// Before/after snapshots for REJECT/SNOOZE, which only ever touch `state`.
pub fn terminal_audit_snapshots(before_state: EventState, after_state: EventState) -> (serde_json::Value, serde_json::Value) {
    (
        serde_json::json!({ "state": before_state }),
        serde_json::json!({ "state": after_state }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DetectedStatus;
    use chrono::Utc;
    use covcmp_registry::InsurerCode;
    use uuid::Uuid;

    fn sample_event(state: EventState) -> MappingEvent {
        MappingEvent {
            id: Uuid::nil(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
            insurer: InsurerCode::Samsung,
            query_text: "일반암진단비".into(),
            normalized_query: Some("일반암진단비".into()),
            raw_coverage_title: "일반암 진단비".into(),
            detected_status: DetectedStatus::Unmapped,
            candidate_coverage_codes: Some(vec!["CA_DIAG_GENERAL".into()]),
            evidence_ref_ids: None,
            state,
            resolved_coverage_code: None,
            resolution_type: None,
            resolution_note: None,
            resolved_at: None,
            resolved_by: None,
        }
    }

    #[test]
    fn assert_open_accepts_open_state() {
        assert!(assert_open("evt", EventState::Open).is_ok());
    }

    #[test]
    fn assert_open_rejects_any_terminal_state() {
        for state in [EventState::Approved, EventState::Rejected, EventState::Snoozed] {
            assert!(assert_open("evt", state).is_err());
        }
    }

    #[test]
    fn alias_resolution_prefers_normalized_query() {
        let event = sample_event(EventState::Open);
        assert_eq!(resolution_target_text(ResolutionType::Alias, &event), "일반암진단비");
    }

    #[test]
    fn alias_resolution_falls_back_to_query_text_when_unnormalized() {
        let mut event = sample_event(EventState::Open);
        event.normalized_query = None;
        event.query_text = "raw query".into();
        assert_eq!(resolution_target_text(ResolutionType::Alias, &event), "raw query");
    }

    #[test]
    fn name_map_resolution_uses_raw_coverage_title() {
        let event = sample_event(EventState::Open);
        assert_eq!(
            resolution_target_text(ResolutionType::NameMap, &event),
            "일반암 진단비"
        );
    }

    #[test]
    fn no_conflict_when_no_existing_binding() {
        assert_eq!(detect_conflict(None, "CA_DIAG_GENERAL"), None);
    }

    #[test]
    fn no_conflict_when_existing_binding_matches() {
        assert_eq!(detect_conflict(Some("CA_DIAG_GENERAL"), "CA_DIAG_GENERAL"), None);
    }

    #[test]
    fn conflict_when_existing_binding_differs() {
        assert_eq!(
            detect_conflict(Some("CA_DIAG_OTHER"), "CA_DIAG_GENERAL"),
            Some("CA_DIAG_OTHER".to_string())
        );
    }

    #[test]
    fn conflict_error_is_conflict_variant_with_existing_code() {
        let err = conflict_error("CA_DIAG_OTHER");
        assert_eq!(err.http_status(), 409);
    }

    #[test]
    fn approve_snapshots_capture_state_transition() {
        let event = sample_event(EventState::Open);
        let (before, after) = approve_audit_snapshots(&event, "CA_DIAG_GENERAL", ResolutionType::NameMap);
        assert_eq!(before["state"], serde_json::json!("OPEN"));
        assert_eq!(after["state"], serde_json::json!("APPROVED"));
        assert_eq!(after["resolved_coverage_code"], serde_json::json!("CA_DIAG_GENERAL"));
        assert_eq!(after["resolution_type"], serde_json::json!("NAME_MAP"));
    }

    #[test]
    fn terminal_snapshots_capture_reject_transition() {
        let (before, after) = terminal_audit_snapshots(EventState::Open, EventState::Rejected);
        assert_eq!(before["state"], serde_json::json!("OPEN"));
        assert_eq!(after["state"], serde_json::json!("REJECTED"));
    }
}
