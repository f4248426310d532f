//! Data model for the Admin Mapping Workbench (spec §4.15): the event
//! queue a human resolves UNMAPPED/AMBIGUOUS coverage through, and the
//! audit log every resolution appends to.

use chrono::{DateTime, Utc};
use covcmp_registry::InsurerCode;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Why the event landed in the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DetectedStatus {
    Unmapped,
    Ambiguous,
}

/// State machine for a `MappingEvent` (spec §4.15):
/// `OPEN -> APPROVED | REJECTED | SNOOZED`, each transition terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventState {
    Open,
    Approved,
    Rejected,
    Snoozed,
}

impl EventState {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventState::Open => "OPEN",
            EventState::Approved => "APPROVED",
            EventState::Rejected => "REJECTED",
            EventState::Snoozed => "SNOOZED",
        }
    }
}

impl fmt::Display for EventState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown event state: {0}")]
pub struct UnknownEventState(pub String);

impl FromStr for EventState {
    type Err = UnknownEventState;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "OPEN" => Ok(EventState::Open),
            "APPROVED" => Ok(EventState::Approved),
            "REJECTED" => Ok(EventState::Rejected),
            "SNOOZED" => Ok(EventState::Snoozed),
            other => Err(UnknownEventState(other.to_string())),
        }
    }
}

/// Which canonical-mapping table an APPROVE writes into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResolutionType {
    Alias,
    NameMap,
    ManualNote,
}

impl ResolutionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResolutionType::Alias => "ALIAS",
            ResolutionType::NameMap => "NAME_MAP",
            ResolutionType::ManualNote => "MANUAL_NOTE",
        }
    }
}

impl fmt::Display for ResolutionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown resolution type: {0}")]
pub struct UnknownResolutionType(pub String);

impl FromStr for ResolutionType {
    type Err = UnknownResolutionType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "ALIAS" => Ok(ResolutionType::Alias),
            "NAME_MAP" => Ok(ResolutionType::NameMap),
            "MANUAL_NOTE" => Ok(ResolutionType::ManualNote),
            other => Err(UnknownResolutionType(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    Approve,
    Reject,
    Snooze,
    UpsertAlias,
    UpsertNameMap,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TargetType {
    Event,
    Alias,
    NameMap,
}

impl TargetType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetType::Event => "EVENT",
            TargetType::Alias => "ALIAS",
            TargetType::NameMap => "NAME_MAP",
        }
    }
}

impl fmt::Display for TargetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown target type: {0}")]
pub struct UnknownTargetType(pub String);

impl FromStr for TargetType {
    type Err = UnknownTargetType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "EVENT" => Ok(TargetType::Event),
            "ALIAS" => Ok(TargetType::Alias),
            "NAME_MAP" => Ok(TargetType::NameMap),
            other => Err(UnknownTargetType(other.to_string())),
        }
    }
}

/// Full row of `mapping_event_queue`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappingEvent {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub insurer: InsurerCode,
    pub query_text: String,
    pub normalized_query: Option<String>,
    pub raw_coverage_title: String,
    pub detected_status: DetectedStatus,
    pub candidate_coverage_codes: Option<Vec<String>>,
    pub evidence_ref_ids: Option<Vec<String>>,
    pub state: EventState,
    pub resolved_coverage_code: Option<String>,
    pub resolution_type: Option<ResolutionType>,
    pub resolution_note: Option<String>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub resolved_by: Option<String>,
}

/// Queue row projection (spec §4.15 `get_queue`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappingEventSummary {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub insurer: InsurerCode,
    pub raw_coverage_title: String,
    pub detected_status: DetectedStatus,
    pub state: EventState,
    pub candidate_count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateMappingEventRequest {
    pub insurer: InsurerCode,
    pub query_text: String,
    pub normalized_query: Option<String>,
    pub raw_coverage_title: String,
    pub detected_status: DetectedStatus,
    pub candidate_coverage_codes: Option<Vec<String>>,
    pub evidence_ref_ids: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApproveEventRequest {
    pub event_id: Uuid,
    pub coverage_code: String,
    pub resolution_type: ResolutionType,
    pub note: Option<String>,
    pub actor: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RejectEventRequest {
    pub event_id: Uuid,
    pub note: Option<String>,
    pub actor: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnoozeEventRequest {
    pub event_id: Uuid,
    pub note: Option<String>,
    pub actor: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApprovalResult {
    pub success: bool,
    pub event_id: Uuid,
    pub resolved_coverage_code: String,
    pub resolution_type: ResolutionType,
    pub audit_log_id: i64,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditLogEntry {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub actor: String,
    pub action: AuditAction,
    pub target_type: TargetType,
    pub target_id: String,
    pub before: Option<serde_json::Value>,
    pub after: Option<serde_json::Value>,
    pub evidence_ref_ids: Option<Vec<String>>,
    pub note: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_state_round_trips_through_display_and_parse() {
        for state in [EventState::Open, EventState::Approved, EventState::Rejected, EventState::Snoozed] {
            let parsed: EventState = state.as_str().parse().unwrap();
            assert_eq!(parsed, state);
        }
    }

    #[test]
    fn resolution_type_round_trips_through_display_and_parse() {
        for t in [ResolutionType::Alias, ResolutionType::NameMap, ResolutionType::ManualNote] {
            let parsed: ResolutionType = t.as_str().parse().unwrap();
            assert_eq!(parsed, t);
        }
    }

    #[test]
    fn target_type_round_trips_through_display_and_parse() {
        for t in [TargetType::Event, TargetType::Alias, TargetType::NameMap] {
            let parsed: TargetType = t.as_str().parse().unwrap();
            assert_eq!(parsed, t);
        }
    }

    #[test]
    fn unknown_event_state_is_rejected() {
        assert!("BOGUS".parse::<EventState>().is_err());
    }
}
