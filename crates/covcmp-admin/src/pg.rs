//! Postgres implementation of the [`AdminMappingStore`] boundary.
//! `approve_event`/`reject_event`/`snooze_event` each open one
//! `sqlx::Transaction`, do every write inside it, and commit once at the
//! end — `?` on any step drops the transaction and rolls it back, so the
//! all-or-nothing guarantee (spec §4.15, Testable Property 9) is
//! structural rather than something the service layer has to enforce.

use crate::logic::{approve_audit_snapshots, assert_open, conflict_error, detect_conflict, resolution_target_text, terminal_audit_snapshots};
use crate::store::AdminMappingStore;
use crate::types::{
    ApprovalResult, ApproveEventRequest, AuditAction, AuditLogEntry, CreateMappingEventRequest, DetectedStatus,
    EventState, MappingEvent, MappingEventSummary, RejectEventRequest, ResolutionType, SnoozeEventRequest,
    TargetType,
};
use async_trait::async_trait;
use covcmp_foundation::error::CoreError;
use covcmp_registry::InsurerCode;
use sqlx::{postgres::PgRow, PgPool, QueryBuilder, Row};
use uuid::Uuid;

pub struct PgAdminMappingStore {
    pool: PgPool,
}

impl PgAdminMappingStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn sql_err(e: sqlx::Error) -> CoreError {
    CoreError::Internal(e.into())
}

fn row_to_event(row: PgRow) -> Result<MappingEvent, CoreError> {
    let insurer_raw: String = row.try_get("insurer").map_err(sql_err)?;
    let detected_status_raw: String = row.try_get("detected_status").map_err(sql_err)?;
    let state_raw: String = row.try_get("state").map_err(sql_err)?;
    let resolution_type_raw: Option<String> = row.try_get("resolution_type").map_err(sql_err)?;
    let candidate_codes_json: Option<serde_json::Value> = row.try_get("candidate_coverage_codes").map_err(sql_err)?;
    let evidence_ref_ids_json: Option<serde_json::Value> = row.try_get("evidence_ref_ids").map_err(sql_err)?;

    Ok(MappingEvent {
        id: row.try_get("id").map_err(sql_err)?,
        created_at: row.try_get("created_at").map_err(sql_err)?,
        updated_at: row.try_get("updated_at").map_err(sql_err)?,
        insurer: insurer_raw.parse().map_err(|_| CoreError::Validation(format!("unknown insurer code: {insurer_raw}")))?,
        query_text: row.try_get("query_text").map_err(sql_err)?,
        normalized_query: row.try_get("normalized_query").map_err(sql_err)?,
        raw_coverage_title: row.try_get("raw_coverage_title").map_err(sql_err)?,
        detected_status: match detected_status_raw.as_str() {
            "UNMAPPED" => DetectedStatus::Unmapped,
            "AMBIGUOUS" => DetectedStatus::Ambiguous,
            other => return Err(CoreError::Validation(format!("unknown detected_status: {other}"))),
        },
        candidate_coverage_codes: candidate_codes_json.map(|v| serde_json::from_value(v)).transpose().map_err(|e| CoreError::Internal(e.into()))?,
        evidence_ref_ids: evidence_ref_ids_json.map(|v| serde_json::from_value(v)).transpose().map_err(|e| CoreError::Internal(e.into()))?,
        state: match state_raw.as_str() {
            "OPEN" => EventState::Open,
            "APPROVED" => EventState::Approved,
            "REJECTED" => EventState::Rejected,
            "SNOOZED" => EventState::Snoozed,
            other => return Err(CoreError::Validation(format!("unknown event state: {other}"))),
        },
        resolved_coverage_code: row.try_get("resolved_coverage_code").map_err(sql_err)?,
        resolution_type: resolution_type_raw
            .map(|raw| match raw.as_str() {
                "ALIAS" => Ok(ResolutionType::Alias),
                "NAME_MAP" => Ok(ResolutionType::NameMap),
                "MANUAL_NOTE" => Ok(ResolutionType::ManualNote),
                other => Err(CoreError::Validation(format!("unknown resolution_type: {other}"))),
            })
            .transpose()?,
        resolution_note: row.try_get("resolution_note").map_err(sql_err)?,
        resolved_at: row.try_get("resolved_at").map_err(sql_err)?,
        resolved_by: row.try_get("resolved_by").map_err(sql_err)?,
    })
}

fn resolution_type_str(t: ResolutionType) -> &'static str {
    match t {
        ResolutionType::Alias => "ALIAS",
        ResolutionType::NameMap => "NAME_MAP",
        ResolutionType::ManualNote => "MANUAL_NOTE",
    }
}

#[async_trait]
impl AdminMappingStore for PgAdminMappingStore {
    async fn create_or_update_event(&self, request: CreateMappingEventRequest) -> Result<Uuid, CoreError> {
        let detected_status_str = match request.detected_status {
            DetectedStatus::Unmapped => "UNMAPPED",
            DetectedStatus::Ambiguous => "AMBIGUOUS",
        };
        let candidate_codes_json = request.candidate_coverage_codes.as_ref().map(|c| serde_json::json!(c));
        let evidence_json = request.evidence_ref_ids.as_ref().map(|e| serde_json::json!(e));

        let mut tx = self.pool.begin().await.map_err(sql_err)?;

        let existing: Option<Uuid> = sqlx::query_scalar(
            "SELECT id FROM mapping_event_queue \
             WHERE insurer = $1 AND raw_coverage_title = $2 AND detected_status = $3 AND state = 'OPEN'",
        )
        .bind(request.insurer.as_str())
        .bind(&request.raw_coverage_title)
        .bind(detected_status_str)
        .fetch_optional(&mut *tx)
        .await
        .map_err(sql_err)?;

        let id = if let Some(id) = existing {
            sqlx::query(
                "UPDATE mapping_event_queue \
                 SET query_text = $1, normalized_query = $2, candidate_coverage_codes = $3, \
                     evidence_ref_ids = $4, updated_at = NOW() \
                 WHERE id = $5",
            )
            .bind(&request.query_text)
            .bind(&request.normalized_query)
            .bind(&candidate_codes_json)
            .bind(&evidence_json)
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(sql_err)?;
            id
        } else {
            sqlx::query_scalar(
                "INSERT INTO mapping_event_queue \
                 (insurer, query_text, normalized_query, raw_coverage_title, detected_status, \
                  candidate_coverage_codes, evidence_ref_ids) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7) \
                 RETURNING id",
            )
            .bind(request.insurer.as_str())
            .bind(&request.query_text)
            .bind(&request.normalized_query)
            .bind(&request.raw_coverage_title)
            .bind(detected_status_str)
            .bind(&candidate_codes_json)
            .bind(&evidence_json)
            .fetch_one(&mut *tx)
            .await
            .map_err(sql_err)?
        };

        tx.commit().await.map_err(sql_err)?;
        Ok(id)
    }

    async fn approve_event(&self, request: ApproveEventRequest) -> Result<ApprovalResult, CoreError> {
        let mut tx = self.pool.begin().await.map_err(sql_err)?;

        let row = sqlx::query("SELECT * FROM mapping_event_queue WHERE id = $1 AND state = 'OPEN' FOR UPDATE")
            .bind(request.event_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(sql_err)?
            .ok_or_else(|| CoreError::Validation(format!("event {} not found or not OPEN", request.event_id)))?;
        let event = row_to_event(row)?;
        assert_open(request.event_id, event.state)?;

        let canonical_exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM coverage_standard WHERE coverage_code = $1)")
                .bind(&request.coverage_code)
                .fetch_one(&mut *tx)
                .await
                .map_err(sql_err)?;
        if !canonical_exists {
            return Err(CoreError::DataInsufficient(format!(
                "coverage code '{}' does not exist in canonical source (신정원 통일코드)",
                request.coverage_code
            )));
        }

        let target_text = resolution_target_text(request.resolution_type, &event).to_string();
        match request.resolution_type {
            ResolutionType::Alias => {
                let existing: Option<String> = sqlx::query_scalar(
                    "SELECT coverage_code FROM coverage_code_alias WHERE insurer = $1 AND alias_text = $2",
                )
                .bind(event.insurer.as_str())
                .bind(&target_text)
                .fetch_optional(&mut *tx)
                .await
                .map_err(sql_err)?;
                if let Some(conflict) = detect_conflict(existing.as_deref(), &request.coverage_code) {
                    return Err(conflict_error(&conflict));
                }
            }
            ResolutionType::NameMap => {
                let existing: Option<String> = sqlx::query_scalar(
                    "SELECT coverage_code FROM coverage_name_map WHERE insurer = $1 AND raw_name = $2",
                )
                .bind(event.insurer.as_str())
                .bind(&target_text)
                .fetch_optional(&mut *tx)
                .await
                .map_err(sql_err)?;
                if let Some(conflict) = detect_conflict(existing.as_deref(), &request.coverage_code) {
                    return Err(conflict_error(&conflict));
                }
            }
            ResolutionType::ManualNote => {}
        }

        let (before, after) = approve_audit_snapshots(&event, &request.coverage_code, request.resolution_type);

        match request.resolution_type {
            ResolutionType::Alias => {
                sqlx::query(
                    "INSERT INTO coverage_code_alias (insurer, alias_text, coverage_code, created_by) \
                     VALUES ($1, $2, $3, $4) \
                     ON CONFLICT (insurer, alias_text) \
                     DO UPDATE SET coverage_code = EXCLUDED.coverage_code, created_by = EXCLUDED.created_by",
                )
                .bind(event.insurer.as_str())
                .bind(&target_text)
                .bind(&request.coverage_code)
                .bind(&request.actor)
                .execute(&mut *tx)
                .await
                .map_err(sql_err)?;
            }
            ResolutionType::NameMap => {
                sqlx::query(
                    "INSERT INTO coverage_name_map \
                     (insurer, raw_name, coverage_title_normalized, coverage_code, created_by) \
                     VALUES ($1, $2, $3, $4, $5) \
                     ON CONFLICT (insurer, raw_name) \
                     DO UPDATE SET coverage_title_normalized = EXCLUDED.coverage_title_normalized, \
                         coverage_code = EXCLUDED.coverage_code, created_by = EXCLUDED.created_by",
                )
                .bind(event.insurer.as_str())
                .bind(&target_text)
                .bind(&target_text)
                .bind(&request.coverage_code)
                .bind(&request.actor)
                .execute(&mut *tx)
                .await
                .map_err(sql_err)?;
            }
            ResolutionType::ManualNote => {}
        }

        sqlx::query(
            "UPDATE mapping_event_queue \
             SET state = 'APPROVED', resolved_coverage_code = $1, resolution_type = $2, \
                 resolution_note = $3, resolved_at = NOW(), resolved_by = $4 \
             WHERE id = $5",
        )
        .bind(&request.coverage_code)
        .bind(resolution_type_str(request.resolution_type))
        .bind(&request.note)
        .bind(&request.actor)
        .bind(request.event_id)
        .execute(&mut *tx)
        .await
        .map_err(sql_err)?;

        let audit_id: i64 = sqlx::query_scalar(
            "INSERT INTO admin_audit_log \
             (actor, action, target_type, target_id, before, after, evidence_ref_ids, note) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING id",
        )
        .bind(&request.actor)
        .bind("APPROVE")
        .bind("EVENT")
        .bind(request.event_id.to_string())
        .bind(&before)
        .bind(&after)
        .bind(event.evidence_ref_ids.as_ref().map(|e| serde_json::json!(e)))
        .bind(&request.note)
        .fetch_one(&mut *tx)
        .await
        .map_err(sql_err)?;

        tx.commit().await.map_err(sql_err)?;

        Ok(ApprovalResult {
            success: true,
            event_id: request.event_id,
            resolved_coverage_code: request.coverage_code.clone(),
            resolution_type: request.resolution_type,
            audit_log_id: audit_id,
            message: format!("Event approved and {} mapping created", resolution_type_str(request.resolution_type)),
        })
    }

    async fn reject_event(&self, request: RejectEventRequest) -> Result<i64, CoreError> {
        let mut tx = self.pool.begin().await.map_err(sql_err)?;

        let prior_state: String = sqlx::query_scalar("SELECT state FROM mapping_event_queue WHERE id = $1 FOR UPDATE")
            .bind(request.event_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(sql_err)?
            .ok_or_else(|| CoreError::Validation(format!("event {} not found", request.event_id)))?;

        let (before, after) = terminal_audit_snapshots(parse_state(&prior_state)?, EventState::Rejected);

        sqlx::query(
            "UPDATE mapping_event_queue SET state = 'REJECTED', resolution_note = $1, resolved_at = NOW(), resolved_by = $2 WHERE id = $3",
        )
        .bind(&request.note)
        .bind(&request.actor)
        .bind(request.event_id)
        .execute(&mut *tx)
        .await
        .map_err(sql_err)?;

        let audit_id: i64 = sqlx::query_scalar(
            "INSERT INTO admin_audit_log (actor, action, target_type, target_id, before, after, note) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING id",
        )
        .bind(&request.actor)
        .bind("REJECT")
        .bind("EVENT")
        .bind(request.event_id.to_string())
        .bind(&before)
        .bind(&after)
        .bind(&request.note)
        .fetch_one(&mut *tx)
        .await
        .map_err(sql_err)?;

        tx.commit().await.map_err(sql_err)?;
        Ok(audit_id)
    }

    async fn snooze_event(&self, request: SnoozeEventRequest) -> Result<i64, CoreError> {
        let mut tx = self.pool.begin().await.map_err(sql_err)?;

        let prior_state: String = sqlx::query_scalar("SELECT state FROM mapping_event_queue WHERE id = $1 FOR UPDATE")
            .bind(request.event_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(sql_err)?
            .ok_or_else(|| CoreError::Validation(format!("event {} not found", request.event_id)))?;

        let (before, after) = terminal_audit_snapshots(parse_state(&prior_state)?, EventState::Snoozed);

        sqlx::query(
            "UPDATE mapping_event_queue SET state = 'SNOOZED', resolution_note = $1, resolved_at = NOW(), resolved_by = $2 WHERE id = $3",
        )
        .bind(&request.note)
        .bind(&request.actor)
        .bind(request.event_id)
        .execute(&mut *tx)
        .await
        .map_err(sql_err)?;

        let audit_id: i64 = sqlx::query_scalar(
            "INSERT INTO admin_audit_log (actor, action, target_type, target_id, before, after, note) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING id",
        )
        .bind(&request.actor)
        .bind("SNOOZE")
        .bind("EVENT")
        .bind(request.event_id.to_string())
        .bind(&before)
        .bind(&after)
        .bind(&request.note)
        .fetch_one(&mut *tx)
        .await
        .map_err(sql_err)?;

        tx.commit().await.map_err(sql_err)?;
        Ok(audit_id)
    }

    async fn get_queue(
        &self,
        state: Option<EventState>,
        insurer: Option<InsurerCode>,
        page: u32,
        page_size: u32,
    ) -> Result<(Vec<MappingEventSummary>, i64), CoreError> {
        let offset = (page.max(1) - 1) * page_size;

        let mut count_builder: QueryBuilder<sqlx::Postgres> =
            QueryBuilder::new("SELECT COUNT(*) FROM mapping_event_queue WHERE 1 = 1");
        if let Some(s) = state {
            count_builder.push(" AND state = ");
            count_builder.push_bind(event_state_str(s));
        }
        if let Some(i) = insurer {
            count_builder.push(" AND insurer = ");
            count_builder.push_bind(i.as_str());
        }
        let total: i64 = count_builder.build_query_scalar().fetch_one(&self.pool).await.map_err(sql_err)?;

        let mut builder: QueryBuilder<sqlx::Postgres> = QueryBuilder::new(
            "SELECT id, created_at, updated_at, insurer, raw_coverage_title, detected_status, state, \
             COALESCE(jsonb_array_length(candidate_coverage_codes), 0) AS candidate_count \
             FROM mapping_event_queue WHERE 1 = 1",
        );
        if let Some(s) = state {
            builder.push(" AND state = ");
            builder.push_bind(event_state_str(s));
        }
        if let Some(i) = insurer {
            builder.push(" AND insurer = ");
            builder.push_bind(i.as_str());
        }
        builder.push(" ORDER BY created_at DESC LIMIT ");
        builder.push_bind(page_size as i64);
        builder.push(" OFFSET ");
        builder.push_bind(offset as i64);

        let rows = builder.build().fetch_all(&self.pool).await.map_err(sql_err)?;
        let summaries = rows
            .into_iter()
            .map(|row| {
                let insurer_raw: String = row.try_get("insurer").map_err(sql_err)?;
                let detected_status_raw: String = row.try_get("detected_status").map_err(sql_err)?;
                let state_raw: String = row.try_get("state").map_err(sql_err)?;
                Ok(MappingEventSummary {
                    id: row.try_get("id").map_err(sql_err)?,
                    created_at: row.try_get("created_at").map_err(sql_err)?,
                    updated_at: row.try_get("updated_at").map_err(sql_err)?,
                    insurer: insurer_raw.parse().map_err(|_| CoreError::Validation(format!("unknown insurer code: {insurer_raw}")))?,
                    raw_coverage_title: row.try_get("raw_coverage_title").map_err(sql_err)?,
                    detected_status: match detected_status_raw.as_str() {
                        "UNMAPPED" => DetectedStatus::Unmapped,
                        "AMBIGUOUS" => DetectedStatus::Ambiguous,
                        other => return Err(CoreError::Validation(format!("unknown detected_status: {other}"))),
                    },
                    state: parse_state(&state_raw)?,
                    candidate_count: row.try_get("candidate_count").map_err(sql_err)?,
                })
            })
            .collect::<Result<Vec<_>, CoreError>>()?;

        Ok((summaries, total))
    }

    async fn get_event_detail(&self, event_id: Uuid) -> Result<Option<MappingEvent>, CoreError> {
        let row = sqlx::query("SELECT * FROM mapping_event_queue WHERE id = $1")
            .bind(event_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(sql_err)?;
        row.map(row_to_event).transpose()
    }

    async fn get_audit_logs(
        &self,
        target_type: Option<TargetType>,
        target_id: Option<String>,
        limit: u32,
    ) -> Result<Vec<AuditLogEntry>, CoreError> {
        let mut builder: QueryBuilder<sqlx::Postgres> = QueryBuilder::new(
            "SELECT id, created_at, actor, action, target_type, target_id, before, after, evidence_ref_ids, note \
             FROM admin_audit_log WHERE 1 = 1",
        );
        if let Some(t) = target_type {
            builder.push(" AND target_type = ");
            builder.push_bind(target_type_str(t));
        }
        if let Some(id) = &target_id {
            builder.push(" AND target_id = ");
            builder.push_bind(id.clone());
        }
        builder.push(" ORDER BY created_at DESC LIMIT ");
        builder.push_bind(limit as i64);

        let rows = builder.build().fetch_all(&self.pool).await.map_err(sql_err)?;
        rows.into_iter()
            .map(|row| {
                let action_raw: String = row.try_get("action").map_err(sql_err)?;
                let target_type_raw: String = row.try_get("target_type").map_err(sql_err)?;
                let evidence_json: Option<serde_json::Value> = row.try_get("evidence_ref_ids").map_err(sql_err)?;
                Ok(AuditLogEntry {
                    id: row.try_get("id").map_err(sql_err)?,
                    created_at: row.try_get("created_at").map_err(sql_err)?,
                    actor: row.try_get("actor").map_err(sql_err)?,
                    action: match action_raw.as_str() {
                        "APPROVE" => AuditAction::Approve,
                        "REJECT" => AuditAction::Reject,
                        "SNOOZE" => AuditAction::Snooze,
                        "UPSERT_ALIAS" => AuditAction::UpsertAlias,
                        "UPSERT_NAME_MAP" => AuditAction::UpsertNameMap,
                        other => return Err(CoreError::Validation(format!("unknown audit action: {other}"))),
                    },
                    target_type: match target_type_raw.as_str() {
                        "EVENT" => TargetType::Event,
                        "ALIAS" => TargetType::Alias,
                        "NAME_MAP" => TargetType::NameMap,
                        other => return Err(CoreError::Validation(format!("unknown target_type: {other}"))),
                    },
                    target_id: row.try_get("target_id").map_err(sql_err)?,
                    before: row.try_get("before").map_err(sql_err)?,
                    after: row.try_get("after").map_err(sql_err)?,
                    evidence_ref_ids: evidence_json.map(|v| serde_json::from_value(v)).transpose().map_err(|e| CoreError::Internal(e.into()))?,
                    note: row.try_get("note").map_err(sql_err)?,
                })
            })
            .collect()
    }
}

fn event_state_str(s: EventState) -> &'static str {
    match s {
        EventState::Open => "OPEN",
        EventState::Approved => "APPROVED",
        EventState::Rejected => "REJECTED",
        EventState::Snoozed => "SNOOZED",
    }
}

fn target_type_str(t: TargetType) -> &'static str {
    match t {
        TargetType::Event => "EVENT",
        TargetType::Alias => "ALIAS",
        TargetType::NameMap => "NAME_MAP",
    }
}

fn parse_state(raw: &str) -> Result<EventState, CoreError> {
    match raw {
        "OPEN" => Ok(EventState::Open),
        "APPROVED" => Ok(EventState::Approved),
        "REJECTED" => Ok(EventState::Rejected),
        "SNOOZED" => Ok(EventState::Snoozed),
        other => Err(CoreError::Validation(format!("unknown event state: {other}"))),
    }
}
