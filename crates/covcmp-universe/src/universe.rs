//! Universe Lock read side (spec §4.7): `get_proposal_coverage` is the
//! Compare Orchestrator's sole admission gate. Modeled as one joined
//! query returning one `FullCoverage` record — never three separate
//! 1-to-1 fetches across `proposal_coverage_universe` /
//! `proposal_coverage_mapped` / `proposal_coverage_slots` (the
//! "ORM-style row fetching" redesign flag).

use crate::types::{
    CoverageMapping, CoverageSlots, DiseaseScopeNorm, FullCoverage, MappingEvidence, MappingStatus, PayoutLimit,
    PayoutLimitKind, ProposalCoverage, SlotEvidence, SourceConfidence,
};
use async_trait::async_trait;
use covcmp_foundation::error::CoreError;
use covcmp_registry::{CanonicalCoverageCode, InsurerCode};
use sqlx::{postgres::PgRow, PgPool, QueryBuilder, Row};
use std::collections::HashSet;

/// Read-only access to the Universe Lock. Implementations never write —
/// `proposal_coverage_universe`/`_mapped`/`_slots` are owned exclusively
/// by ingestion.
#[async_trait]
pub trait UniverseReader: Send + Sync {
    async fn get_proposal_coverage(
        &self,
        insurer: InsurerCode,
        canonical_code: Option<&CanonicalCoverageCode>,
        raw_name: Option<&str>,
    ) -> Result<Option<FullCoverage>, CoreError>;
}

pub struct PgUniverseStore {
    pool: PgPool,
}

impl PgUniverseStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UniverseReader for PgUniverseStore {
    async fn get_proposal_coverage(
        &self,
        insurer: InsurerCode,
        canonical_code: Option<&CanonicalCoverageCode>,
        raw_name: Option<&str>,
    ) -> Result<Option<FullCoverage>, CoreError> {
        let mut builder: QueryBuilder<sqlx::Postgres> = QueryBuilder::new(
            "SELECT u.proposal_id, u.insurer_coverage_name, u.normalized_name, u.currency, \
             u.amount_value, u.payout_amount_unit, u.source_page, u.span_text, u.content_hash, \
             m.mapping_status, m.canonical_coverage_code, m.mapping_evidence, \
             s.event_type, s.disease_scope_raw, s.disease_scope_norm, s.waiting_period_days, \
             s.reduction_periods, s.payout_limit, s.treatment_method, s.hospitalization_exclusions, \
             s.renewal_flag, s.renewal_period_years, s.source_confidence, s.qualification_suffix, s.evidence \
             FROM proposal_coverage_universe u \
             LEFT JOIN proposal_coverage_mapped m ON m.universe_id = u.id \
             LEFT JOIN proposal_coverage_slots s ON s.mapped_id = m.id \
             WHERE u.insurer = ",
        );
        builder.push_bind(insurer.as_str());

        if let Some(code) = canonical_code {
            builder.push(" AND m.canonical_coverage_code = ");
            builder.push_bind(code.code().to_string());
        }
        if let Some(name) = raw_name {
            builder.push(" AND u.insurer_coverage_name = ");
            builder.push_bind(name.to_string());
        }
        builder.push(" ORDER BY u.source_page ASC LIMIT 1");

        let mut tx = self.pool.begin().await.map_err(sql_err)?;
        sqlx::query("SET TRANSACTION READ ONLY").execute(&mut *tx).await.map_err(sql_err)?;

        let row = builder.build().fetch_optional(&mut *tx).await.map_err(sql_err)?;
        tx.rollback().await.map_err(sql_err)?;

        row.map(|row| row_to_full_coverage(insurer, row)).transpose()
    }
}

fn row_to_full_coverage(insurer: InsurerCode, row: PgRow) -> Result<FullCoverage, CoreError> {
    let coverage = ProposalCoverage {
        insurer,
        proposal_id: row.try_get("proposal_id").map_err(sql_err)?,
        raw_coverage_name: row.try_get("insurer_coverage_name").map_err(sql_err)?,
        normalized_name: row.try_get("normalized_name").map_err(sql_err)?,
        currency: row.try_get("currency").map_err(sql_err)?,
        amount_value: row.try_get("amount_value").map_err(sql_err)?,
        payout_amount_unit: row.try_get("payout_amount_unit").map_err(sql_err)?,
        source_page: row.try_get::<i32, _>("source_page").map_err(sql_err)? as u32,
        span_text: row.try_get("span_text").map_err(sql_err)?,
        content_hash: row.try_get("content_hash").map_err(sql_err)?,
    };

    let mapping_status: Option<String> = row.try_get("mapping_status").map_err(sql_err)?;
    let mapping = match mapping_status.as_deref() {
        Some("MAPPED") => CoverageMapping {
            mapping_status: MappingStatus::Mapped,
            canonical_coverage_code: row
                .try_get::<Option<String>, _>("canonical_coverage_code")
                .map_err(sql_err)?
                .map(CanonicalCoverageCode::Other),
            mapping_evidence: mapping_evidence_from_row(&row)?,
        },
        Some("AMBIGUOUS") => CoverageMapping {
            mapping_status: MappingStatus::Ambiguous,
            canonical_coverage_code: None,
            mapping_evidence: mapping_evidence_from_row(&row)?,
        },
        _ => CoverageMapping {
            mapping_status: MappingStatus::Unmapped,
            canonical_coverage_code: None,
            mapping_evidence: mapping_evidence_from_row(&row)?,
        },
    };

    let slots = if mapping.mapping_status == MappingStatus::Mapped {
        Some(slots_from_row(&row)?)
    } else {
        None
    };

    Ok(FullCoverage { coverage, mapping, slots })
}

fn mapping_evidence_from_row(row: &PgRow) -> Result<MappingEvidence, CoreError> {
    let raw: Option<serde_json::Value> = row.try_get("mapping_evidence").map_err(sql_err)?;
    let raw = raw.unwrap_or(serde_json::Value::Null);
    Ok(MappingEvidence {
        lookup_key: raw.get("lookup_key").and_then(|v| v.as_str()).unwrap_or_default().to_string(),
        matched_alias: raw.get("matched_alias").and_then(|v| v.as_str()).map(str::to_string),
        source_file: raw.get("source_file").and_then(|v| v.as_str()).map(str::to_string),
        match_type: raw.get("match_type").and_then(|v| v.as_str()).unwrap_or("unknown").to_string(),
    })
}

fn slots_from_row(row: &PgRow) -> Result<CoverageSlots, CoreError> {
    let source_confidence: Option<String> = row.try_get("source_confidence").map_err(sql_err)?;
    let source_confidence = match source_confidence.as_deref() {
        Some("proposal_confirmed") => SourceConfidence::ProposalConfirmed,
        Some("policy_required") => SourceConfidence::PolicyRequired,
        _ => SourceConfidence::Unknown,
    };

    let disease_scope_norm: Option<serde_json::Value> = row.try_get("disease_scope_norm").map_err(sql_err)?;
    let disease_scope_norm = disease_scope_norm.and_then(|v| {
        Some(DiseaseScopeNorm {
            include_group_id: v.get("include_group_id")?.as_str()?.to_string(),
            exclude_group_id: v.get("exclude_group_id").and_then(|e| e.as_str()).map(str::to_string),
        })
    });

    let payout_limit: Option<serde_json::Value> = row.try_get("payout_limit").map_err(sql_err)?;
    let payout_limit = payout_limit.and_then(|v| {
        let kind = match v.get("type")?.as_str()? {
            "once" => PayoutLimitKind::Once,
            "multiple" => PayoutLimitKind::Multiple,
            "unlimited" => PayoutLimitKind::Unlimited,
            _ => return None,
        };
        Some(PayoutLimit {
            kind,
            count: v.get("count").and_then(|c| c.as_u64()).map(|c| c as u32),
            period: v.get("period").and_then(|p| p.as_str()).map(str::to_string),
        })
    });

    let treatment_method: Vec<String> = row
        .try_get::<Option<Vec<String>>, _>("treatment_method")
        .map_err(sql_err)?
        .unwrap_or_default();

    let reduction_periods: Option<serde_json::Value> = row.try_get("reduction_periods").map_err(sql_err)?;
    let reduction_periods = reduction_periods
        .and_then(|v| v.as_array().map(|arr| arr.iter().filter_map(|e| e.as_str().map(str::to_string)).collect()))
        .unwrap_or_default();

    let evidence: Option<serde_json::Value> = row.try_get("evidence").map_err(sql_err)?;
    let evidence = evidence.unwrap_or(serde_json::Value::Null);

    Ok(CoverageSlots {
        event_type: row.try_get("event_type").map_err(sql_err)?,
        disease_scope_raw: row.try_get("disease_scope_raw").map_err(sql_err)?,
        disease_scope_norm,
        waiting_period_days: row
            .try_get::<Option<i32>, _>("waiting_period_days")
            .map_err(sql_err)?
            .map(|v| v as u32),
        reduction_periods,
        payout_limit,
        treatment_method: treatment_method.into_iter().collect::<HashSet<_>>(),
        hospitalization_exclusions: row.try_get("hospitalization_exclusions").map_err(sql_err)?,
        renewal_flag: row.try_get::<Option<bool>, _>("renewal_flag").map_err(sql_err)?.unwrap_or(false),
        renewal_period_years: row
            .try_get::<Option<i32>, _>("renewal_period_years")
            .map_err(sql_err)?
            .map(|v| v as u32),
        source_confidence,
        qualification_suffix: row.try_get("qualification_suffix").map_err(sql_err)?,
        evidence: SlotEvidence {
            doc_id: evidence.get("doc_id").and_then(|v| v.as_str()).map(str::to_string),
            page: evidence.get("page").and_then(|v| v.as_u64()).map(|v| v as u32),
            span_text: evidence.get("span_text").and_then(|v| v.as_str()).map(str::to_string),
        },
    })
}

fn sql_err(e: sqlx::Error) -> CoreError {
    CoreError::Internal(e.into())
}

/// Deterministic in-memory reader for tests: no SQL, just whatever
/// `FullCoverage` rows the test seeded.
#[cfg(test)]
pub struct InMemoryUniverseStore {
    rows: Vec<FullCoverage>,
}

#[cfg(test)]
impl InMemoryUniverseStore {
    pub fn new(rows: Vec<FullCoverage>) -> Self {
        Self { rows }
    }
}

#[cfg(test)]
#[async_trait]
impl UniverseReader for InMemoryUniverseStore {
    async fn get_proposal_coverage(
        &self,
        insurer: InsurerCode,
        canonical_code: Option<&CanonicalCoverageCode>,
        raw_name: Option<&str>,
    ) -> Result<Option<FullCoverage>, CoreError> {
        Ok(self
            .rows
            .iter()
            .find(|row| {
                row.coverage.insurer == insurer
                    && canonical_code.map_or(true, |c| row.mapping.canonical_coverage_code.as_ref() == Some(c))
                    && raw_name.map_or(true, |n| row.coverage.raw_coverage_name == n)
            })
            .cloned())
    }
}
