//! Policy Evidence Store (spec §4.8): deterministic keyword-gated
//! retrieval of policy spans from `v2.coverage_evidence`. AH-4 forbids
//! vector/embedding recall here — every filter is a literal keyword
//! match, and ordering (keyword-hit count desc, page asc) is fixed so the
//! same query against the same data always returns the same spans in the
//! same order.

use async_trait::async_trait;
use covcmp_cancer::{CancerEvidenceSource, RawEvidenceSpan, CANCER_EVIDENCE_KEYWORDS};
use covcmp_foundation::error::CoreError;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, QueryBuilder};
use tracing::debug;

const COMPARE_INTEGRATION_LIMIT: i64 = 50;

/// One retrieved policy span, keyword-hit count included for audit.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct PolicyEvidenceSpan {
    pub doc_id: String,
    pub page: i32,
    pub text: String,
    pub section: Option<String>,
    pub keyword_hits: i32,
}

/// Async retrieval module over `v2.coverage_evidence`, `doc_type = 'policy'`.
#[derive(Debug, Clone)]
pub struct PolicyEvidenceStore {
    pool: PgPool,
}

impl PolicyEvidenceStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Retrieve cancer-relevant policy spans for an insurer, optionally
    /// narrowed to a coverage id or a name keyword. Rows with zero keyword
    /// hits are never returned — the keyword gate is not advisory.
    pub async fn get_policy_spans_for_cancer(
        &self,
        insurer_code: &str,
        coverage_id: Option<&str>,
        coverage_name_key: Option<&str>,
        limit: i64,
    ) -> Result<Vec<PolicyEvidenceSpan>, CoreError> {
        let mut builder: QueryBuilder<sqlx::Postgres> = QueryBuilder::new(
            "WITH keyword_scored AS (SELECT document_id, page, span_text, section, (",
        );

        for (i, kw) in CANCER_EVIDENCE_KEYWORDS.iter().enumerate() {
            if i > 0 {
                builder.push(" + ");
            }
            builder.push("CASE WHEN span_text ILIKE ");
            builder.push_bind(format!("%{kw}%"));
            builder.push(" THEN 1 ELSE 0 END");
        }

        builder.push(") AS keyword_hits FROM v2.coverage_evidence WHERE doc_type = 'policy' AND insurer_code = ");
        builder.push_bind(insurer_code.to_string());
        builder.push(" AND (");
        for (i, kw) in CANCER_EVIDENCE_KEYWORDS.iter().enumerate() {
            if i > 0 {
                builder.push(" OR ");
            }
            builder.push("span_text ILIKE ");
            builder.push_bind(format!("%{kw}%"));
        }
        builder.push(")");

        if let Some(coverage_id) = coverage_id {
            builder.push(" AND coverage_id = ");
            builder.push_bind(coverage_id.to_string());
        }
        if let Some(name_key) = coverage_name_key {
            builder.push(" AND span_text ILIKE ");
            builder.push_bind(format!("%{name_key}%"));
        }

        builder.push(
            ") SELECT document_id AS doc_id, page, span_text AS text, section, keyword_hits \
               FROM keyword_scored WHERE keyword_hits > 0 \
               ORDER BY keyword_hits DESC, page ASC LIMIT ",
        );
        builder.push_bind(limit);

        let rows = builder
            .build_query_as::<PolicyEvidenceSpan>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| CoreError::Internal(e.into()))?;

        debug!(insurer_code, spans = rows.len(), "policy evidence retrieved");
        Ok(rows)
    }

    /// All cancer-related policy spans for an insurer, unfiltered by
    /// coverage id or name keyword.
    pub async fn get_all_policy_spans_for_insurer(
        &self,
        insurer_code: &str,
        limit: i64,
    ) -> Result<Vec<PolicyEvidenceSpan>, CoreError> {
        self.get_policy_spans_for_cancer(insurer_code, None, None, limit).await
    }
}

/// Factory mirroring the module-level constructor of the Python original.
pub async fn create_policy_evidence_store(pool: PgPool) -> PolicyEvidenceStore {
    PolicyEvidenceStore::new(pool)
}

/// Wires the store into the cancer compare integration's collaborator
/// boundary (spec §4.6): `resolve_cancer_canonical` asks for spans through
/// this trait rather than depending on `sqlx` directly.
#[async_trait]
impl CancerEvidenceSource for PolicyEvidenceStore {
    async fn fetch_cancer_evidence(&self, insurer_code: &str) -> Result<Vec<RawEvidenceSpan>, CoreError> {
        let spans = self
            .get_all_policy_spans_for_insurer(insurer_code, COMPARE_INTEGRATION_LIMIT)
            .await?;
        Ok(spans
            .into_iter()
            .map(|s| RawEvidenceSpan { doc_id: s.doc_id, page: s.page, span_text: s.text })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancer_keyword_list_is_shared_with_compare_integration() {
        assert!(CANCER_EVIDENCE_KEYWORDS.contains(&"유사암"));
        assert!(CANCER_EVIDENCE_KEYWORDS.contains(&"C73"));
    }
}
