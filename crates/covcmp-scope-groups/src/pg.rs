//! Postgres implementations of the write (`ScopeGroupWriter`) and read
//! (`GroupMemberSource`) boundaries, run inside a single transaction per
//! call so a half-written group/member/scope row is never observable.

use crate::groups::{GroupMemberRow, GroupMemberSource};
use crate::pipeline::ScopeGroupWriter;
use crate::types::{CoverageDiseaseScope, DiseaseCodeGroup, GroupMember};
use async_trait::async_trait;
use covcmp_foundation::error::CoreError;
use sqlx::{PgPool, Row};

pub struct PgScopeGroupStore {
    pool: PgPool,
}

impl PgScopeGroupStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn sql_err(e: sqlx::Error) -> CoreError {
    CoreError::Internal(e.into())
}

#[async_trait]
impl ScopeGroupWriter for PgScopeGroupStore {
    async fn insert_group(&self, group: &DiseaseCodeGroup) -> Result<(), CoreError> {
        sqlx::query(
            "INSERT INTO disease_code_group \
             (group_id, group_label, insurer, version_tag, basis_doc_id, basis_page, basis_span) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             ON CONFLICT (group_id) DO NOTHING",
        )
        .bind(&group.group_id)
        .bind(&group.group_label)
        .bind(group.insurer.map(|i| i.as_str()))
        .bind(&group.version_tag)
        .bind(&group.basis_doc_id)
        .bind(group.basis_page as i32)
        .bind(&group.basis_span)
        .execute(&self.pool)
        .await
        .map_err(sql_err)?;
        Ok(())
    }

    async fn insert_group_member(&self, group_id: &str, member: &GroupMember) -> Result<(), CoreError> {
        match member {
            GroupMember::Code(code) => {
                sqlx::query(
                    "INSERT INTO disease_code_group_member (group_id, member_type, code) \
                     VALUES ($1, 'CODE', $2)",
                )
                .bind(group_id)
                .bind(code)
                .execute(&self.pool)
                .await
                .map_err(sql_err)?;
            }
            GroupMember::Range { from, to } => {
                sqlx::query(
                    "INSERT INTO disease_code_group_member (group_id, member_type, code_from, code_to) \
                     VALUES ($1, 'RANGE', $2, $3)",
                )
                .bind(group_id)
                .bind(from)
                .bind(to)
                .execute(&self.pool)
                .await
                .map_err(sql_err)?;
            }
        }
        Ok(())
    }

    async fn insert_coverage_disease_scope(&self, scope: &CoverageDiseaseScope) -> Result<i64, CoreError> {
        let row = sqlx::query(
            "INSERT INTO coverage_disease_scope \
             (canonical_coverage_code, insurer, proposal_id, include_group_id, exclude_group_id, \
              source_doc_id, source_page, span_text, extraction_rule_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             RETURNING id",
        )
        .bind(&scope.canonical_coverage_code)
        .bind(scope.insurer.as_str())
        .bind(&scope.proposal_id)
        .bind(&scope.include_group_id)
        .bind(&scope.exclude_group_id)
        .bind(&scope.source_doc_id)
        .bind(scope.source_page as i32)
        .bind(&scope.span_text)
        .bind(&scope.extraction_rule_id)
        .fetch_one(&self.pool)
        .await
        .map_err(sql_err)?;
        row.try_get::<i64, _>("id").map_err(sql_err)
    }

    async fn update_slots_disease_scope_norm(
        &self,
        mapped_id: i64,
        include_group_id: &str,
        exclude_group_id: Option<&str>,
    ) -> Result<(), CoreError> {
        let disease_scope_norm = serde_json::json!({
            "include_group_id": include_group_id,
            "exclude_group_id": exclude_group_id,
        });
        sqlx::query("UPDATE proposal_coverage_slots SET disease_scope_norm = $1 WHERE mapped_id = $2")
            .bind(disease_scope_norm)
            .bind(mapped_id)
            .execute(&self.pool)
            .await
            .map_err(sql_err)?;
        Ok(())
    }
}

pub struct PgGroupMemberSource {
    pool: PgPool,
}

impl PgGroupMemberSource {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl GroupMemberSource for PgGroupMemberSource {
    async fn fetch_members(&self, group_id: &str) -> Result<Vec<GroupMemberRow>, CoreError> {
        let rows = sqlx::query("SELECT code, code_from, code_to FROM disease_code_group_member WHERE group_id = $1")
            .bind(group_id)
            .fetch_all(&self.pool)
            .await
            .map_err(sql_err)?;

        rows.into_iter()
            .map(|row| {
                let code: Option<String> = row.try_get("code").map_err(sql_err)?;
                let code_from: Option<String> = row.try_get("code_from").map_err(sql_err)?;
                let code_to: Option<String> = row.try_get("code_to").map_err(sql_err)?;
                match (code, code_from, code_to) {
                    (Some(code), _, _) => Ok(GroupMemberRow::Code(code)),
                    (None, Some(from), Some(to)) => Ok(GroupMemberRow::Range { from, to }),
                    _ => Err(CoreError::DataInsufficient(format!(
                        "disease_code_group_member row for '{group_id}' has neither code nor range"
                    ))),
                }
            })
            .collect()
    }
}
