//! Write-side validation for the Policy Scope Group Engine (spec §4.12).
//! Every insert here is gated on evidence and on the "insurer=NULL is
//! medical classification only" constitutional rule; the actual SQL
//! lives behind [`ScopeGroupWriter`] so these checks run the same way
//! whether the writer is Postgres or an in-memory test double.

use crate::types::{CoverageDiseaseScope, DiseaseCodeGroup, GroupMember};
use async_trait::async_trait;
use covcmp_foundation::error::CoreError;

/// Insurer-specific insurance concepts (as opposed to medical/KCD-7
/// classification) that must never be stored under `insurer = NULL`.
const INSURANCE_CONCEPT_LABELS: &[&str] = &["유사암", "소액암"];

fn is_insurance_concept_label(label: &str) -> bool {
    INSURANCE_CONCEPT_LABELS.iter().any(|concept| label.contains(concept))
}

/// Collaborator boundary for the actual row writes. Implemented by
/// `PgScopeGroupStore` in production; this crate validates, the
/// implementation persists.
#[async_trait]
pub trait ScopeGroupWriter: Send + Sync {
    async fn insert_group(&self, group: &DiseaseCodeGroup) -> Result<(), CoreError>;
    async fn insert_group_member(&self, group_id: &str, member: &GroupMember) -> Result<(), CoreError>;
    async fn insert_coverage_disease_scope(&self, scope: &CoverageDiseaseScope) -> Result<i64, CoreError>;
    async fn update_slots_disease_scope_norm(
        &self,
        mapped_id: i64,
        include_group_id: &str,
        exclude_group_id: Option<&str>,
    ) -> Result<(), CoreError>;
}

/// Create a `disease_code_group` row. `insurer = None` is rejected for
/// any label naming an insurance concept (유사암, 소액암, ...) — those
/// groups vary by insurer and must say so.
pub async fn create_disease_code_group(writer: &dyn ScopeGroupWriter, group: DiseaseCodeGroup) -> Result<(), CoreError> {
    if group.insurer.is_none() && is_insurance_concept_label(&group.group_label) {
        return Err(CoreError::PolicyViolation(format!(
            "insurer=NULL not allowed for insurance concept group '{}'",
            group.group_label
        )));
    }
    if group.basis_span.trim().is_empty() {
        return Err(CoreError::Validation("evidence required: basis_span cannot be empty".to_string()));
    }
    writer.insert_group(&group).await
}

/// Add a member to a group: a single KCD-7 code or a `[from, to]`
/// range. FK validation against `disease_code_master` happens at the
/// database layer; this only enforces the code-xor-range shape, which
/// [`GroupMember`]'s type already guarantees by construction.
pub async fn add_disease_code_group_member(
    writer: &dyn ScopeGroupWriter,
    group_id: &str,
    member: GroupMember,
) -> Result<(), CoreError> {
    writer.insert_group_member(group_id, &member).await
}

/// Link a canonical coverage to the group(s) that define its disease
/// scope, with evidence. `include_group_id` is mandatory; exclusion is
/// optional.
pub async fn create_coverage_disease_scope(
    writer: &dyn ScopeGroupWriter,
    scope: CoverageDiseaseScope,
) -> Result<i64, CoreError> {
    if scope.span_text.trim().is_empty() {
        return Err(CoreError::Validation("evidence required: span_text cannot be empty".to_string()));
    }
    writer.insert_coverage_disease_scope(&scope).await
}

/// Materialize the resolved group references onto
/// `proposal_coverage_slots.disease_scope_norm` so the Compare
/// Orchestrator can read it without re-deriving anything.
pub async fn update_proposal_slots_disease_scope_norm(
    writer: &dyn ScopeGroupWriter,
    mapped_id: i64,
    include_group_id: &str,
    exclude_group_id: Option<&str>,
) -> Result<(), CoreError> {
    writer.update_slots_disease_scope_norm(mapped_id, include_group_id, exclude_group_id).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingWriter {
        groups: Mutex<Vec<DiseaseCodeGroup>>,
    }

    #[async_trait]
    impl ScopeGroupWriter for RecordingWriter {
        async fn insert_group(&self, group: &DiseaseCodeGroup) -> Result<(), CoreError> {
            self.groups.lock().unwrap().push(group.clone());
            Ok(())
        }
        async fn insert_group_member(&self, _group_id: &str, _member: &GroupMember) -> Result<(), CoreError> {
            Ok(())
        }
        async fn insert_coverage_disease_scope(&self, _scope: &CoverageDiseaseScope) -> Result<i64, CoreError> {
            Ok(1)
        }
        async fn update_slots_disease_scope_norm(
            &self,
            _mapped_id: i64,
            _include_group_id: &str,
            _exclude_group_id: Option<&str>,
        ) -> Result<(), CoreError> {
            Ok(())
        }
    }

    fn group(label: &str, insurer: Option<covcmp_registry::InsurerCode>) -> DiseaseCodeGroup {
        DiseaseCodeGroup {
            group_id: "G1".into(),
            group_label: label.into(),
            insurer,
            version_tag: "V1".into(),
            basis_doc_id: "D1".into(),
            basis_page: 12,
            basis_span: "유사암이란...".into(),
        }
    }

    #[tokio::test]
    async fn insurance_concept_with_null_insurer_is_rejected() {
        let writer = RecordingWriter::default();
        let result = create_disease_code_group(&writer, group("유사암 (공통)", None)).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn insurance_concept_with_insurer_is_accepted() {
        let writer = RecordingWriter::default();
        let result = create_disease_code_group(&writer, group("유사암 (삼성)", Some(covcmp_registry::InsurerCode::Samsung))).await;
        assert!(result.is_ok());
        assert_eq!(writer.groups.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn medical_classification_with_null_insurer_is_accepted() {
        let writer = RecordingWriter::default();
        let result = create_disease_code_group(&writer, group("상피내암 (C00-C97)", None)).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn empty_basis_span_is_rejected() {
        let writer = RecordingWriter::default();
        let mut g = group("상피내암 (C00-C97)", None);
        g.basis_span = "".into();
        assert!(create_disease_code_group(&writer, g).await.is_err());
    }
}
