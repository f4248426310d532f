//! Read-side of the Policy Scope Group Engine: resolve a group_id to the
//! KCD-7 codes it names, for feeding `crate::pipeline`-written groups
//! into `covcmp-compare`'s overlap detection.

use async_trait::async_trait;
use covcmp_foundation::error::CoreError;
use std::collections::HashSet;

/// One row of `disease_code_group_member`.
#[derive(Debug, Clone, PartialEq)]
pub enum GroupMemberRow {
    Code(String),
    Range { from: String, to: String },
}

/// Collaborator boundary for reading group membership rows.
#[async_trait]
pub trait GroupMemberSource: Send + Sync {
    async fn fetch_members(&self, group_id: &str) -> Result<Vec<GroupMemberRow>, CoreError>;
}

/// Resolve a group's members into a flat code set.
///
/// A range member resolves to its two endpoints only, not the expanded
/// KCD-7 code span between them — the underlying pipeline stores ranges
/// the same way (see `DESIGN.md`), deferring full range expansion.
pub async fn load_group_codes(source: &dyn GroupMemberSource, group_id: &str) -> Result<HashSet<String>, CoreError> {
    let rows = source.fetch_members(group_id).await?;
    let mut codes = HashSet::new();
    for row in rows {
        match row {
            GroupMemberRow::Code(code) => {
                codes.insert(code);
            }
            GroupMemberRow::Range { from, to } => {
                codes.insert(from);
                codes.insert(to);
            }
        }
    }
    Ok(codes)
}

#[cfg(test)]
pub struct InMemoryGroupMemberSource {
    rows: std::collections::HashMap<String, Vec<GroupMemberRow>>,
}

#[cfg(test)]
impl InMemoryGroupMemberSource {
    pub fn new(rows: std::collections::HashMap<String, Vec<GroupMemberRow>>) -> Self {
        Self { rows }
    }
}

#[cfg(test)]
#[async_trait]
impl GroupMemberSource for InMemoryGroupMemberSource {
    async fn fetch_members(&self, group_id: &str) -> Result<Vec<GroupMemberRow>, CoreError> {
        Ok(self.rows.get(group_id).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn single_codes_resolve_directly() {
        let mut rows = std::collections::HashMap::new();
        rows.insert("SIMILAR_CANCER_SAMSUNG_V1".to_string(), vec![GroupMemberRow::Code("C73".into())]);
        let source = InMemoryGroupMemberSource::new(rows);
        let codes = load_group_codes(&source, "SIMILAR_CANCER_SAMSUNG_V1").await.unwrap();
        assert_eq!(codes, HashSet::from(["C73".to_string()]));
    }

    #[tokio::test]
    async fn range_members_resolve_to_endpoints_only() {
        let mut rows = std::collections::HashMap::new();
        rows.insert(
            "GENERAL_CANCER_V1".to_string(),
            vec![GroupMemberRow::Range { from: "C00".into(), to: "C97".into() }],
        );
        let source = InMemoryGroupMemberSource::new(rows);
        let codes = load_group_codes(&source, "GENERAL_CANCER_V1").await.unwrap();
        assert_eq!(codes, HashSet::from(["C00".to_string(), "C97".to_string()]));
        assert!(!codes.contains("C50"), "range expansion is deferred, only endpoints are stored");
    }

    #[tokio::test]
    async fn unknown_group_resolves_empty() {
        let source = InMemoryGroupMemberSource::new(std::collections::HashMap::new());
        let codes = load_group_codes(&source, "NOPE").await.unwrap();
        assert!(codes.is_empty());
    }
}
