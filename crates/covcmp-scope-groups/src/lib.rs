//! Policy Scope Group Engine (spec §4.12): the write-side pipeline that
//! turns policy-document evidence into `disease_code_group` /
//! `coverage_disease_scope` rows, plus the read-side group-code loader
//! `covcmp-compare`'s overlap detection consumes. Every write here
//! requires evidence (doc id, page, span) and insurer-specific insurance
//! concepts can never be stored as insurer-agnostic.

pub mod groups;
pub mod pg;
pub mod pipeline;
pub mod types;

pub use groups::{load_group_codes, GroupMemberRow, GroupMemberSource};
pub use pg::{PgGroupMemberSource, PgScopeGroupStore};
pub use pipeline::{
    add_disease_code_group_member, create_coverage_disease_scope, create_disease_code_group,
    update_proposal_slots_disease_scope_norm, ScopeGroupWriter,
};
pub use types::{CoverageDiseaseScope, DiseaseCodeGroup, GroupMember};
