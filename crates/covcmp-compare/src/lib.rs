//! Compare Orchestrator, multi-party overlap, and evidence aggregation
//! (spec §4.10-§4.11): the read-side module that turns resolved proposal
//! coverage into a `ComparisonResult` plus the evidence and explanation
//! text a caller renders to a user. Every decision here is a closed
//! lookup table or a deterministic fold — nothing probabilistic.

pub mod evidence;
pub mod orchestrator;
pub mod overlap;
pub mod query_resolution;

pub use evidence::{aggregate_evidence, EvidenceSpan};
pub use orchestrator::{determine_comparison_result, ComparisonOutcome};
pub use overlap::{
    aggregate_overlap, check_no_forbidden_phrases, comparison_state_for, explain_overlap, pairwise_overlap,
    AggregateOverlapState, MultiPartyComparisonState, PairOverlapState, ScopeGroups,
};
pub use query_resolution::resolve_query_to_canonical;
