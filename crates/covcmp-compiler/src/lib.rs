//! Deterministic compiler (spec §4.9): turns a user query plus explicit
//! selections into a compiled compare request and a decision trace. No
//! LLM and no statistical inference anywhere in this crate — every
//! detector is a fixed keyword table, so the same input always compiles
//! to the same output.

pub mod compiler;
pub mod rules;
pub mod schemas;
pub mod version;

pub use compiler::{compile_request, detect_clarification_needed, ClarificationCheck, RequiredSelection};
pub use rules::{
    coverage_domain_rules, detect_cancer_subtypes, detect_comparison_focus, detect_surgery_method,
    get_main_coverage_priority, resolve_coverage_domain, CancerSubtype, ComparisonFocus, SurgeryMethod,
};
pub use schemas::{CompileInput, CompileOptions, CompileOutput, CompilerDebug};
pub use version::{COMPILER_VERSION, RULE_VERSION};
