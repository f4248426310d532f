//! Compiler rule version (spec §4.9): tracked explicitly so that two
//! compilations against the same rule version are guaranteed reproducible.

pub const COMPILER_VERSION: &str = "1.0.0";
pub const RULE_VERSION: &str = "v1.0.0-next6";
