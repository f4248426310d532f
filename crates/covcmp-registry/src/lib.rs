//! Canonical / Domain Registry (spec.md §3, §4.3 "Canonical / Domain Registry").
//!
//! Fixed canonical cancer codes, insurer registry, document-type priority
//! order, and the non-cancer canonical coverage master. These are the
//! constitutional closed sets of the system: modifying them is a schema
//! amendment, never a runtime decision.

mod cancer;
mod coverage_code;
mod disease_master;
mod document_type;
mod insurer;

pub use cancer::CancerCanonical;
pub use coverage_code::{CanonicalCoverageCode, CoverageStandard, CoverageStandardRegistry};
pub use disease_master::{DiseaseCodeMaster, DiseaseCodeMasterRegistry};
pub use document_type::DocumentType;
pub use insurer::InsurerCode;
