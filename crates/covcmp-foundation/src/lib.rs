//! Ambient stack shared across the `covcmp` workspace: error handling,
//! configuration, and logging init. Domain crates depend on this one
//! the way `rh-fhirpath`/`rh-validator` depend on `rh-foundation`.

pub mod cli;
pub mod config;
pub mod error;
pub mod logging;

pub use config::{Config, CoreConfig};
pub use error::{CoreError, ErrorContext, ErrorWithMetadata, FoundationError, Result};
pub use logging::init_logging;
