//! `tracing`-based structured logging init, shared by the CLI and any
//! future service entry point. Mirrors the env-filter setup the teacher
//! workspace wires up for `apps/rh-cli`.

use tracing_subscriber::{fmt, EnvFilter};

/// Initialize a process-wide `tracing` subscriber reading `RUST_LOG`
/// (defaulting to `info`). Safe to call once at binary startup; calling
/// it twice is a logic error in the caller, not handled here.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).with_target(true).init();
}
