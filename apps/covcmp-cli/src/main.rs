use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::error;

mod admin;
mod alias_index;
mod compare;
mod compile;

/// covcmp - CLI for the insurance coverage-comparison engine
#[derive(Parser)]
#[clap(name = "covcmp")]
#[clap(about = "CLI for the coverage-comparison engine")]
#[clap(version)]
#[clap(long_about = "Compare proposal coverage across insurers, compile clarification-panel requests, inspect the alias index, and drive the admin mapping workbench.")]
struct Cli {
    /// Enable verbose logging
    #[clap(short, long, global = true)]
    verbose: bool,

    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compare proposal coverage between one or two insurers
    Compare(compare::CompareArgs),

    /// Run the deterministic compiler over a clarification-panel selection
    Compile(compile::CompileArgs),

    /// Build and inspect the alias index
    #[clap(subcommand)]
    AliasIndex(alias_index::AliasIndexCommands),

    /// Admin mapping workbench: queue, approve, reject, snooze
    #[clap(subcommand)]
    Admin(admin::AdminCommands),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.verbose {
        std::env::set_var("RUST_LOG", "debug");
    }
    covcmp_foundation::logging::init_logging();

    match cli.command {
        Commands::Compare(cmd) => {
            if let Err(e) = compare::handle_command(cmd).await {
                error!("compare error: {e}");
                std::process::exit(1);
            }
        }
        Commands::Compile(cmd) => {
            if let Err(e) = compile::handle_command(cmd).await {
                error!("compile error: {e}");
                std::process::exit(1);
            }
        }
        Commands::AliasIndex(cmd) => {
            if let Err(e) = alias_index::handle_command(cmd).await {
                error!("alias-index error: {e}");
                std::process::exit(1);
            }
        }
        Commands::Admin(cmd) => {
            if let Err(e) = admin::handle_command(cmd).await {
                error!("admin error: {e}");
                std::process::exit(1);
            }
        }
    }

    Ok(())
}
