//! `covcmp compile` — runs the deterministic compiler (spec §4.9) over a
//! `CompileInput` read from a file, an inline argument, or stdin, and
//! prints the compiled request plus its decision trace.

use anyhow::{Context, Result};
use clap::Args;
use covcmp_compiler::{compile_request, detect_clarification_needed, CompileInput};
use covcmp_foundation::cli::{print_json, read_input};

#[derive(Args)]
pub struct CompileArgs {
    /// JSON-encoded `CompileInput` (reads from `--file` or stdin if omitted)
    input: Option<String>,

    /// Read the `CompileInput` JSON from a file instead of an inline argument
    #[clap(short, long)]
    file: Option<String>,

    /// Only run the clarification check, not the full compile
    #[clap(long)]
    clarification_only: bool,
}

pub async fn handle_command(args: CompileArgs) -> Result<()> {
    let raw = read_input(args.file.as_deref(), args.input).context("reading compile input")?;
    let input: CompileInput = serde_json::from_str(&raw).context("parsing CompileInput JSON")?;

    if args.clarification_only {
        let check = detect_clarification_needed(&input.user_query, Some(input.selected_insurers.as_slice()));
        print_json(&check)?;
        return Ok(());
    }

    let output = compile_request(&input);
    print_json(&output)?;
    Ok(())
}
