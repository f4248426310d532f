//! `covcmp alias-index` — build the alias index from the mapping
//! workbook (spec §4.2) and inspect it without standing up the compare
//! pipeline.

use anyhow::{Context, Result};
use clap::Subcommand;
use covcmp_alias_index::AliasIndex;
use covcmp_foundation::config::CoreConfig;

#[derive(Subcommand)]
pub enum AliasIndexCommands {
    /// Load the workbook and report how many aliases and canonical codes it built
    Stats {
        /// Override the alias workbook path (defaults to `COVCMP_ALIAS_WORKBOOK`)
        #[clap(long)]
        alias_workbook: Option<String>,
    },

    /// Resolve a query string to its canonical coverage codes
    Resolve {
        query: String,

        #[clap(long)]
        alias_workbook: Option<String>,

        /// Disable the cancer-keyword guardrail that unions all four cancer canonicals
        #[clap(long)]
        no_cancer_guardrail: bool,
    },
}

pub async fn handle_command(cmd: AliasIndexCommands) -> Result<()> {
    match cmd {
        AliasIndexCommands::Stats { alias_workbook } => {
            let index = load_index(alias_workbook)?;
            println!(
                "{}",
                serde_json::to_string_pretty(&serde_json::json!({
                    "alias_count": index.alias_count(),
                    "cancer_canonical_codes": index.cancer_canonical_codes(),
                }))?
            );
            Ok(())
        }
        AliasIndexCommands::Resolve { query, alias_workbook, no_cancer_guardrail } => {
            let index = load_index(alias_workbook)?;
            let codes = index.resolve_query(&query, !no_cancer_guardrail);
            let resolved: Vec<_> = codes
                .iter()
                .map(|code| serde_json::json!({ "code": code, "display_name": index.get_display_name(code) }))
                .collect();
            println!("{}", serde_json::to_string_pretty(&resolved)?);
            Ok(())
        }
    }
}

fn load_index(alias_workbook: Option<String>) -> Result<AliasIndex> {
    let config = CoreConfig::from_env().context("loading runtime configuration")?;
    let workbook_path = alias_workbook.unwrap_or(config.alias_workbook_path);
    AliasIndex::load(&workbook_path).with_context(|| format!("loading alias workbook at {workbook_path}"))
}
