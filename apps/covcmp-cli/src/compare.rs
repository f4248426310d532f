//! `covcmp compare` — the CLI entry point for the read-side compare
//! pipeline (spec §4.10/§4.13): resolve the query, pull proposal
//! coverage from the Universe Lock for one or two insurers, run the
//! comparison decision table, assemble a ViewModel, validate it against
//! the frozen schema, and print it.

use anyhow::{Context, Result};
use clap::Args;
use covcmp_alias_index::AliasIndex;
use covcmp_cancer::CancerCompareIntegration;
use covcmp_compare::{determine_comparison_result, resolve_query_to_canonical};
use covcmp_evidence::PolicyEvidenceStore;
use covcmp_foundation::config::CoreConfig;
use covcmp_registry::{CanonicalCoverageCode, CoverageStandard, CoverageStandardRegistry, InsurerCode};
use covcmp_universe::{PgUniverseStore, UniverseReader};
use covcmp_viewmodel::{assemble_view_model, validate_view_model};
use sqlx::{postgres::PgPoolOptions, Row};

#[derive(Args)]
pub struct CompareArgs {
    /// Coverage name or alias to compare (e.g. "일반암진단비")
    #[clap(long)]
    query: String,

    /// First insurer (required)
    #[clap(long)]
    insurer_a: InsurerCode,

    /// Second insurer — omit for a single-insurer lookup
    #[clap(long)]
    insurer_b: Option<InsurerCode>,

    /// Override the alias workbook path (defaults to `COVCMP_ALIAS_WORKBOOK`)
    #[clap(long)]
    alias_workbook: Option<String>,

    /// Override the database connection string (defaults to the `POSTGRES_*` env vars)
    #[clap(long)]
    database_url: Option<String>,

    /// Print the raw ComparisonOutcome instead of the assembled ViewModel
    #[clap(long)]
    raw: bool,
}

pub async fn handle_command(args: CompareArgs) -> Result<()> {
    let config = CoreConfig::from_env().context("loading runtime configuration")?;
    let database_url = args.database_url.unwrap_or_else(|| config.database_url());
    let workbook_path = args.alias_workbook.unwrap_or(config.alias_workbook_path);

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .context("connecting to Postgres")?;
    let coverage_standard = load_coverage_standard_registry(&pool).await?;
    let evidence_pool = pool.clone();
    let store = PgUniverseStore::new(pool);

    let alias_index = AliasIndex::load(&workbook_path)
        .with_context(|| format!("loading alias workbook at {workbook_path}"))?;

    let cancer_integration = alias_index
        .is_cancer_query(&args.query)
        .then(|| CancerCompareIntegration::new(&alias_index, PolicyEvidenceStore::new(evidence_pool)));

    let fallback_canonical = resolve_query_to_canonical(&args.query).or_else(|| {
        alias_index
            .resolve_query(&args.query, true)
            .first()
            .and_then(|code| coverage_standard.resolve(code).ok())
    });

    let canonical_a = resolve_insurer_canonical(
        cancer_integration.as_ref(),
        &args.query,
        args.insurer_a,
        fallback_canonical.as_ref(),
    )
    .await?;
    let raw_name_a = if canonical_a.is_none() { Some(args.query.as_str()) } else { None };
    let coverage_a = store.get_proposal_coverage(args.insurer_a, canonical_a.as_ref(), raw_name_a).await?;

    let coverage_b = match args.insurer_b {
        Some(insurer_b) => {
            let canonical_b = resolve_insurer_canonical(
                cancer_integration.as_ref(),
                &args.query,
                insurer_b,
                fallback_canonical.as_ref(),
            )
            .await?;
            let raw_name_b = if canonical_b.is_none() { Some(args.query.as_str()) } else { None };
            store.get_proposal_coverage(insurer_b, canonical_b.as_ref(), raw_name_b).await?
        }
        None => None,
    };

    let outcome = determine_comparison_result(coverage_a.as_ref(), coverage_b.as_ref(), &args.query, args.insurer_a);

    if args.raw {
        println!("{}", serde_json::to_string_pretty(&serde_json::json!({
            "comparison_result": outcome.comparison_result,
            "next_action": outcome.next_action,
            "ux_message_code": outcome.ux_message_code,
            "message": outcome.message,
        }))?);
        return Ok(());
    }

    let view_model =
        assemble_view_model(&args.query, coverage_a.as_ref(), coverage_b.as_ref(), &outcome, chrono::Utc::now());
    validate_view_model(&view_model).context("assembled ViewModel failed schema validation")?;

    println!("{}", serde_json::to_string_pretty(&view_model)?);
    Ok(())
}

/// Resolve the canonical code to query the Universe Lock with for one
/// insurer. For a cancer-family query this asks evidence-based scope
/// decisioning first (AH-5: a decided code, never a recalled candidate);
/// an UNDECIDED or non-cancer query falls back to the blanket lexical/alias
/// resolution shared across both insurers.
async fn resolve_insurer_canonical(
    cancer_integration: Option<&CancerCompareIntegration<'_, PolicyEvidenceStore>>,
    query: &str,
    insurer: InsurerCode,
    fallback: Option<&CanonicalCoverageCode>,
) -> Result<Option<CanonicalCoverageCode>> {
    if let Some(integration) = cancer_integration {
        let decision = integration.resolve_cancer_canonical(query, insurer.as_str()).await?;
        if let Some(code) = decision.get_canonical_codes_for_compare().into_iter().min() {
            return Ok(Some(CanonicalCoverageCode::Cancer(code)));
        }
    }
    Ok(fallback.cloned())
}

async fn load_coverage_standard_registry(pool: &sqlx::PgPool) -> Result<CoverageStandardRegistry> {
    let rows = sqlx::query("SELECT coverage_code, coverage_name FROM coverage_standard")
        .fetch_all(pool)
        .await
        .context("loading coverage_standard")?;

    let standards = rows.into_iter().map(|row| CoverageStandard {
        coverage_code: row.get("coverage_code"),
        coverage_name: row.get("coverage_name"),
    });
    Ok(CoverageStandardRegistry::new(standards))
}
