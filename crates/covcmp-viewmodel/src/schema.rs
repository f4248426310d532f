//! Schema Guard (spec §4.13): validates an assembled [`crate::ViewModel`]
//! against the frozen `next4.v1` JSON Schema document before it leaves
//! the core. The schema is embedded at compile time so there is no
//! runtime file dependency and no drift between the artifact and the
//! code that enforces it.

use crate::types::ViewModel;
use covcmp_foundation::error::CoreError;
use once_cell::sync::Lazy;

const SCHEMA_JSON: &str = include_str!("../schema/next4.v1.json");

static SCHEMA_DOCUMENT: Lazy<serde_json::Value> =
    Lazy::new(|| serde_json::from_str(SCHEMA_JSON).expect("embedded next4.v1.json must parse"));

static COMPILED_SCHEMA: Lazy<jsonschema::JSONSchema> = Lazy::new(|| {
    jsonschema::JSONSchema::options()
        .with_draft(jsonschema::Draft::Draft202012)
        .compile(&SCHEMA_DOCUMENT)
        .expect("embedded next4.v1.json must compile as a valid JSON Schema")
});

/// Validate a [`ViewModel`] against `next4.v1.json`. Failure is always a
/// `CoreError::SchemaValidation` — this is the last gate before a
/// ViewModel is handed to a caller.
pub fn validate_view_model(view_model: &ViewModel) -> Result<(), CoreError> {
    let instance = serde_json::to_value(view_model)
        .map_err(|e| CoreError::Internal(e.into()))?;

    let result = COMPILED_SCHEMA.validate(&instance);
    if let Err(errors) = result {
        let messages: Vec<String> = errors.map(|e| e.to_string()).collect();
        return Err(CoreError::SchemaValidation(messages.join("; ")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembler::assemble_view_model;
    use covcmp_contracts::{ComparisonResult, NextAction, UxMessageCode};
    use covcmp_compare::ComparisonOutcome;
    use covcmp_registry::{CancerCanonical, CanonicalCoverageCode, InsurerCode};
    use covcmp_universe::{CoverageMapping, CoverageSlots, FullCoverage, MappingEvidence, ProposalCoverage, SourceConfidence};

    fn sample() -> FullCoverage {
        FullCoverage {
            coverage: ProposalCoverage {
                insurer: InsurerCode::Samsung,
                proposal_id: "P-1".into(),
                raw_coverage_name: "일반암진단비".into(),
                normalized_name: "일반암진단비".into(),
                currency: "KRW".into(),
                amount_value: 30_000_000,
                payout_amount_unit: "원".into(),
                source_page: 4,
                span_text: "일반암진단비".into(),
                content_hash: "h".into(),
            },
            mapping: CoverageMapping::mapped(
                CanonicalCoverageCode::Cancer(CancerCanonical::General),
                MappingEvidence { lookup_key: "일반암진단비".into(), matched_alias: None, source_file: None, match_type: "exact".into() },
            ),
            slots: Some(CoverageSlots::empty(SourceConfidence::ProposalConfirmed)),
        }
    }

    #[test]
    fn assembled_view_model_passes_schema_validation() {
        let outcome = ComparisonOutcome {
            comparison_result: ComparisonResult::Comparable,
            next_action: NextAction::Compare,
            ux_message_code: UxMessageCode::CoverageMatchComparable,
            message: "ok".into(),
        };
        let vm = assemble_view_model("일반암진단비", Some(&sample()), None, &outcome, chrono::Utc::now());
        assert!(validate_view_model(&vm).is_ok());
    }

    #[test]
    fn wrong_schema_version_fails_validation() {
        let outcome = ComparisonOutcome {
            comparison_result: ComparisonResult::Comparable,
            next_action: NextAction::Compare,
            ux_message_code: UxMessageCode::CoverageMatchComparable,
            message: "ok".into(),
        };
        let mut vm = assemble_view_model("일반암진단비", Some(&sample()), None, &outcome, chrono::Utc::now());
        vm.schema_version = "not-a-version".to_string();
        assert!(validate_view_model(&vm).is_err());
    }
}
