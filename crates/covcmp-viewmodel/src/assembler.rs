//! ViewModel assembler (spec §4.13): `ComparisonOutcome` + resolved
//! proposal coverage → `ViewModel`. Fact-only — status comes from data
//! already on hand, never a new inference; sorting is stable so the same
//! input always assembles to the same output.

use crate::types::{
    AmountInfo, Debug, EvidencePanel, FactTable, FactTableRow, Header, InsurerSnapshot, PayoutCondition,
    RetrievalInfo, SlotKey, Snapshot, StatusCode, ViewModel,
};
use chrono::{DateTime, Utc};
use covcmp_compare::ComparisonOutcome;
use covcmp_contracts::ComparisonResult;
use covcmp_registry::{DocumentType, InsurerCode};
use covcmp_universe::{FullCoverage, MappingStatus};

pub const SCHEMA_VERSION: &str = "next4.v1";

/// Map comparison/mapping status to the conservative, fact-only
/// [`StatusCode`] the UI renders. `UNMAPPED`/`AMBIGUOUS` mapping status
/// always wins; otherwise falls back to `MISSING_EVIDENCE` rather than
/// asserting something the data doesn't support.
pub fn map_status(comparison_result: &ComparisonResult, mapping_status: MappingStatus) -> StatusCode {
    match mapping_status {
        MappingStatus::Unmapped => return StatusCode::Unmapped,
        MappingStatus::Ambiguous => return StatusCode::Ambiguous,
        MappingStatus::Mapped => {}
    }
    match comparison_result {
        ComparisonResult::OutOfUniverse => StatusCode::OutOfUniverse,
        ComparisonResult::Comparable => StatusCode::Ok,
        ComparisonResult::ComparableWithGaps => StatusCode::MissingEvidence,
        ComparisonResult::PolicyRequired => StatusCode::MissingEvidence,
        ComparisonResult::NonComparable => StatusCode::Ok,
        ComparisonResult::Unmapped => StatusCode::Unmapped,
    }
}

/// Format a 원-denominated amount as a 만원-denominated [`AmountInfo`],
/// e.g. 30,000,000 → "3,000만원".
pub fn format_amount(amount_value: i64) -> AmountInfo {
    let manwon = amount_value as f64 / 10_000.0;
    let display_text = if manwon.fract() == 0.0 {
        format!("{:,}만원", manwon as i64)
    } else {
        format!("{manwon:.1}만원")
    };
    AmountInfo { amount_value: manwon, amount_unit: "만원".to_string(), display_text, evidence_ref_id: None }
}

/// Deterministic evidence panel ID: `ev_{insurer}_{doc_type}_{index:03}`.
pub fn generate_evidence_id(insurer: InsurerCode, doc_type: DocumentType, index: u32) -> String {
    format!("ev_{}_{}_{:03}", insurer.as_str().to_lowercase(), doc_type.short_code(), index)
}

fn extract_payout_conditions(slots: &covcmp_universe::CoverageSlots, evidence_id: &str) -> Vec<PayoutCondition> {
    let mut conditions = Vec::new();
    if let Some(raw) = &slots.disease_scope_raw {
        conditions.push(PayoutCondition {
            slot_key: SlotKey::DiseaseScope,
            value_text: raw.clone(),
            evidence_ref_id: Some(evidence_id.to_string()),
        });
    }
    if let Some(days) = slots.waiting_period_days {
        conditions.push(PayoutCondition {
            slot_key: SlotKey::WaitingPeriod,
            value_text: format!("{days}일"),
            evidence_ref_id: Some(evidence_id.to_string()),
        });
    }
    if let Some(limit) = &slots.payout_limit {
        conditions.push(PayoutCondition {
            slot_key: SlotKey::PayoutLimit,
            value_text: format!("{limit:?}"),
            evidence_ref_id: Some(evidence_id.to_string()),
        });
    }
    conditions
}

struct EvidenceBuilder {
    panels: Vec<EvidencePanel>,
    counter: u32,
}

impl EvidenceBuilder {
    fn new() -> Self {
        Self { panels: Vec::new(), counter: 0 }
    }

    fn add(&mut self, insurer: InsurerCode, doc_type: DocumentType, doc_title: String, page: String, excerpt: String) -> String {
        self.counter += 1;
        let id = generate_evidence_id(insurer, doc_type, self.counter);
        self.panels.push(EvidencePanel { id: id.clone(), insurer, doc_type, doc_title: Some(doc_title), page, excerpt, bbox: None });
        id
    }
}

fn snapshot_and_row(
    builder: &mut EvidenceBuilder,
    coverage: &FullCoverage,
    outcome: &ComparisonOutcome,
) -> (InsurerSnapshot, FactTableRow) {
    let insurer = coverage.coverage.insurer;
    let mut excerpt = format!("{}: {:,}원", coverage.coverage.raw_coverage_name, coverage.coverage.amount_value);
    if let Some(slots) = &coverage.slots {
        if let Some(raw) = &slots.disease_scope_raw {
            excerpt.push_str(&format!(" ({raw})"));
        }
    }
    if excerpt.chars().count() < 25 {
        excerpt.push_str(" (가입설계서 기준)");
    }

    let evidence_id =
        builder.add(insurer, DocumentType::Proposal, format!("{insurer} 가입설계서"), format!("proposal_{}", coverage.coverage.proposal_id), excerpt);

    let mut amount_info = format_amount(coverage.coverage.amount_value);
    amount_info.evidence_ref_id = Some(evidence_id.clone());

    let status = map_status(&outcome.comparison_result, coverage.mapping.mapping_status);

    let snapshot = InsurerSnapshot { insurer, headline_amount: Some(amount_info.clone()), status };

    let note_text = match coverage.mapping.mapping_status {
        MappingStatus::Unmapped => Some("(UNMAPPED)".to_string()),
        MappingStatus::Ambiguous => Some("(AMBIGUOUS - 수동 매핑 필요)".to_string()),
        MappingStatus::Mapped => None,
    };

    let payout_conditions =
        coverage.slots.as_ref().map(|slots| extract_payout_conditions(slots, &evidence_id)).unwrap_or_default();

    let title = coverage
        .mapping
        .canonical_coverage_code
        .as_ref()
        .map(|c| c.to_string())
        .unwrap_or_else(|| coverage.coverage.raw_coverage_name.clone());

    let row = FactTableRow {
        insurer,
        coverage_title_normalized: title,
        benefit_amount: Some(amount_info),
        payout_conditions,
        term_text: None,
        note_text,
        row_status: status,
    };

    (snapshot, row)
}

/// Assemble a complete [`ViewModel`] from resolved coverage and a
/// comparison outcome. `generated_at` is supplied by the caller so
/// assembly itself stays a pure function of its inputs.
pub fn assemble_view_model(
    query: &str,
    coverage_a: Option<&FullCoverage>,
    coverage_b: Option<&FullCoverage>,
    outcome: &ComparisonOutcome,
    generated_at: DateTime<Utc>,
) -> ViewModel {
    let mut builder = EvidenceBuilder::new();
    let mut snapshot_insurers = Vec::new();
    let mut rows = Vec::new();

    for coverage in [coverage_a, coverage_b].into_iter().flatten() {
        let (snap, row) = snapshot_and_row(&mut builder, coverage, outcome);
        snapshot_insurers.push(snap);
        rows.push(row);
    }

    rows.sort_by(|a, b| a.insurer.cmp(&b.insurer).then_with(|| a.coverage_title_normalized.cmp(&b.coverage_title_normalized)));

    let comparison_basis = coverage_a
        .and_then(|c| c.mapping.canonical_coverage_code.as_ref().map(|code| code.to_string()))
        .or_else(|| coverage_a.map(|c| c.coverage.raw_coverage_name.clone()))
        .unwrap_or_else(|| "비교 담보".to_string());

    builder.panels.sort_by(|a, b| a.insurer.cmp(&b.insurer).then_with(|| a.doc_type.cmp(&b.doc_type)).then_with(|| a.id.cmp(&b.id)));

    let mut resolved_codes = Vec::new();
    for coverage in [coverage_a, coverage_b].into_iter().flatten() {
        if let Some(code) = &coverage.mapping.canonical_coverage_code {
            let code = code.to_string();
            if !resolved_codes.contains(&code) {
                resolved_codes.push(code);
            }
        }
    }

    let mut warnings = Vec::new();
    if outcome.comparison_result == ComparisonResult::Unmapped {
        warnings.push("coverage UNMAPPED (no canonical code)".to_string());
    }
    if outcome.comparison_result == ComparisonResult::OutOfUniverse {
        warnings.push("coverage OUT_OF_UNIVERSE (not in proposal)".to_string());
    }

    let debug = Debug {
        resolved_coverage_codes: if resolved_codes.is_empty() { None } else { Some(resolved_codes) },
        retrieval: Some(RetrievalInfo {
            topk: None,
            strategy: Some("proposal_universe_lock".to_string()),
            doc_priority: Some(vec!["PROPOSAL".into(), "PRODUCT_SUMMARY".into(), "BUSINESS_METHOD".into(), "POLICY".into()]),
        }),
        warnings: if warnings.is_empty() { None } else { Some(warnings) },
        execution_time_ms: None,
    };

    ViewModel {
        schema_version: SCHEMA_VERSION.to_string(),
        generated_at,
        header: Header { user_query: query.to_string(), normalized_query: Some(query.trim().to_string()) },
        snapshot: Snapshot { comparison_basis, insurers: snapshot_insurers },
        fact_table: FactTable { columns: FactTable::default_columns(), rows },
        evidence_panels: builder.panels,
        debug: Some(debug),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use covcmp_contracts::{NextAction, UxMessageCode};
    use covcmp_registry::{CancerCanonical, CanonicalCoverageCode};
    use covcmp_universe::{CoverageMapping, CoverageSlots, MappingEvidence, ProposalCoverage, SourceConfidence};

    fn evidence() -> MappingEvidence {
        MappingEvidence { lookup_key: "일반암진단비".into(), matched_alias: None, source_file: None, match_type: "exact".into() }
    }

    fn coverage(insurer: InsurerCode, amount: i64) -> FullCoverage {
        FullCoverage {
            coverage: ProposalCoverage {
                insurer,
                proposal_id: "P-1".into(),
                raw_coverage_name: "일반암진단비".into(),
                normalized_name: "일반암진단비".into(),
                currency: "KRW".into(),
                amount_value: amount,
                payout_amount_unit: "원".into(),
                source_page: 4,
                span_text: "일반암진단비".into(),
                content_hash: "h".into(),
            },
            mapping: CoverageMapping::mapped(CanonicalCoverageCode::Cancer(CancerCanonical::General), evidence()),
            slots: Some(CoverageSlots::empty(SourceConfidence::ProposalConfirmed)),
        }
    }

    fn outcome() -> ComparisonOutcome {
        ComparisonOutcome {
            comparison_result: ComparisonResult::Comparable,
            next_action: NextAction::Compare,
            ux_message_code: UxMessageCode::CoverageMatchComparable,
            message: "ok".into(),
        }
    }

    #[test]
    fn formats_thirty_million_won_as_three_thousand_manwon() {
        let info = format_amount(30_000_000);
        assert_eq!(info.display_text, "3,000만원");
    }

    #[test]
    fn scenario_a_amounts_render_as_spec_examples() {
        assert_eq!(format_amount(30_000_000).display_text, "3,000만원");
        assert_eq!(format_amount(20_000_000).display_text, "2,000만원");
    }

    #[test]
    fn assembles_view_model_with_two_insurers_sorted_by_insurer() {
        let a = coverage(InsurerCode::Samsung, 30_000_000);
        let b = coverage(InsurerCode::Meritz, 20_000_000);
        let vm = assemble_view_model("일반암진단비", Some(&a), Some(&b), &outcome(), Utc::now());
        assert_eq!(vm.schema_version, "next4.v1");
        assert_eq!(vm.fact_table.rows.len(), 2);
        assert_eq!(vm.fact_table.rows[0].insurer, InsurerCode::Samsung);
        assert_eq!(vm.fact_table.rows[1].insurer, InsurerCode::Meritz);
        assert_eq!(vm.snapshot.insurers.len(), 2);
        assert!(!vm.evidence_panels.is_empty());
    }

    #[test]
    fn unmapped_mapping_status_always_wins_over_comparison_result() {
        let mut a = coverage(InsurerCode::Samsung, 10_000_000);
        a.mapping = CoverageMapping::unmapped(evidence());
        let status = map_status(&ComparisonResult::Comparable, a.mapping.mapping_status);
        assert_eq!(status, StatusCode::Unmapped);
    }
}
