//! Deterministic compiler (spec §4.9): user selections → compiled compare
//! request + debug trace. No LLM, no inference — same input always
//! produces the same compiled request and the same decision trace.

use crate::rules::{
    detect_cancer_subtypes, detect_comparison_focus, detect_surgery_method, get_main_coverage_priority,
};
use crate::schemas::{CompileInput, CompileOutput, CompilerDebug};
use crate::version::RULE_VERSION;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Compile user selections into a compare-request payload and a
/// reproducible decision trace.
pub fn compile_request(input: &CompileInput) -> CompileOutput {
    let mut trace: Vec<String> = Vec::new();
    let mut warnings: Vec<String> = Vec::new();
    let mut selected_slots: IndexMap<String, Value> = IndexMap::new();

    trace.push("Step 1: Normalize insurers".to_string());
    if input.selected_insurers.len() < 2 {
        warnings.push("Less than 2 insurers selected".to_string());
    }
    selected_slots.insert("insurers".to_string(), json!(input.selected_insurers));
    trace.push(format!("  → Selected insurers: {:?}", input.selected_insurers));

    trace.push("Step 2: Normalize comparison basis".to_string());
    if let Some(basis) = &input.selected_comparison_basis {
        selected_slots.insert("comparison_basis".to_string(), json!(basis));
        trace.push(format!("  → Comparison basis: {basis}"));
    } else {
        let mut detected_domain = None;
        for (coverage_name, domain) in [("암진단비", "cancer"), ("일반암진단비", "cancer"), ("수술비", "surgery")] {
            if input.user_query.contains(coverage_name) {
                detected_domain = Some(domain);
                let main_coverage = get_main_coverage_priority(domain);
                if let Some(first) = main_coverage.first() {
                    selected_slots.insert("comparison_basis".to_string(), json!(first));
                    trace.push(format!("  → Auto-detected domain: {domain}"));
                    trace.push(format!("  → Using main coverage: {first}"));
                }
                break;
            }
        }
        if detected_domain.is_none() {
            warnings.push("No comparison basis specified and could not auto-detect".to_string());
            trace.push("  → No comparison basis detected".to_string());
        }
    }

    trace.push("Step 3: Process options".to_string());
    if let Some(options) = &input.options {
        if let Some(surgery_method) = &options.surgery_method {
            selected_slots.insert("surgery_method".to_string(), json!(surgery_method));
            trace.push(format!("  → Surgery method: {surgery_method}"));
        }
        if let Some(cancer_subtypes) = &options.cancer_subtypes {
            selected_slots.insert("cancer_subtypes".to_string(), json!(cancer_subtypes));
            trace.push(format!("  → Cancer subtypes: {cancer_subtypes:?}"));
        }
        if let Some(comparison_focus) = &options.comparison_focus {
            selected_slots.insert("comparison_focus".to_string(), json!(comparison_focus));
            trace.push(format!("  → Comparison focus: {comparison_focus}"));
        }
    } else {
        trace.push("  → No options specified".to_string());
    }

    trace.push("Step 4: Build ProposalCompareRequest".to_string());
    let mut compiled_request: IndexMap<String, Value> = IndexMap::new();
    let query = selected_slots
        .get("comparison_basis")
        .cloned()
        .unwrap_or_else(|| json!(input.user_query));
    compiled_request.insert("query".to_string(), query.clone());
    compiled_request.insert("include_policy_evidence".to_string(), json!(true));

    if input.selected_insurers.len() >= 2 {
        compiled_request.insert("insurer_a".to_string(), json!(input.selected_insurers[0]));
        compiled_request.insert("insurer_b".to_string(), json!(input.selected_insurers[1]));
        trace.push(format!("  → insurer_a: {}", input.selected_insurers[0]));
        trace.push(format!("  → insurer_b: {}", input.selected_insurers[1]));
    }
    trace.push(format!("  → Final query: {query}"));

    trace.push("Step 5: Finalize compiler debug".to_string());
    trace.push(format!("  → Total warnings: {}", warnings.len()));
    trace.push(format!("  → Compilation complete (rule_version={RULE_VERSION})"));

    let compiler_debug = CompilerDebug {
        rule_version: RULE_VERSION.to_string(),
        resolved_coverage_codes: None,
        selected_slots,
        decision_trace: trace,
        warnings,
    };

    CompileOutput { compiled_request, compiler_debug }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequiredSelection {
    #[serde(rename = "type")]
    pub selection_type: String,
    pub reason: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_required: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detected: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClarificationCheck {
    pub clarification_needed: bool,
    pub required_selections: Vec<RequiredSelection>,
}

/// Deterministically decide whether the query needs user clarification
/// before a compile can produce an unambiguous compare request.
pub fn detect_clarification_needed(query: &str, insurers: Option<&[String]>) -> ClarificationCheck {
    let mut required_selections = Vec::new();

    if insurers.map(|i| i.len()).unwrap_or(0) < 2 {
        required_selections.push(RequiredSelection {
            selection_type: "insurers".to_string(),
            reason: "Need at least 2 insurers to compare".to_string(),
            min_required: Some(2),
            options: None,
            detected: None,
        });
    }

    let surgery_method = detect_surgery_method(query);
    let query_lower = query.to_lowercase();
    if ["다빈치", "로봇", "복강경"].iter().any(|kw| query_lower.contains(kw)) && surgery_method.is_none() {
        required_selections.push(RequiredSelection {
            selection_type: "surgery_method".to_string(),
            reason: "Query mentions surgery method but it's ambiguous".to_string(),
            min_required: None,
            options: Some(
                ["da_vinci", "robot", "laparoscopic", "any"].iter().map(|s| s.to_string()).collect(),
            ),
            detected: None,
        });
    }

    let cancer_subtypes = detect_cancer_subtypes(query);
    if ["제자리암", "경계성", "유사암"].iter().any(|kw| query_lower.contains(kw)) && cancer_subtypes.len() > 1 {
        required_selections.push(RequiredSelection {
            selection_type: "cancer_subtypes".to_string(),
            reason: "Query mentions multiple cancer subtypes".to_string(),
            min_required: None,
            options: Some(
                ["제자리암", "경계성종양", "유사암", "일반암"].iter().map(|s| s.to_string()).collect(),
            ),
            detected: Some(cancer_subtypes.iter().map(|s| s.label().to_string()).collect()),
        });
    }

    if detect_comparison_focus(query).is_none() {
        required_selections.push(RequiredSelection {
            selection_type: "comparison_focus".to_string(),
            reason: "Comparison focus unclear (amount vs definition vs condition)".to_string(),
            min_required: None,
            options: Some(["amount", "definition", "condition"].iter().map(|s| s.to_string()).collect()),
            detected: None,
        });
    }

    ClarificationCheck {
        clarification_needed: !required_selections.is_empty(),
        required_selections,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schemas::CompileOptions;

    #[test]
    fn compile_request_is_deterministic_for_identical_input() {
        let input = CompileInput {
            user_query: "암진단비 비교".to_string(),
            selected_insurers: vec!["SAMSUNG".to_string(), "MERITZ".to_string()],
            selected_comparison_basis: None,
            options: None,
        };
        let first = compile_request(&input);
        let second = compile_request(&input);
        assert_eq!(first.compiled_request, second.compiled_request);
        assert_eq!(first.compiler_debug.decision_trace, second.compiler_debug.decision_trace);
    }

    #[test]
    fn fewer_than_two_insurers_produces_a_warning() {
        let input = CompileInput {
            user_query: "암진단비 비교".to_string(),
            selected_insurers: vec!["SAMSUNG".to_string()],
            selected_comparison_basis: None,
            options: None,
        };
        let output = compile_request(&input);
        assert!(output.compiler_debug.warnings.iter().any(|w| w.contains("Less than 2 insurers")));
        assert!(!output.compiled_request.contains_key("insurer_a"));
    }

    #[test]
    fn auto_detects_cancer_domain_when_basis_not_selected() {
        let input = CompileInput {
            user_query: "일반암진단비 비교해줘".to_string(),
            selected_insurers: vec!["SAMSUNG".to_string(), "MERITZ".to_string()],
            selected_comparison_basis: None,
            options: None,
        };
        let output = compile_request(&input);
        assert_eq!(
            output.compiled_request.get("query").unwrap().as_str().unwrap(),
            "일반암진단비"
        );
    }

    #[test]
    fn explicit_surgery_method_option_is_recorded() {
        let input = CompileInput {
            user_query: "수술비 비교".to_string(),
            selected_insurers: vec!["SAMSUNG".to_string(), "MERITZ".to_string()],
            selected_comparison_basis: None,
            options: Some(CompileOptions {
                surgery_method: Some("da_vinci".to_string()),
                cancer_subtypes: None,
                comparison_focus: None,
            }),
        };
        let output = compile_request(&input);
        assert_eq!(
            output.compiler_debug.selected_slots.get("surgery_method").unwrap().as_str().unwrap(),
            "da_vinci"
        );
    }

    #[test]
    fn clarification_needed_when_insurers_missing() {
        let check = detect_clarification_needed("암진단비 비교", None);
        assert!(check.clarification_needed);
        assert!(check.required_selections.iter().any(|r| r.selection_type == "insurers"));
    }

    #[test]
    fn ambiguous_surgery_method_keyword_requires_clarification() {
        let insurers = vec!["SAMSUNG".to_string(), "MERITZ".to_string()];
        let check = detect_clarification_needed("로봇수술비 보장금액 비교", Some(&insurers));
        assert!(check.required_selections.iter().any(|r| r.selection_type == "surgery_method"));
    }

    #[test]
    fn multiple_cancer_subtype_mentions_require_clarification() {
        let insurers = vec!["SAMSUNG".to_string(), "MERITZ".to_string()];
        let check = detect_clarification_needed("제자리암과 경계성종양 보장금액", Some(&insurers));
        assert!(check.required_selections.iter().any(|r| r.selection_type == "cancer_subtypes"));
    }

    #[test]
    fn fully_specified_query_needs_no_clarification() {
        let insurers = vec!["SAMSUNG".to_string(), "MERITZ".to_string()];
        let check = detect_clarification_needed("일반암진단비 보장금액 비교", Some(&insurers));
        assert!(!check.clarification_needed);
    }
}
