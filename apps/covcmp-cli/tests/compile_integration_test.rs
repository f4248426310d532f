use assert_cmd::Command;
use predicates::str::contains;

fn covcmp() -> Command {
    Command::cargo_bin("covcmp").unwrap()
}

#[test]
fn compile_prints_compiled_request_json() {
    let input = r#"{
        "user_query": "일반암진단비",
        "selected_insurers": ["SAMSUNG", "MERITZ"],
        "selected_comparison_basis": null,
        "options": null
    }"#;

    covcmp()
        .arg("compile")
        .arg(input)
        .assert()
        .success()
        .stdout(contains("compiled_request"))
        .stdout(contains("compiler_debug"));
}

#[test]
fn compile_clarification_only_reports_missing_insurers() {
    let input = r#"{
        "user_query": "일반암진단비",
        "selected_insurers": ["SAMSUNG"],
        "selected_comparison_basis": null,
        "options": null
    }"#;

    covcmp()
        .arg("compile")
        .arg("--clarification-only")
        .arg(input)
        .assert()
        .success()
        .stdout(contains("clarification_needed"));
}

#[test]
fn compile_rejects_malformed_json() {
    covcmp().arg("compile").arg("not json").assert().failure();
}

#[test]
fn alias_index_stats_fails_fast_on_missing_workbook() {
    covcmp()
        .arg("alias-index")
        .arg("stats")
        .arg("--alias-workbook")
        .arg("/nonexistent/workbook.xlsx")
        .assert()
        .failure();
}
