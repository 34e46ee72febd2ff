//! Artifact lifecycle tests
//!
//! Drives a spec through runs, baseline acceptance, status checks and a
//! failure bundle, all against one temporary artifact root.

use std::fs;
use std::path::{Path, PathBuf};

use image::{Rgba, RgbaImage};
use specshot_common::layout::run_screenshots_dir;
use specshot_common::{
    generate_failure_bundle, plan_for_run, AcceptOptions, BaselineState, BaselineStore, ErrorType,
    FailureReport, RunStore, SpecshotConfig, SuggestionType,
};
use tempfile::TempDir;

const SPEC: &str = "checkout";

fn config_for(tmp: &TempDir) -> SpecshotConfig {
    let config = SpecshotConfig {
        project_root: tmp.path().to_path_buf(),
        identity: Some("ci@build-01".to_string()),
        ..Default::default()
    };
    let path = tmp.path().join("specshot.toml");
    config.save(&path).unwrap();
    SpecshotConfig::load(&path).unwrap()
}

fn screenshot(run_dir: &Path, name: &str, color: [u8; 4]) -> PathBuf {
    let dir = run_screenshots_dir(run_dir);
    fs::create_dir_all(&dir).unwrap();
    let path = dir.join(format!("{}.png", name));
    RgbaImage::from_pixel(16, 16, Rgba(color)).save(&path).unwrap();
    path
}

#[test]
fn baseline_lifecycle() {
    let tmp = TempDir::new().unwrap();
    let config = config_for(&tmp);
    let runs = RunStore::new(config.layout());
    let store = BaselineStore::from_config(&config);

    // First run: everything is new
    let first = runs.create_run(SPEC).unwrap();
    let header = screenshot(&first, "header", [20, 40, 60, 255]);
    screenshot(&first, "footer", [200, 200, 200, 255]);

    let status = store.baseline_status(SPEC).unwrap();
    assert!(status.baselines.is_empty());
    assert_eq!(status.new_screenshots.len(), 2);

    let outcome = store.accept_baselines(SPEC, &AcceptOptions::all()).unwrap();
    assert_eq!(outcome.accepted, vec!["footer", "header"]);
    assert!(outcome.failed.is_empty());

    let record = store.read_acceptance(SPEC, "header").unwrap().unwrap();
    assert_eq!(record.accepted_by, "ci@build-01");
    assert_eq!(record.previous_hash, None);
    assert_eq!(
        fs::read(config.layout().baseline_image(SPEC, "header")).unwrap(),
        fs::read(&header).unwrap()
    );

    let status = store.baseline_status(SPEC).unwrap();
    assert!(status
        .baselines
        .iter()
        .all(|b| b.status == BaselineState::Match));

    // Second run: header changed, footer not captured, a new screenshot appears
    let second = runs.create_run(SPEC).unwrap();
    assert_eq!(runs.get_latest_run(SPEC).unwrap(), Some(second.clone()));
    screenshot(&second, "header", [220, 40, 60, 255]);
    screenshot(&second, "sidebar", [0, 0, 0, 255]);

    let status = store.baseline_status(SPEC).unwrap();
    let by_name = |name: &str| {
        status
            .baselines
            .iter()
            .find(|b| b.name == name)
            .unwrap()
            .clone()
    };
    assert_eq!(by_name("header").status, BaselineState::Diff);
    assert!(by_name("header").diff_percent.unwrap() > 0.0);
    assert_eq!(by_name("footer").status, BaselineState::Missing);
    assert_eq!(status.new_screenshots.len(), 1);
    assert_eq!(status.new_screenshots[0].name, "sidebar");

    // Re-accept the header and keep the hash history
    let outcome = store
        .accept_baselines(SPEC, &AcceptOptions::screenshot("header"))
        .unwrap();
    assert_eq!(outcome.accepted, vec!["header"]);
    let second_record = store.read_acceptance(SPEC, "header").unwrap().unwrap();
    assert_eq!(second_record.previous_hash, Some(record.current_hash.clone()));
    assert_ne!(second_record.current_hash, record.current_hash);

    // Accepting from the older run by id restores the original image
    let first_id = first.file_name().unwrap().to_string_lossy().to_string();
    let outcome = store
        .accept_baselines(SPEC, &AcceptOptions::screenshot("header").from_run(&first_id))
        .unwrap();
    assert_eq!(outcome.run_id, first_id);
    let third_record = store.read_acceptance(SPEC, "header").unwrap().unwrap();
    assert_eq!(third_record.current_hash, record.current_hash);
}

#[test]
fn accept_batch_reports_partial_failures() {
    let tmp = TempDir::new().unwrap();
    let config = config_for(&tmp);
    let runs = RunStore::new(config.layout());
    let store = BaselineStore::from_config(&config);

    let run = runs.create_run(SPEC).unwrap();
    screenshot(&run, "ok", [1, 2, 3, 255]);
    screenshot(&run, "gone", [4, 5, 6, 255]);

    let outcome = store
        .accept_baselines(SPEC, &AcceptOptions::screenshot("absent"))
        .unwrap();
    assert!(outcome.accepted.is_empty());
    assert_eq!(outcome.failed.len(), 1);
    assert_eq!(outcome.failed[0].name, "absent");

    fs::remove_file(run_screenshots_dir(&run).join("gone.png")).unwrap();
    fs::create_dir(run_screenshots_dir(&run).join("gone.png")).unwrap();

    let outcome = store.accept_baselines(SPEC, &AcceptOptions::all()).unwrap();
    assert_eq!(outcome.accepted, vec!["ok"]);
    assert_eq!(outcome.failed.len(), 1);
    assert_eq!(outcome.failed[0].name, "gone");
}

#[test]
fn failure_bundle_to_repair_plan() {
    let tmp = TempDir::new().unwrap();
    let config = config_for(&tmp);
    let runs = RunStore::new(config.layout());

    let run = runs.create_run(SPEC).unwrap();
    let raw = tmp.path().join("test-results");
    fs::create_dir_all(&raw).unwrap();
    fs::write(raw.join("trace.zip"), b"PK").unwrap();

    let report = FailureReport {
        step_id: "step-7".to_string(),
        action: "click".to_string(),
        error_message: "getByRole('button', { name: 'Pay' }) resolved to 0 elements".to_string(),
        ..Default::default()
    };
    let path = generate_failure_bundle(&run, &report, &raw).unwrap();

    let value: serde_json::Value = serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
    assert_eq!(value["failure"]["error_type"], "locator_not_found");
    assert_eq!(value["artifacts"]["trace"], "artifacts/trace.zip");
    assert_eq!(value["suggestions"][0]["type"], "update_locator");

    let plan = plan_for_run(&run).unwrap().unwrap();
    let primary = plan.primary_suggestion.unwrap();
    assert_eq!(primary.kind, SuggestionType::UpdateLocator);
    assert_eq!(primary.confidence, 0.8);
    assert!(!plan.auto_applicable);
    assert!(plan.requires_confirmation);

    // Runs without a bundle have nothing to plan
    let clean = runs.create_run(SPEC).unwrap();
    assert!(plan_for_run(&clean).unwrap().is_none());
}

#[test]
fn explicit_error_type_is_kept() {
    let tmp = TempDir::new().unwrap();
    let config = config_for(&tmp);
    let run = RunStore::new(config.layout()).create_run(SPEC).unwrap();

    let report = FailureReport {
        step_id: "step-1".to_string(),
        action: "goto".to_string(),
        error_message: "Timeout 30000ms exceeded".to_string(),
        error_type: Some(ErrorType::Unknown),
        ..Default::default()
    };
    generate_failure_bundle(&run, &report, &tmp.path().join("none")).unwrap();

    let plan = plan_for_run(&run).unwrap().unwrap();
    assert_eq!(plan.suggestions.len(), 1);
    assert_eq!(plan.suggestions[0].kind, SuggestionType::Investigate);
}

#[test]
fn specs_are_isolated() {
    let tmp = TempDir::new().unwrap();
    let config = config_for(&tmp);
    let runs = RunStore::new(config.layout());

    runs.create_run("login").unwrap();
    runs.create_run(SPEC).unwrap();
    runs.create_run(SPEC).unwrap();

    assert_eq!(runs.list_specs().unwrap(), vec!["checkout", "login"]);
    assert_eq!(runs.list_runs("login").unwrap().len(), 1);
    assert_eq!(runs.list_runs(SPEC).unwrap().len(), 2);
}
