//! `rehearse list` / `rehearse plan` integration tests against temp manifest
//! fixtures. No fetching or execution happens here.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn write_manifest(dir: &TempDir, contents: &str) -> std::path::PathBuf {
    let path = dir.path().join("notebooks.yaml");
    std::fs::write(&path, contents).expect("write manifest fixture");
    path
}

fn fixture_manifest(dir: &TempDir) -> std::path::PathBuf {
    write_manifest(
        dir,
        r#"
- name: overview
  url: nb/overview.ipynb
  tutorial: true
- name: spectral
  url: nb/spectral.ipynb
  datasets: [hess-dl3, joint-crab]
  tutorial: true
- name: cube
  url: nb/cube.ipynb
  datasets: [cta-1dc]
  requires: [iminuit]
  tutorial: true
- name: scratch
  url: nb/scratch.ipynb
  datasets: [hess-dl3]
"#,
    )
}

fn rehearse() -> Command {
    Command::cargo_bin("rehearse").expect("binary built")
}

// ---------------------------------------------------------------------------
// list
// ---------------------------------------------------------------------------

#[test]
fn list_shows_counts_and_entries() {
    let dir = TempDir::new().unwrap();
    let manifest = fixture_manifest(&dir);

    rehearse()
        .arg("list")
        .arg("--manifest")
        .arg(&manifest)
        .assert()
        .success()
        .stdout(predicate::str::contains("4 notebooks"))
        .stdout(predicate::str::contains("3 tutorials"))
        .stdout(predicate::str::contains("spectral"))
        .stdout(predicate::str::contains("hess-dl3"));
}

#[test]
fn list_json_is_parseable() {
    let dir = TempDir::new().unwrap();
    let manifest = fixture_manifest(&dir);

    let output = rehearse()
        .arg("list")
        .arg("--manifest")
        .arg(&manifest)
        .arg("--json")
        .output()
        .expect("run list --json");
    assert!(output.status.success());

    let payload: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("valid JSON");
    assert_eq!(payload["summary"]["notebooks"], 4);
    assert_eq!(payload["summary"]["tutorials"], 3);
    let notebooks = payload["notebooks"].as_array().expect("notebooks array");
    assert_eq!(notebooks.len(), 4);
}

#[test]
fn list_rejects_duplicate_names() {
    let dir = TempDir::new().unwrap();
    let manifest = write_manifest(
        &dir,
        "- name: twin\n  url: nb/a.ipynb\n- name: twin\n  url: nb/b.ipynb\n",
    );

    rehearse()
        .arg("list")
        .arg("--manifest")
        .arg(&manifest)
        .assert()
        .failure()
        .stderr(predicate::str::contains("duplicate notebook name 'twin'"));
}

// ---------------------------------------------------------------------------
// plan
// ---------------------------------------------------------------------------

#[test]
fn plan_defaults_to_tutorials_and_skips_blocked() {
    let dir = TempDir::new().unwrap();
    let manifest = fixture_manifest(&dir);

    rehearse()
        .arg("plan")
        .arg("--manifest")
        .arg(&manifest)
        .assert()
        .success()
        .stdout(predicate::str::contains("3 notebook(s): 2 runnable, 1 skipped"))
        .stdout(predicate::str::contains("fetch hess-dl3"))
        .stdout(predicate::str::contains("run overview"))
        .stdout(predicate::str::contains("cube — missing requirement(s): iminuit"))
        // cta-1dc is demanded only by the blocked cube notebook.
        .stdout(predicate::str::contains("cta-1dc").not())
        // scratch is not a tutorial, so the default selection omits it.
        .stdout(predicate::str::contains("scratch").not());
}

#[test]
fn plan_with_requirement_unblocks() {
    let dir = TempDir::new().unwrap();
    let manifest = fixture_manifest(&dir);

    rehearse()
        .arg("plan")
        .arg("--manifest")
        .arg(&manifest)
        .arg("--with")
        .arg("iminuit")
        .assert()
        .success()
        .stdout(predicate::str::contains("3 runnable, 0 skipped"))
        .stdout(predicate::str::contains("fetch cta-1dc"));
}

#[test]
fn plan_json_orders_fetches_before_runs() {
    let dir = TempDir::new().unwrap();
    let manifest = fixture_manifest(&dir);

    let output = rehearse()
        .arg("plan")
        .arg("spectral")
        .arg("--manifest")
        .arg(&manifest)
        .arg("--json")
        .output()
        .expect("run plan --json");
    assert!(output.status.success());

    let payload: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("valid JSON");
    let steps = payload["plan"]["steps"].as_array().expect("steps array");
    let kinds: Vec<&str> = steps
        .iter()
        .map(|s| s["step"].as_str().expect("step tag"))
        .collect();
    assert_eq!(kinds, vec!["fetch_dataset", "fetch_dataset", "run_notebook"]);
}

#[test]
fn plan_unknown_notebook_fails() {
    let dir = TempDir::new().unwrap();
    let manifest = fixture_manifest(&dir);

    rehearse()
        .arg("plan")
        .arg("ghost")
        .arg("--manifest")
        .arg(&manifest)
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown notebook 'ghost'"));
}
