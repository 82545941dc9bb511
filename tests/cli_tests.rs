use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;
use std::fs;
use std::path::PathBuf;
mod test_env;

const SNAPSHOT: &str = r#"{
    "threads": [
        {"thread_id": 1463668685993541696, "title": "Landing", "starter_text": "Brief: https://www.notion.so/Landing-2fdd14a8642b80edb194deed54c6449e"},
        {"thread_id": 1463668685993541697, "title": "Banner", "starter_text": "Need a banner for the fair"}
    ],
    "tasks": []
}"#;

const COMPLETE: &str = "Notion: https://www.notion.so/acme/Landing-2fdd14a8642b80edb194deed54c6449e \
    We want to relaunch the promo landing page so that returning customers find the new bundles fast. \
    It must follow the brand guidelines. Deliverables: mockups for desktop and mobile. Deadline: 2026-03-15";

/// Helper to create an isolated home with an rc file pointing at temp data files
fn setup_test_env() -> (TempDir, std::sync::MutexGuard<'static, ()>) {
    let guard = test_env::lock_test_env();
    let temp_dir = TempDir::new().unwrap();

    let config_dir = temp_dir.path().join(".threadlink");
    fs::create_dir_all(&config_dir).unwrap();
    fs::write(
        config_dir.join("rc"),
        format!(
            "data.location={}\nmapping.location={}\nlookup.timeout_ms=2000\n",
            temp_dir.path().join("state.db").display(),
            temp_dir.path().join("mapping.csv").display()
        ),
    )
    .unwrap();

    std::env::set_var("HOME", temp_dir.path().to_str().unwrap());
    (temp_dir, guard)
}

fn snapshot_file(temp_dir: &TempDir) -> PathBuf {
    let path = temp_dir.path().join("snapshot.json");
    fs::write(&path, SNAPSHOT).unwrap();
    path
}

fn get_cmd(temp_dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("threadlink").unwrap();
    cmd.env("HOME", temp_dir.path());
    cmd
}

#[test]
fn test_version_command() {
    let (temp_dir, _guard) = setup_test_env();
    get_cmd(&temp_dir)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_mapping_set_then_list() {
    let (temp_dir, _guard) = setup_test_env();

    get_cmd(&temp_dir)
        .args(["mapping", "set", "42", "--status", "approved", "--url", "https://www.notion.so/T42", "--title", "Poster"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Set thread 42 to approved."));

    get_cmd(&temp_dir)
        .args(["mapping", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Poster"))
        .stdout(predicate::str::contains("approved"));

    let csv = fs::read_to_string(temp_dir.path().join("mapping.csv")).unwrap();
    assert!(csv.starts_with("thread_id,thread_title,notion_url,status,notes"));
    assert!(csv.contains("42,Poster,https://www.notion.so/T42,approved,"));
}

#[test]
fn test_mapping_set_warns_about_inconsistent_row() {
    let (temp_dir, _guard) = setup_test_env();
    get_cmd(&temp_dir)
        .args(["mapping", "set", "7", "--status", "approved"])
        .assert()
        .success()
        .stderr(predicate::str::contains("treated as pending"));
}

#[test]
fn test_invalid_status_is_user_error() {
    let (temp_dir, _guard) = setup_test_env();
    get_cmd(&temp_dir)
        .args(["mapping", "set", "7", "--status", "done"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::starts_with("Error:"))
        .stderr(predicate::str::contains("Invalid status"));
}

#[test]
fn test_invalid_thread_id_is_user_error() {
    let (temp_dir, _guard) = setup_test_env();
    get_cmd(&temp_dir)
        .args(["resolve", "abc"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Invalid thread ID"));
}

#[test]
fn test_resolve_from_mapping_table() {
    let (temp_dir, _guard) = setup_test_env();
    get_cmd(&temp_dir)
        .args(["mapping", "set", "42", "--status", "approved", "--url", "https://www.notion.so/T42"])
        .assert()
        .success();

    get_cmd(&temp_dir)
        .args(["resolve", "42"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Thread 42: approved"))
        .stdout(predicate::str::contains("https://www.notion.so/T42"))
        .stdout(predicate::str::contains("mapping_table"));
}

#[test]
fn test_resolve_from_starter_message_json() {
    let (temp_dir, _guard) = setup_test_env();
    let snapshot = snapshot_file(&temp_dir);
    get_cmd(&temp_dir).args(["populate", "--snapshot"]).arg(&snapshot).assert().success();
    // Drop the populated row so the fallback chain has to answer
    get_cmd(&temp_dir)
        .args(["mapping", "set", "1463668685993541696", "--status", "pending", "--url", ""])
        .assert()
        .success();

    let output = get_cmd(&temp_dir)
        .args(["resolve", "1463668685993541696", "--json", "--snapshot"])
        .arg(&snapshot)
        .output()
        .unwrap();
    assert!(output.status.success());
    let decision: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(decision["status"], "approved");
    assert_eq!(decision["source"], "starter_message");
    assert_eq!(decision["task_url"], "https://www.notion.so/Landing-2fdd14a8642b80edb194deed54c6449e");

    get_cmd(&temp_dir)
        .args(["processed", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1463668685993541696"))
        .stdout(predicate::str::contains("starter_message"));
}

#[test]
fn test_unlinked_thread_is_pending() {
    let (temp_dir, _guard) = setup_test_env();
    let snapshot = snapshot_file(&temp_dir);
    get_cmd(&temp_dir).args(["populate", "--snapshot"]).arg(&snapshot).assert().success();

    get_cmd(&temp_dir)
        .args(["resolve", "1463668685993541697", "--snapshot"])
        .arg(&snapshot)
        .assert()
        .success()
        .stdout(predicate::str::contains("pending"))
        .stdout(predicate::str::contains("Source: none"));
}

#[test]
fn test_corrupt_mapping_table_is_internal_error() {
    let (temp_dir, _guard) = setup_test_env();
    fs::write(
        temp_dir.path().join("mapping.csv"),
        "thread_id,thread_title,notion_url,status,notes\n1,\"unterminated,,approved,\n",
    )
    .unwrap();

    get_cmd(&temp_dir)
        .args(["resolve", "1"])
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::starts_with("Internal error:"));
}

#[test]
fn test_missing_mapping_table_is_internal_error() {
    let (temp_dir, _guard) = setup_test_env();
    get_cmd(&temp_dir)
        .args(["resolve", "1"])
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("mapping table unavailable"));
}

#[test]
fn test_populate_reports_summary() {
    let (temp_dir, _guard) = setup_test_env();
    let snapshot = snapshot_file(&temp_dir);

    get_cmd(&temp_dir)
        .args(["populate", "--snapshot"])
        .arg(&snapshot)
        .assert()
        .success()
        .stdout(predicate::str::contains("Rebuilt mapping table: 2 threads"))
        .stdout(predicate::str::contains("Approved (with task link): 1"))
        .stdout(predicate::str::contains("Pending (no link):         1"));

    let csv = fs::read_to_string(temp_dir.path().join("mapping.csv")).unwrap();
    assert!(csv.contains("No Notion link in starter message"));
}

#[test]
fn test_missing_snapshot_is_user_error() {
    let (temp_dir, _guard) = setup_test_env();
    get_cmd(&temp_dir)
        .args(["populate", "--snapshot", "does-not-exist.json"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Failed to read snapshot"));
}

#[test]
fn test_check_complete_submission() {
    let (temp_dir, _guard) = setup_test_env();
    get_cmd(&temp_dir)
        .args(["check", "--reference-date", "2026-02-10", COMPLETE])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("PASS"))
        .stdout(predicate::str::contains("Deadline date: 2026-03-15"));
}

#[test]
fn test_check_reads_stdin_json() {
    let (temp_dir, _guard) = setup_test_env();
    let output = get_cmd(&temp_dir)
        .args(["check", "--json", "--reference-date", "2026-02-10"])
        .write_stdin("please make a logo")
        .output()
        .unwrap();
    assert!(output.status.success());
    let verdict: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(verdict["is_valid"], false);
    let missing = verdict["missing_pillars"].as_array().unwrap();
    assert_eq!(missing.len(), 3);
}

#[test]
fn test_check_invalid_reference_date() {
    let (temp_dir, _guard) = setup_test_env();
    get_cmd(&temp_dir)
        .args(["check", "--reference-date", "10/02/2026", "text"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Invalid date"));
}

#[test]
fn test_intake_gates_unlinked_thread() {
    let (temp_dir, _guard) = setup_test_env();
    let snapshot = snapshot_file(&temp_dir);
    get_cmd(&temp_dir).args(["populate", "--snapshot"]).arg(&snapshot).assert().success();

    get_cmd(&temp_dir)
        .args(["intake", "1463668685993541697", "--reference-date", "2026-02-10", "--snapshot"])
        .arg(&snapshot)
        .assert()
        .success()
        .stdout(predicate::str::contains("FAIL"))
        .stdout(predicate::str::contains("notion     missing"))
        .stdout(predicate::str::contains("scope      ok"));
}

#[test]
fn test_intake_skips_ignored_thread() {
    let (temp_dir, _guard) = setup_test_env();
    get_cmd(&temp_dir)
        .args(["mapping", "set", "5", "--status", "ignored"])
        .assert()
        .success();

    get_cmd(&temp_dir)
        .args(["intake", "5", "some text"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Thread 5 is ignored; skipping."));
}

#[test]
fn test_processed_forget() {
    let (temp_dir, _guard) = setup_test_env();
    get_cmd(&temp_dir)
        .args(["mapping", "set", "5", "--status", "ignored"])
        .assert()
        .success();
    get_cmd(&temp_dir).args(["resolve", "5"]).assert().success();

    get_cmd(&temp_dir)
        .args(["processed", "forget", "5"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Forgot stored decision for thread 5."));

    get_cmd(&temp_dir)
        .args(["processed", "forget", "5"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("No stored decision"));
}

#[test]
fn test_mapping_set_pending_drops_stored_link() {
    let (temp_dir, _guard) = setup_test_env();
    get_cmd(&temp_dir)
        .args(["mapping", "set", "5", "--status", "approved", "--url", "https://notion.so/a"])
        .assert()
        .success();

    get_cmd(&temp_dir)
        .args(["mapping", "set", "5", "--status", "pending"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Warning").not());

    let csv = fs::read_to_string(temp_dir.path().join("mapping.csv")).unwrap();
    assert!(csv.contains("5,,,pending,"));
    assert!(!csv.contains("https://notion.so/a"));

    // Re-approving without --url has no link to fall back on
    get_cmd(&temp_dir)
        .args(["mapping", "set", "5", "--status", "approved"])
        .assert()
        .success()
        .stderr(predicate::str::contains("approved without a task url"));
}

#[test]
fn test_mapping_set_keeps_link_while_approved() {
    let (temp_dir, _guard) = setup_test_env();
    get_cmd(&temp_dir)
        .args(["mapping", "set", "6", "--status", "approved", "--url", "https://notion.so/b"])
        .assert()
        .success();
    get_cmd(&temp_dir)
        .args(["mapping", "set", "6", "--status", "approved", "--notes", "checked"])
        .assert()
        .success();

    let csv = fs::read_to_string(temp_dir.path().join("mapping.csv")).unwrap();
    assert!(csv.contains("6,,https://notion.so/b,approved,checked"));
}

#[test]
fn test_resolve_without_snapshot_is_quiet() {
    let (temp_dir, _guard) = setup_test_env();
    get_cmd(&temp_dir)
        .args(["mapping", "set", "8", "--status", "pending"])
        .assert()
        .success();

    get_cmd(&temp_dir)
        .args(["resolve", "8"])
        .env_remove("RUST_LOG")
        .assert()
        .success()
        .stdout(predicate::str::contains("Thread 8: pending"))
        .stderr(predicate::str::is_empty());
}
