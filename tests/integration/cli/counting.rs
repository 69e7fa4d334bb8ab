//! `japa mark`, `status` and `page` against a file store.

use std::fs;

use predicates::prelude::*;

use crate::fixtures::cli::CliFixture;

#[test]
fn status_on_fresh_store() {
    let fx = CliFixture::new();
    let status = fx.json(&["status"]);

    assert_eq!(status["done_count"], 0);
    assert_eq!(status["malas"], 0);
    assert_eq!(status["ready"], false);
    assert_eq!(status["resume_cursor"], 0);
    assert!(!fx.store_path().exists());
}

#[test]
fn invalid_env_overrides_are_reported() {
    let fx = CliFixture::new();
    fx.japa()
        .env("JAPA_DEBOUNCE_MS", "soon")
        .env("JAPA_LISTEN_ADDR", "nowhere")
        .args(["status", "--json"])
        .assert()
        .success()
        .stderr(predicate::str::contains("invalid JAPA_DEBOUNCE_MS \"soon\""))
        .stderr(predicate::str::contains("invalid JAPA_LISTEN_ADDR \"nowhere\""));
}

#[test]
fn mark_then_status() {
    let fx = CliFixture::new();

    let marked = fx.json(&["mark", "5", "6", "5"]);
    assert_eq!(marked["marked"], serde_json::json!([5, 6]));
    assert_eq!(marked["skipped"], serde_json::json!([5]));
    assert_eq!(marked["done_count"], 2);

    let again = fx.json(&["done", "6"]);
    assert_eq!(again["marked"], serde_json::json!([]));
    assert_eq!(again["skipped"], serde_json::json!([6]));

    let status = fx.json(&["status"]);
    assert_eq!(status["done_count"], 2);
    assert_eq!(status["ready"], true);
    assert_eq!(status["resume_cursor"], 2);

    let raw: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(fx.store_path()).unwrap()).unwrap();
    assert_eq!(raw.as_object().unwrap().len(), 2);
}

#[test]
fn malas_count_full_rounds() {
    let fx = CliFixture::new();
    let ids: Vec<String> = (0..108).map(|i| i.to_string()).collect();
    let mut args = vec!["mark"];
    args.extend(ids.iter().map(String::as_str));

    let marked = fx.json(&args);
    assert_eq!(marked["done_count"], 108);
    assert_eq!(marked["malas"], 1);
}

#[test]
fn mark_rejects_out_of_range_ids() {
    let fx = CliFixture::new();
    fx.japa()
        .args(["mark", "1405"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("1405"));
    assert!(!fx.store_path().exists());
}

#[test]
fn malformed_store_entries_are_skipped() {
    let fx = CliFixture::new();
    fs::create_dir_all(fx.data_dir()).unwrap();
    fs::write(
        fx.store_path(),
        r#"{"a":{"value":3},"b":{"text":4},"c":{"value":"x"},"d":{"value":9999}}"#,
    )
    .unwrap();

    let status = fx.json(&["status"]);
    assert_eq!(status["done_count"], 2);
    assert_eq!(status["rejected"], 2);
}

#[test]
fn local_page_shows_done_beads() {
    let fx = CliFixture::new();
    fx.json(&["mark", "1400"]);

    let page = fx.json(&["page", "--local", "--cursor", "1350"]);
    assert_eq!(page["cursor"], 1350);
    assert!(page["next_cursor"].is_null());
    assert_eq!(page["previous_cursor"], 1242);

    let beads = page["model"]["pages"][0]["beads"].as_array().unwrap();
    assert_eq!(beads.len(), 55);
    let done: Vec<&serde_json::Value> = beads
        .iter()
        .filter(|bead| bead["is_disabled"] == true)
        .collect();
    assert_eq!(done.len(), 1);
    assert_eq!(done[0]["id"], 1400);
}

#[test]
fn human_page_output() {
    let fx = CliFixture::new();
    fx.japa()
        .args(["page", "--local", "--cursor", "100"])
        .assert()
        .success()
        .stdout(predicate::str::contains("108*"))
        .stdout(predicate::str::contains("next: --cursor 208"));
}

#[test]
fn page_reports_unreachable_server() {
    let fx = CliFixture::new();
    fx.japa()
        .args(["page", "--cursor", "0"])
        .env("JAPA_BASE_URL", "http://127.0.0.1:9")
        .assert()
        .failure();
}

#[test]
fn config_init_and_show() {
    let fx = CliFixture::new();

    let init = fx.json(&["config", "init"]);
    assert_eq!(init["written"], true);
    let path = fx.config_dir().join("config.toml");
    assert!(path.exists());
    assert!(fs::read_to_string(&path).unwrap().contains("debounce_ms = 300"));

    let again = fx.json(&["config", "init"]);
    assert_eq!(again["written"], false);

    // Environment overrides the file.
    let shown = fx.json(&["config", "show"]);
    assert_eq!(shown["session"]["debounce_ms"], 50);
    assert_eq!(shown["client"]["max_attempts"], 3);
}
