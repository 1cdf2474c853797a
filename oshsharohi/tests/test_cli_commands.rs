mod common;

use common::{config_file, json_lines, path_str, run, stdout};

#[test]
fn version_json() {
    let output = run(&["version", "--format", "json"]);
    assert!(output.status.success());
    let lines = json_lines(&output);
    assert_eq!(lines[0]["name"], "oshsharohi");
    assert_eq!(lines[0]["version"], env!("CARGO_PKG_VERSION"));
}

#[test]
fn timeline_lists_default_cues() {
    let output = run(&["intro", "timeline"]);
    assert!(output.status.success());
    let text = stdout(&output);
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 10, "{text}");
    assert!(lines[0].contains("launch"));
    assert!(lines[1].contains("1500 ms") && lines[1].contains("remove_gate"));
    assert!(lines[9].contains("11800 ms") && lines[9].contains("release_scroll"));
}

#[test]
fn timeline_until_json() {
    let output = run(&["intro", "timeline", "--until", "logo-reveal", "--format", "json"]);
    assert!(output.status.success());
    let parsed: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    let entries = parsed["entries"].as_array().unwrap();
    let last = entries.last().unwrap();
    assert_eq!(last["cue"], "logo_reveal");
    assert_eq!(last["offset_ms"], 6800);
}

#[test]
fn gauge_ends_on_target() {
    let output = run(&["gauge", "--step-ms", "1000", "--format", "json"]);
    assert!(output.status.success());
    let readings = json_lines(&output);
    assert_eq!(readings.len(), 7);
    assert_eq!(readings[0]["displayed"], 0);
    let last = readings.last().unwrap();
    assert_eq!(last["elapsed_ms"], 6000);
    assert_eq!(last["displayed"], 120);
}

#[test]
fn gauge_rejects_zero_step() {
    let output = run(&["gauge", "--step-ms", "0"]);
    assert!(!output.status.success());
}

#[test]
fn validate_reports_each_file() {
    let good = config_file(common::FAST_INTRO);
    let bad = config_file("reveal:\n  threshold: 0\n");
    let output = run(&[
        "config",
        "validate",
        "--format",
        "json",
        path_str(good.path()),
        path_str(bad.path()),
    ]);
    assert!(!output.status.success());
    let reports = json_lines(&output);
    assert_eq!(reports.len(), 2);
    assert_eq!(reports[0]["valid"], true);
    assert_eq!(reports[1]["valid"], false);
}

#[test]
fn validate_strict_fails_on_warnings() {
    let file = config_file("intro:\n  gauge:\n    target: 200\n");
    let lenient = run(&["config", "validate", path_str(file.path())]);
    assert!(lenient.status.success(), "{}", stdout(&lenient));
    let strict = run(&["config", "validate", "--strict", path_str(file.path())]);
    assert!(!strict.status.success());
}

#[test]
fn navigate_cross_page() {
    let output = run(&["navigate", "team.html", "--current", "/index.html"]);
    assert!(output.status.success());
    let text = stdout(&output);
    assert!(text.contains("navigated to team.html"), "{text}");
    assert!(text.contains("page-exit"), "{text}");
}

#[test]
fn navigate_same_page_stays() {
    let output = run(&["navigate", "index.html", "--current", "/"]);
    assert!(output.status.success());
    let text = stdout(&output);
    assert!(!text.contains("navigated to"), "{text}");
    assert!(text.contains("page-flash-0"), "{text}");
}

#[test]
fn navigate_external_is_left_alone() {
    let output = run(&["navigate", "https://example.com/"]);
    assert!(output.status.success());
    assert!(stdout(&output).contains("not intercepted"));
}

#[test]
fn intro_run_writes_session_and_skips_second_time() {
    let config = config_file(common::FAST_INTRO);
    let dir = tempfile::tempdir().unwrap();
    let session = dir.path().join("session.json");

    let first = run(&[
        "intro",
        "run",
        "--config",
        path_str(config.path()),
        "--session-file",
        path_str(&session),
        "--seed",
        "7",
        "--journal",
    ]);
    assert!(first.status.success(), "{}", String::from_utf8_lossy(&first.stderr));
    let journal = json_lines(&first);
    assert!(!journal.is_empty());
    let removed = journal.iter().any(|line| {
        line["instruction"]["op"] == "remove" && line["instruction"]["target"] == "intro-overlay"
    });
    assert!(removed, "intro overlay never removed");

    let session_json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&session).unwrap()).unwrap();
    assert_eq!(session_json["oshsharohi_intro_seen"], "true");

    let second = run(&[
        "intro",
        "run",
        "--config",
        path_str(config.path()),
        "--session-file",
        path_str(&session),
        "--journal",
    ]);
    assert!(second.status.success());
    let journal = json_lines(&second);
    assert!(journal.iter().all(|line| line["instruction"]["op"] != "append"));
}

#[test]
fn completions_bash() {
    let output = run(&["completions", "bash"]);
    assert!(output.status.success());
    assert!(stdout(&output).contains("oshsharohi"));
}
