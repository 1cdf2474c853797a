//! Shared integration-test helpers: config fixtures and a one-shot runner
//! for the `oshsharohi` binary.

#![allow(dead_code)]

use std::io::Write;
use std::path::Path;
use std::process::{Command, Output};

use tempfile::NamedTempFile;

/// Writes `yaml` to a fresh temporary `.yaml` file.
#[allow(clippy::missing_panics_doc)]
pub fn config_file(yaml: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(".yaml")
        .tempfile()
        .expect("failed to create temp config");
    file.write_all(yaml.as_bytes())
        .expect("failed to write temp config");
    file
}

/// A configuration that shortens every intro cue so CLI runs finish fast.
pub const FAST_INTRO: &str = r"
intro:
  audio_fade_interval_ms: 5
  timeline:
    launch_ms: 0
    remove_gate_ms: 50
    engulf_ms: 100
    logo_reveal_ms: 150
    line_reveal_ms: 160
    fade_out_ms: 200
    remove_ms: 250
    release_scroll_ms: 260
    shake_ms: 20
  gauge:
    duration_ms: 90
";

/// Runs the binary to completion with `args`, logging silenced.
#[allow(clippy::missing_panics_doc)]
pub fn run(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_oshsharohi"))
        .args(args)
        .arg("--quiet")
        .env_remove("OSHSHAROHI_CONFIG")
        .env_remove("OSHSHAROHI_LOG_LEVEL")
        .output()
        .expect("failed to spawn oshsharohi")
}

/// Stdout as text.
pub fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

/// Stdout parsed as one JSON value per non-empty line.
#[allow(clippy::missing_panics_doc)]
pub fn json_lines(output: &Output) -> Vec<serde_json::Value> {
    stdout(output)
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| serde_json::from_str(l).unwrap_or_else(|e| panic!("bad JSON line {l:?}: {e}")))
        .collect()
}

/// `path` as `&str`.
#[allow(clippy::missing_panics_doc)]
pub fn path_str(path: &Path) -> &str {
    path.to_str().expect("non-UTF-8 path")
}
