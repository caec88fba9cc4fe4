use std::{path::PathBuf, process::Command};

use serde_json::Value;

fn demo(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../../demos")
        .join(name)
}

fn openbound(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_openbound"))
        .args(args)
        .env("RUST_LOG", "off")
        .output()
        .expect("failed to run openbound")
}

#[test]
fn inspect_lists_every_wall_state() {
    let map = demo("blinking_gate.json");
    let output = openbound(&["inspect", map.to_str().expect("utf-8 path")]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("blinking gate by openbound"));
    assert!(stdout.contains("wall states: 2"));
    assert!(stdout.contains("[0]: 1 regions"));
    assert!(stdout.contains("[1]: 2 regions"));
}

#[test]
fn simulate_stops_at_the_closed_gate() {
    let map = demo("blinking_gate.json");
    let script = demo("blinking_gate.toml");
    let config = demo("openbound.toml");
    let output = openbound(&[
        "simulate",
        map.to_str().expect("utf-8 path"),
        "--script",
        script.to_str().expect("utf-8 path"),
        "--config",
        config.to_str().expect("utf-8 path"),
        "--ticks",
        "30",
    ]);
    assert!(output.status.success());

    let summary: Value = serde_json::from_slice(&output.stdout).expect("JSON summary");
    assert_eq!(summary["ticks"], 30);
    assert_eq!(summary["position"], serde_json::json!([88.0, 56.0]));
    assert_eq!(summary["state"], "Idle");
    assert_eq!(summary["lives"], 1);
    assert_eq!(summary["deaths"], 0);
    assert_eq!(summary["paths_planned"], 1);
}

#[test]
fn missing_map_fails() {
    let output = openbound(&["inspect", "does-not-exist.json"]);
    assert!(!output.status.success());
}
