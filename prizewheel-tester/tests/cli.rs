use std::process::Command;

fn temp_path(label: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!(
        "prizewheel-cli-{label}-{}",
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos()
    ))
}

#[test]
fn cli_list_scenarios_writes_output() {
    let exe = env!("CARGO_BIN_EXE_prizewheel-tester");
    let output_path = temp_path("list");
    let status = Command::new(exe)
        .args(["--list-scenarios", "--output"])
        .arg(&output_path)
        .status()
        .expect("run cli");
    assert!(status.success());
    let content = std::fs::read_to_string(output_path).expect("read output");
    assert!(content.contains("Available scenarios"));
    assert!(content.contains("mode-reset"));
}

#[test]
fn cli_runs_all_scenarios_with_json_report() {
    let exe = env!("CARGO_BIN_EXE_prizewheel-tester");
    let output_path = temp_path("run");
    let output = Command::new(exe)
        .args([
            "--report",
            "json",
            "--scenarios",
            "all",
            "--iterations",
            "2",
            "--seeds",
            "1,friday-stream",
            "--output",
        ])
        .arg(&output_path)
        .output()
        .expect("run cli");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Prize Wheel Logic Tester"));

    let report = std::fs::read_to_string(output_path).expect("read report");
    let parsed: serde_json::Value = serde_json::from_str(&report).expect("json report");
    let runs = parsed.as_array().expect("array of runs");
    assert_eq!(runs.len(), 8 * 2);
    assert!(runs.iter().all(|run| run["passed"] == true));
}

#[test]
fn cli_rejects_invalid_config() {
    let exe = env!("CARGO_BIN_EXE_prizewheel-tester");
    let config_path = temp_path("config");
    std::fs::write(&config_path, r#"{ "default_range_max": 5000 }"#).expect("write config");
    let output = Command::new(exe)
        .args(["--config"])
        .arg(&config_path)
        .output()
        .expect("run cli");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("invalid wheel config"));
}
