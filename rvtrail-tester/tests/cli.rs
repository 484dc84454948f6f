use std::process::Command;

fn temp_path(label: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!(
        "rvtrail-cli-{label}-{}",
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos()
    ))
}

#[test]
fn cli_writes_json_report_with_silent_narrator() {
    let exe = env!("CARGO_BIN_EXE_rvtrail-tester");
    let output_path = temp_path("json");
    let status = Command::new(exe)
        .args([
            "--narrator",
            "silent",
            "--iterations",
            "1",
            "--seeds",
            "7",
            "--cities",
            "chengdu",
            "--strategies",
            "sprinter",
            "--report",
            "json",
            "--output",
        ])
        .arg(&output_path)
        .status()
        .expect("run cli");
    assert!(status.success());
    let content = std::fs::read_to_string(&output_path).expect("read output");
    let report: serde_json::Value = serde_json::from_str(&content).expect("valid json");
    assert_eq!(report["records"].as_array().map(Vec::len), Some(1));
    assert_eq!(report["records"][0]["city"], "chengdu");
    assert_eq!(report["violations"], 0);
    let _ = std::fs::remove_file(output_path);
}

#[test]
fn cli_markdown_report_replays_a_run_code() {
    let exe = env!("CARGO_BIN_EXE_rvtrail-tester");
    let output_path = temp_path("md");
    let status = Command::new(exe)
        .args([
            "--seeds",
            "GZ-DIESEL42",
            "--strategies",
            "balanced",
            "--iterations",
            "1",
            "--max-days",
            "30",
            "--report",
            "markdown",
            "--output",
        ])
        .arg(&output_path)
        .status()
        .expect("run cli");
    assert!(status.success());
    let content = std::fs::read_to_string(&output_path).expect("read output");
    assert!(content.contains("# RV Trail Balance Results"));
    assert!(content.contains("(GZ-DIESEL42)"));
    let _ = std::fs::remove_file(output_path);
}

#[test]
fn cli_rejects_a_malformed_seed() {
    let exe = env!("CARGO_BIN_EXE_rvtrail-tester");
    let output = Command::new(exe)
        .args(["--seeds", "not-a-seed", "--iterations", "1"])
        .output()
        .expect("run cli");
    assert!(!output.status.success());
}
