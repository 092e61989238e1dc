use std::io::Write;

use assert_cmd::Command;

fn config_file(body: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(body.as_bytes()).unwrap();
    file
}

fn vertexload(config: &tempfile::NamedTempFile) -> Command {
    let mut cmd = Command::cargo_bin("vertexload").unwrap();
    cmd.arg("--config").arg(config.path()).env_remove("RUST_LOG");
    cmd
}

#[test]
fn text_run_prints_total_time_and_throughput() {
    let config = config_file(
        "num_clients = 2\nnum_requests = 50\nnum_nodes = 500\ntx_sz = 100\nseed = 3\n",
    );
    let output = vertexload(&config).output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    let lines: Vec<_> = stdout.lines().collect();
    assert_eq!(lines.first(), Some(&"starting requests"));
    assert!(lines[lines.len() - 2].starts_with("Total time = "));
    assert!(lines[lines.len() - 1].starts_with("Throughput = "));
}

#[test]
fn flags_override_config_file() {
    let config = config_file("num_clients = 2\n");
    let output = vertexload(&config)
        .args(["--num-clients", "5", "--tx-sz", "20", "--print-config"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("num_clients = 5"));
    assert!(stdout.contains("tx_sz = 20"));
}

#[test]
fn json_run_reports_seeding_summary() {
    let config =
        config_file("num_clients = 3\nnum_requests = 20\nnum_nodes = 300\ntx_sz = 100\n");
    let output = vertexload(&config)
        .args(["--format", "json", "--log-level", "warn"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    let json_start = stdout.find('{').unwrap();
    let report: serde_json::Value = serde_json::from_str(&stdout[json_start..]).unwrap();
    assert_eq!(report["total_requests"], 60);
    assert_eq!(report["seeding"]["write_nodes"], 300);
    assert!(report.get("seed").is_none());
    assert_eq!(report["per_client_elapsed_secs"].as_array().unwrap().len(), 3);
}

#[test]
fn failing_worker_produces_no_throughput_line() {
    let config = config_file("num_clients = 2\nnum_requests = 10\nnum_nodes = 100\ntx_sz = 10\n");
    let output = vertexload(&config)
        .args(["--fail-client", "0", "--fail-after", "2", "--finish-timeout-ms", "300"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(!stdout.contains("Throughput"));
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("run incomplete: 1/2"));
}

#[test]
fn zero_tx_size_is_rejected() {
    let config = config_file("tx_sz = 0\n");
    vertexload(&config).assert().failure().code(1);
}
