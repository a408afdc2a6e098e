use std::{
    fs,
    path::{Path, PathBuf},
    process::{Command, Output},
};

fn write_config(dir: &Path, mode: &str) -> PathBuf {
    let config_path = dir.join("config.json");
    let project = dir.join("project");
    fs::create_dir_all(&project).expect("create project dir");
    fs::write(
        &config_path,
        serde_json::json!({
            "mode": mode,
            "language": "en",
            "environment": { "path": project },
            "nginx": {
                "domain": "teddy.example.com",
                "https_mode": "self_signed",
                "security": {
                    "type": "basic_auth",
                    "allowed_ips": ["192.168.1.0/24"],
                    "auth_bypass_ips": []
                }
            }
        })
        .to_string(),
    )
    .expect("write config");
    config_path
}

fn run_starter(args: &[&str]) -> Output {
    Command::new(PathBuf::from(env!("CARGO_BIN_EXE_teddycloud-starter")))
        .args(args)
        .env("NO_CLEAR_SCREEN", "1")
        .env_remove("RUST_LOG")
        .output()
        .expect("run teddycloud-starter")
}

#[test]
fn starter_show_prints_configuration() {
    let temp = tempfile::tempdir().expect("temp dir");
    let config_path = write_config(temp.path(), "nginx");
    let output = run_starter(&["--config", config_path.to_str().expect("utf8 path"), "show"]);

    assert!(
        output.status.success(),
        "command should succeed, stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("teddy.example.com"), "stdout: {stdout}");
    assert!(stdout.contains("basic_auth"), "stdout: {stdout}");
}

#[test]
fn starter_modify_requires_nginx_mode() {
    let temp = tempfile::tempdir().expect("temp dir");
    let config_path = write_config(temp.path(), "direct");
    let output = run_starter(&[
        "--config",
        config_path.to_str().expect("utf8 path"),
        "modify",
        "https",
    ]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("only available for nginx mode"), "stderr: {stderr}");
}

#[test]
fn starter_rejects_malformed_config() {
    let temp = tempfile::tempdir().expect("temp dir");
    let config_path = temp.path().join("config.json");
    fs::write(&config_path, "{ not json").expect("write config");
    let output = run_starter(&["--config", config_path.to_str().expect("utf8 path"), "show"]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Failed to load configuration"), "stderr: {stderr}");
}

#[test]
fn starter_regenerate_writes_artifacts() {
    let temp = tempfile::tempdir().expect("temp dir");
    let config_path = write_config(temp.path(), "nginx");
    let output = run_starter(&[
        "--config",
        config_path.to_str().expect("utf8 path"),
        "regenerate",
    ]);

    assert!(
        output.status.success(),
        "command should succeed, stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let data = temp.path().join("project").join("data");
    let compose = fs::read_to_string(data.join("docker-compose.yml")).expect("compose written");
    assert!(compose.contains("nginx-edge"));
    let proxy = fs::read_to_string(data.join("configurations").join("nginx-edge.conf"))
        .expect("proxy config written");
    assert!(proxy.contains("server_name teddy.example.com"));
    assert!(proxy.contains("192.168.1.0/24"));
}
