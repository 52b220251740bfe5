use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

use super::harness::{GITHUB_PROJECT, ReleaseServer, package_name};

/// `caravel` with an empty configuration file and no colours.
fn caravel(config_dir: &TempDir) -> Command {
    let config = config_dir.path().join("config.toml");
    std::fs::write(&config, "").unwrap();

    let mut cmd = Command::cargo_bin("caravel").unwrap();
    cmd.env("CARAVEL_CONFIG", &config).env("NO_COLOR", "1").env_remove("RUST_LOG");
    cmd
}

fn server_args(host: &ReleaseServer) -> Vec<String> {
    vec![
        "--host".to_string(),
        host.host(),
        "--port".to_string(),
        host.port().to_string(),
        "--no-ssl".to_string(),
        "--project".to_string(),
        GITHUB_PROJECT.to_string(),
        "--ignore-cache".to_string(),
    ]
}

#[test]
fn test_help_lists_commands() {
    let dir = TempDir::new().unwrap();
    caravel(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("check"))
        .stdout(predicate::str::contains("update"));
}

#[test]
fn test_verbose_conflicts_with_quiet() {
    let dir = TempDir::new().unwrap();
    caravel(&dir).args(["-v", "-q", "check"]).assert().failure();
}

#[test]
fn test_check_without_current_version_fails() {
    let dir = TempDir::new().unwrap();
    caravel(&dir)
        .args(["check", "--project", "owner/tool"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("--current"));
}

#[test]
fn test_check_with_empty_host_fails_validation() {
    let dir = TempDir::new().unwrap();
    caravel(&dir)
        .args(["check", "--host", "", "--project", "owner/tool", "--current", "v1.0.0"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("host is required"));
}

#[test]
fn test_unreadable_config_fails() {
    let dir = TempDir::new().unwrap();
    let broken = dir.path().join("broken.toml");
    std::fs::write(&broken, "[provider\nhost = ").unwrap();

    caravel(&dir)
        .env("CARAVEL_CONFIG", &broken)
        .args(["check", "--current", "v1.0.0"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Failed to parse config"));
}

#[tokio::test]
async fn test_check_reports_available_update() {
    let host = ReleaseServer::start().await;
    host.mount_github_listing(&["v0.1.0", "v0.1.1", "v0.1.2"], &["checksums.txt"]).await;

    let args = server_args(&host);
    let dir = TempDir::new().unwrap();
    let assert = tokio::task::spawn_blocking(move || {
        caravel(&dir).arg("check").args(&args).args(["--current", "v0.1.1"]).assert()
    })
    .await
    .unwrap();

    assert
        .success()
        .stdout(predicate::str::contains("Update available: v0.1.1 -> v0.1.2"))
        .stdout(predicate::str::contains("Release v0.1.2"));
}

#[tokio::test]
async fn test_check_on_latest_version() {
    let host = ReleaseServer::start().await;
    host.mount_github_listing(&["v0.1.0", "v0.1.1"], &[]).await;

    let args = server_args(&host);
    let dir = TempDir::new().unwrap();
    let assert = tokio::task::spawn_blocking(move || {
        caravel(&dir).arg("check").args(&args).args(["--current", "v0.1.1"]).assert()
    })
    .await
    .unwrap();

    assert.success().stdout(predicate::str::contains("You are on the latest version (v0.1.1)"));
}

#[tokio::test]
async fn test_update_already_on_edge() {
    let host = ReleaseServer::start().await;
    host.mount_github_listing(&["v0.1.0", "v0.1.1"], &[&package_name("tar.gz"), "checksums.txt"])
        .await;

    let args = server_args(&host);
    let dir = TempDir::new().unwrap();
    let install = TempDir::new().unwrap();
    let install_path = install.path().to_path_buf();
    let assert = tokio::task::spawn_blocking(move || {
        caravel(&dir)
            .arg("update")
            .args(&args)
            .args(["--current", "v0.1.1", "--install-dir"])
            .arg(&install_path)
            .assert()
    })
    .await
    .unwrap();

    assert.success().stdout(predicate::str::contains("Already on the edge (v0.1.1)"));
    assert_eq!(std::fs::read_dir(install.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_update_failure_names_the_step() {
    let host = ReleaseServer::start().await;
    host.mount_github_listing(&["v0.1.0", "v0.1.2"], &[&package_name("tar.gz"), "checksums.txt"])
        .await;

    let args = server_args(&host);
    let dir = TempDir::new().unwrap();
    let install = TempDir::new().unwrap();
    let install_path = install.path().to_path_buf();
    let assert = tokio::task::spawn_blocking(move || {
        caravel(&dir)
            .arg("update")
            .args(&args)
            .args(["--current", "v0.1.0", "--install-dir"])
            .arg(&install_path)
            .assert()
    })
    .await
    .unwrap();

    assert.code(1).stderr(predicate::str::contains("Update failed during download"));
}
