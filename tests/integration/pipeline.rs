use std::path::Path;

use caravel::core::UpdateError;
use caravel::provider::GitHubProvider;
use caravel::test_utils::fixtures::{ArchiveEntry, checksum_manifest, write_tar_gz, write_zip};
use caravel::upgrade::{PipelineStep, UpdateOutcome, UpdatePipeline};
use caravel::{PipelineError, UpdateConf};
use tempfile::TempDir;

use super::harness::{GITHUB_LISTING_PATH, ReleaseServer, package_name};

const TAGS: &[&str] = &["v0.1.0", "v0.1.1", "v0.1.2"];

/// Workspace for one pipeline run: install target and staging root.
struct Workspace {
    install: TempDir,
    staging: TempDir,
}

impl Workspace {
    fn new() -> Self {
        Self {
            install: TempDir::new().unwrap(),
            staging: TempDir::new().unwrap(),
        }
    }

    async fn run(&self, provider: &GitHubProvider, current: &str) -> Result<UpdateOutcome, PipelineError> {
        let client = reqwest::Client::new();
        UpdatePipeline::new(&client, provider, current)
            .ignore_cache(true)
            .install_dir(self.install.path())
            .staging_root(self.staging.path())
            .process_name("tool")
            .run()
            .await
    }

    fn installed(&self) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(self.install.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    fn assert_staging_removed(&self) {
        assert_eq!(std::fs::read_dir(self.staging.path()).unwrap().count(), 0);
    }
}

fn build_package(dir: &Path, name: &str, entries: &[ArchiveEntry]) -> Vec<u8> {
    let path = dir.join(name);
    if name.ends_with(".zip") {
        write_zip(&path, entries);
    } else {
        write_tar_gz(&path, entries);
    }
    std::fs::read(path).unwrap()
}

/// Publish `package` plus a manifest for it under release `tag`.
async fn publish(host: &ReleaseServer, tag: &str, name: &str, package: Vec<u8>, manifest: String) {
    host.mount_asset(tag, name, package).await;
    host.mount_asset(tag, "checksums.txt", manifest.into_bytes()).await;
}

fn payload() -> Vec<ArchiveEntry> {
    vec![
        ArchiveEntry::dir("share"),
        ArchiveEntry::file("tool", b"#!/bin/sh\necho v0.1.2\n", 0o755),
        ArchiveEntry::file("share/README.md", b"docs", 0o644),
    ]
}

#[tokio::test]
async fn test_updates_to_latest_release() {
    let host = ReleaseServer::start().await;
    let package = package_name("tar.gz");
    host.mount_github_listing(TAGS, &[&package, "checksums.txt"]).await;

    let scratch = TempDir::new().unwrap();
    let bytes = build_package(scratch.path(), &package, &payload());
    let manifest = checksum_manifest(&[
        ("other.tar.gz", b"unrelated".as_slice()),
        (package.as_str(), bytes.as_slice()),
    ]);
    publish(&host, "v0.1.2", &package, bytes, manifest).await;

    let workspace = Workspace::new();
    let outcome = workspace.run(&host.github(), "v0.1.1").await.unwrap();

    match outcome {
        UpdateOutcome::Updated(release) => assert_eq!(release.name, "v0.1.2"),
        UpdateOutcome::AlreadyOnEdge => panic!("expected an update"),
    }
    assert_eq!(workspace.installed(), ["share", "tool"]);
    assert_eq!(
        std::fs::read_to_string(workspace.install.path().join("tool")).unwrap(),
        "#!/bin/sh\necho v0.1.2\n"
    );
    assert_eq!(
        std::fs::read_to_string(workspace.install.path().join("share/README.md")).unwrap(),
        "docs"
    );
    workspace.assert_staging_removed();
}

#[tokio::test]
async fn test_zip_package_is_installed() {
    let host = ReleaseServer::start().await;
    let package = package_name("zip");
    host.mount_github_listing(TAGS, &[&package, "checksums.txt"]).await;

    let scratch = TempDir::new().unwrap();
    let bytes = build_package(scratch.path(), &package, &payload());
    let manifest = checksum_manifest(&[(package.as_str(), bytes.as_slice())]);
    publish(&host, "v0.1.2", &package, bytes, manifest).await;

    let workspace = Workspace::new();
    assert!(workspace.run(&host.github(), "v0.1.0").await.unwrap().is_updated());
    assert_eq!(workspace.installed(), ["share", "tool"]);
}

#[tokio::test]
async fn test_already_on_edge_downloads_nothing() {
    let host = ReleaseServer::start().await;
    let package = package_name("tar.gz");
    host.mount_github_listing(TAGS, &[&package, "checksums.txt"]).await;

    let workspace = Workspace::new();
    let outcome = workspace.run(&host.github(), "v0.1.2").await.unwrap();

    assert_eq!(outcome, UpdateOutcome::AlreadyOnEdge);
    assert_eq!(host.requested_paths().await, [GITHUB_LISTING_PATH]);
    assert!(workspace.installed().is_empty());
    workspace.assert_staging_removed();
}

#[tokio::test]
async fn test_checksum_mismatch_fails_verify_and_installs_nothing() {
    let host = ReleaseServer::start().await;
    let package = package_name("tar.gz");
    host.mount_github_listing(TAGS, &[&package, "checksums.txt"]).await;

    let scratch = TempDir::new().unwrap();
    let bytes = build_package(scratch.path(), &package, &payload());
    let manifest = checksum_manifest(&[(package.as_str(), b"tampered".as_slice())]);
    publish(&host, "v0.1.2", &package, bytes, manifest).await;

    let workspace = Workspace::new();
    let err = workspace.run(&host.github(), "v0.1.1").await.unwrap_err();

    assert_eq!(err.step, PipelineStep::Verify);
    assert!(matches!(err.source, UpdateError::ChecksumMismatch { .. }));
    assert!(workspace.installed().is_empty());
    workspace.assert_staging_removed();
}

#[tokio::test]
async fn test_manifest_without_package_fails_verify() {
    let host = ReleaseServer::start().await;
    let package = package_name("tar.gz");
    host.mount_github_listing(TAGS, &[&package, "checksums.txt"]).await;

    let scratch = TempDir::new().unwrap();
    let bytes = build_package(scratch.path(), &package, &payload());
    let manifest = checksum_manifest(&[("someone-else.tar.gz", b"bytes".as_slice())]);
    publish(&host, "v0.1.2", &package, bytes, manifest).await;

    let workspace = Workspace::new();
    let err = workspace.run(&host.github(), "v0.1.1").await.unwrap_err();

    assert_eq!(err.step, PipelineStep::Verify);
    assert!(workspace.installed().is_empty());
}

#[tokio::test]
async fn test_path_traversal_fails_extract() {
    let host = ReleaseServer::start().await;
    let package = package_name("zip");
    host.mount_github_listing(TAGS, &[&package, "checksums.txt"]).await;

    let scratch = TempDir::new().unwrap();
    let entries = vec![ArchiveEntry::file("tool", b"ok", 0o755), ArchiveEntry::file("../../evil", b"x", 0o644)];
    let bytes = build_package(scratch.path(), &package, &entries);
    let manifest = checksum_manifest(&[(package.as_str(), bytes.as_slice())]);
    publish(&host, "v0.1.2", &package, bytes, manifest).await;

    let workspace = Workspace::new();
    let err = workspace.run(&host.github(), "v0.1.1").await.unwrap_err();

    assert_eq!(err.step, PipelineStep::Extract);
    assert!(matches!(err.source, UpdateError::PathTraversal { .. }));
    assert!(workspace.installed().is_empty());
    assert!(!workspace.staging.path().parent().unwrap().join("evil").exists());
    workspace.assert_staging_removed();
}

#[tokio::test]
async fn test_package_cannot_replace_staged_files() {
    let host = ReleaseServer::start().await;
    let package = package_name("tar.gz");
    host.mount_github_listing(TAGS, &[&package, "checksums.txt"]).await;

    let scratch = TempDir::new().unwrap();
    let genuine = build_package(scratch.path(), &package, &payload());
    let manifest = checksum_manifest(&[(package.as_str(), genuine.as_slice())]);

    let forged = checksum_manifest(&[(package.as_str(), b"decoy".as_slice())]);
    let tampered_dir = TempDir::new().unwrap();
    let tampered = build_package(
        tampered_dir.path(),
        &package,
        &[
            ArchiveEntry::file("tool", b"#!/bin/sh\necho tampered\n", 0o755),
            ArchiveEntry::file("checksums.txt", forged.as_bytes(), 0o644),
            ArchiveEntry::file(&package, b"decoy", 0o644),
        ],
    );
    publish(&host, "v0.1.2", &package, tampered, manifest).await;

    let workspace = Workspace::new();
    let err = workspace.run(&host.github(), "v0.1.1").await.unwrap_err();

    assert_eq!(err.step, PipelineStep::Extract);
    assert!(matches!(err.source, UpdateError::StagedFileOverwrite { .. }));
    assert!(workspace.installed().is_empty());
    workspace.assert_staging_removed();
}

#[tokio::test]
async fn test_missing_package_fails_download() {
    let host = ReleaseServer::start().await;
    let package = package_name("tar.gz");
    host.mount_github_listing(TAGS, &[&package, "checksums.txt"]).await;

    let workspace = Workspace::new();
    let err = workspace.run(&host.github(), "v0.1.1").await.unwrap_err();

    assert_eq!(err.step, PipelineStep::Download);
    assert!(matches!(err.source, UpdateError::HttpStatus { status: 404, .. }));
    assert_eq!(err.to_string(), "Update failed during download");
    workspace.assert_staging_removed();
}

#[tokio::test]
async fn test_listing_failure_fails_check() {
    let host = ReleaseServer::start().await;

    let workspace = Workspace::new();
    let err = workspace.run(&host.github(), "v0.1.1").await.unwrap_err();

    assert_eq!(err.step, PipelineStep::Check);
    assert!(matches!(err.source, UpdateError::HttpStatus { status: 404, .. }));
}

#[tokio::test]
async fn test_facade_update_with_install_dir() {
    let host = ReleaseServer::start().await;
    let package = package_name("tar.gz");
    host.mount_github_listing(TAGS, &[&package, "checksums.txt"]).await;

    let scratch = TempDir::new().unwrap();
    let bytes = build_package(scratch.path(), &package, &payload());
    let manifest = checksum_manifest(&[(package.as_str(), bytes.as_slice())]);
    publish(&host, "v0.1.2", &package, bytes, manifest).await;

    let install = TempDir::new().unwrap();
    let mut conf = UpdateConf::new("tool", "v0.1.1", host.github());
    conf.ignore_cache = true;
    conf.install_dir = Some(install.path().to_path_buf());

    let release = caravel::check_updates(&conf).await.unwrap().unwrap();
    assert_eq!(release.name, "v0.1.2");

    let outcome = caravel::update(&conf).await.unwrap();
    assert!(outcome.is_updated());
    assert!(install.path().join("tool").is_file());
}

#[tokio::test]
async fn test_facade_requires_version_and_process_name() {
    let host = ReleaseServer::start().await;

    let conf = UpdateConf::new("tool", "", host.github());
    let err = caravel::check_updates(&conf).await.unwrap_err();
    assert!(matches!(err, UpdateError::Validation { .. }));

    let conf = UpdateConf::new("", "v0.1.1", host.github());
    let err = caravel::update(&conf).await.unwrap_err();
    assert_eq!(err.step, PipelineStep::Check);
    assert!(host.requested_paths().await.is_empty());
}
