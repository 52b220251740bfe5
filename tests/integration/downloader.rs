use std::time::Duration;

use caravel::core::UpdateError;
use caravel::release::{Asset, Release};
use caravel::upgrade::download::{download_assets_for, download_file};
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

use super::harness::ReleaseServer;

fn release(host: &ReleaseServer, names: &[&str]) -> Release {
    Release {
        name: "v1.0.0".to_string(),
        assets: names
            .iter()
            .map(|name| Asset::new(*name, format!("{}/download/v1.0.0/{name}", host.uri())))
            .collect(),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_downloads_package_and_manifest() {
    let host = ReleaseServer::start().await;
    host.mount_asset("v1.0.0", "tool_Linux_x86_64.tar.gz", b"package bytes".to_vec()).await;
    host.mount_asset("v1.0.0", "checksums.txt", b"abc tool_Linux_x86_64.tar.gz\n".to_vec()).await;

    let staging = TempDir::new().unwrap();
    let release = release(&host, &["tool_Darwin_arm64.tar.gz", "tool_Linux_x86_64.tar.gz", "checksums.txt"]);

    let client = reqwest::Client::new();
    let assets = download_assets_for(&client, &release, staging.path(), Duration::from_secs(10), "linux")
        .await
        .unwrap();

    assert_eq!(assets.package, staging.path().join("tool_Linux_x86_64.tar.gz"));
    assert_eq!(std::fs::read(&assets.package).unwrap(), b"package bytes");
    assert_eq!(std::fs::read_to_string(&assets.manifest).unwrap(), "abc tool_Linux_x86_64.tar.gz\n");
}

#[tokio::test]
async fn test_no_asset_for_os() {
    let host = ReleaseServer::start().await;
    let staging = TempDir::new().unwrap();
    let release = release(&host, &["tool_windows.zip", "checksums.txt"]);

    let client = reqwest::Client::new();
    let err = download_assets_for(&client, &release, staging.path(), Duration::from_secs(10), "linux")
        .await
        .unwrap_err();
    assert!(matches!(err, UpdateError::NoCompatibleAsset { .. }));
    assert!(host.requested_paths().await.is_empty());
}

#[tokio::test]
async fn test_missing_manifest_asset() {
    let host = ReleaseServer::start().await;
    let staging = TempDir::new().unwrap();
    let release = release(&host, &["tool_linux.tar.gz"]);

    let client = reqwest::Client::new();
    let err = download_assets_for(&client, &release, staging.path(), Duration::from_secs(10), "linux")
        .await
        .unwrap_err();
    match err {
        UpdateError::ChecksumAssetMissing {
            name,
        } => assert_eq!(name, "checksums.txt"),
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_http_error_leaves_no_file() {
    let host = ReleaseServer::start().await;
    Mock::given(method("GET"))
        .and(path("/download/v1.0.0/missing.tar.gz"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&host.server)
        .await;

    let staging = TempDir::new().unwrap();
    let dest = staging.path().join("missing.tar.gz");
    let client = reqwest::Client::new();
    let url = format!("{}/download/v1.0.0/missing.tar.gz", host.uri());

    match download_file(&client, &url, &dest, Duration::from_secs(10)).await.unwrap_err() {
        UpdateError::HttpStatus {
            status,
            url: failed,
            ..
        } => {
            assert_eq!(status, 404);
            assert_eq!(failed, url);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(!dest.exists());
}

#[tokio::test]
async fn test_slow_download_times_out() {
    let host = ReleaseServer::start().await;
    Mock::given(method("GET"))
        .and(path("/download/v1.0.0/slow.tar.gz"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"late".to_vec()).set_delay(Duration::from_secs(5)))
        .mount(&host.server)
        .await;

    let staging = TempDir::new().unwrap();
    let dest = staging.path().join("slow.tar.gz");
    let client = reqwest::Client::new();
    let url = format!("{}/download/v1.0.0/slow.tar.gz", host.uri());

    let err = download_file(&client, &url, &dest, Duration::from_millis(200)).await.unwrap_err();
    assert!(matches!(err, UpdateError::Network { .. }));
    assert!(!dest.exists());
}

/// Serve one response that promises `declared` bytes but sends only `body`.
async fn truncated_body_server(declared: usize, body: &'static [u8]) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut request = Vec::new();
        let mut buf = [0u8; 1024];
        while !request.windows(4).any(|w| w == b"\r\n\r\n") {
            let n = socket.read(&mut buf).await.unwrap();
            if n == 0 {
                return;
            }
            request.extend_from_slice(&buf[..n]);
        }

        let head = format!("HTTP/1.1 200 OK\r\nContent-Length: {declared}\r\n\r\n");
        socket.write_all(head.as_bytes()).await.unwrap();
        socket.write_all(body).await.unwrap();
        socket.flush().await.unwrap();
        socket.shutdown().await.unwrap();
    });

    format!("http://{addr}/download/v1.0.0/cut.tar.gz")
}

#[tokio::test]
async fn test_interrupted_body_removes_partial_file() {
    let url = truncated_body_server(4096, b"only the first bytes").await;

    let staging = TempDir::new().unwrap();
    let dest = staging.path().join("cut.tar.gz");
    let client = reqwest::Client::new();

    let err = download_file(&client, &url, &dest, Duration::from_secs(10)).await.unwrap_err();
    assert!(matches!(err, UpdateError::Network { .. }), "unexpected error: {err}");
    assert!(!dest.exists());
}
