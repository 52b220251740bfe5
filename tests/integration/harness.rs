//! Local release host used by the integration tests.

use caravel::provider::{GitHubProvider, GitLabProvider, ProviderConfig};
use caravel::release::ReleaseCache;
use caravel::test_utils::fixtures::{github_listing, gitlab_listing};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const GITHUB_PROJECT: &str = "owner/tool";
pub const GITLAB_PROJECT: &str = "group/tool";
pub const GITHUB_LISTING_PATH: &str = "/repos/owner/tool/releases";
pub const GITLAB_LISTING_PATH: &str = "/api/v4/projects/group%2Ftool/releases";

/// Mock release host plus a private cache directory.
pub struct ReleaseServer {
    pub server: MockServer,
    pub cache_dir: TempDir,
}

impl ReleaseServer {
    pub async fn start() -> Self {
        caravel::test_utils::init_test_logging(None);
        Self {
            server: MockServer::start().await,
            cache_dir: TempDir::new().unwrap(),
        }
    }

    pub fn uri(&self) -> String {
        self.server.uri()
    }

    pub fn host(&self) -> String {
        self.server.address().ip().to_string()
    }

    pub fn port(&self) -> u16 {
        self.server.address().port()
    }

    pub fn provider_config(&self, project: &str) -> ProviderConfig {
        ProviderConfig::new(self.host(), project).with_ssl(false).with_port(self.port())
    }

    pub fn cache(&self) -> ReleaseCache {
        ReleaseCache::in_dir(self.cache_dir.path())
    }

    pub fn github(&self) -> GitHubProvider {
        GitHubProvider::new(self.provider_config(GITHUB_PROJECT)).with_cache(self.cache())
    }

    pub fn gitlab(&self) -> GitLabProvider {
        GitLabProvider::new(self.provider_config(GITLAB_PROJECT)).with_cache(self.cache())
    }

    /// Serve a GitHub listing of `tags`, each publishing `assets`.
    pub async fn mount_github_listing(&self, tags: &[&str], assets: &[&str]) {
        Mock::given(method("GET"))
            .and(path(GITHUB_LISTING_PATH))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(github_listing(&self.uri(), tags, assets)),
            )
            .mount(&self.server)
            .await;
    }

    /// Serve a GitLab listing of `tags`, each publishing `assets`.
    pub async fn mount_gitlab_listing(&self, tags: &[&str], assets: &[&str]) {
        Mock::given(method("GET"))
            .and(path(GITLAB_LISTING_PATH))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(gitlab_listing(&self.uri(), tags, assets)),
            )
            .mount(&self.server)
            .await;
    }

    /// Serve `body` as asset `name` of release `tag`.
    pub async fn mount_asset(&self, tag: &str, name: &str, body: Vec<u8>) {
        Mock::given(method("GET"))
            .and(path(format!("/download/{tag}/{name}")))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(body))
            .mount(&self.server)
            .await;
    }

    /// Paths of every request received so far.
    pub async fn requested_paths(&self) -> Vec<String> {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .map(|request| request.url.path().to_string())
            .collect()
    }
}

/// Package name for the running OS, as a release would publish it.
pub fn package_name(extension: &str) -> String {
    format!("tool_{}_amd64.{extension}", caravel::upgrade::current_os())
}
