//! Configuration for GitHub API connections.
use secrecy::SecretString;

/// Default REST API root for github.com.
pub const DEFAULT_API_URL: &str = "https://api.github.com";
/// Page size used when listing releases.
pub const DEFAULT_PAGE_SIZE: u8 = 100;
/// API version pinned in every request.
pub const GITHUB_API_VERSION: &str = "2022-11-28";

/// Remote repository connection configuration.
#[derive(Debug, Clone)]
pub struct RemoteConfig {
    /// REST API root, e.g. "https://api.github.com".
    pub api_url: String,
    /// Repository owner.
    pub owner: String,
    /// Repository name.
    pub repo: String,
    /// Access token for authentication.
    pub token: SecretString,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            owner: "".to_string(),
            repo: "".to_string(),
            token: SecretString::from("".to_string()),
        }
    }
}

impl RemoteConfig {
    /// Full repository path, `owner/repo`.
    pub fn path(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }
}
