use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::config::MakeLatest;

/// Asset attached to a release, as listed on the release record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseAsset {
    pub id: u64,
    pub name: String,
    pub size: u64,
    /// e.g. "uploaded", "open"
    pub state: String,
}

/// Snapshot of a remote release record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Release {
    pub id: u64,
    pub tag_name: String,
    pub name: Option<String>,
    pub body: Option<String>,
    pub html_url: String,
    /// URL template, e.g. `https://uploads.github.com/.../assets{?name,label}`
    pub upload_url: String,
    pub target_commitish: String,
    pub draft: bool,
    pub prerelease: bool,
    #[serde(default)]
    pub assets: Vec<ReleaseAsset>,
}

impl Release {
    /// Upload URL with its `{?name,label}` template suffix removed.
    pub fn upload_endpoint(&self) -> &str {
        upload_endpoint(&self.upload_url)
    }

    pub fn find_asset(&self, name: &str) -> Option<&ReleaseAsset> {
        self.assets.iter().find(|a| a.name == name)
    }
}

/// Strip the URL template portion from an upload URL.
pub fn upload_endpoint(upload_url: &str) -> &str {
    match upload_url.find('{') {
        Some(idx) => &upload_url[..idx],
        None => upload_url,
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
/// Request to create a new release.
pub struct CreateReleaseRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    pub draft: bool,
    pub prerelease: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_commitish: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discussion_category_name: Option<String>,
    pub generate_release_notes: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub make_latest: Option<MakeLatest>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
/// Request to update an existing release. Unset fields are left unchanged.
pub struct UpdateReleaseRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub draft: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prerelease: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_commitish: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discussion_category_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub make_latest: Option<MakeLatest>,
}

#[derive(Debug, Clone)]
/// Request to upload file contents as a release asset.
pub struct UploadAssetRequest {
    /// Upload endpoint with the URL template already stripped.
    pub upload_url: String,
    pub name: String,
    pub content_type: String,
    pub data: Bytes,
}
