//! Common test helper functions shared across test modules.
//!
//! Fixtures for release records, assets and local artifact files.
use serde_json::{Value, json};
use std::{fs, path::Path};

use crate::forge::request::{
    CreateReleaseRequest, Release, ReleaseAsset, UploadAssetRequest,
};

pub const TEST_TAG: &str = "v1.0.0";

/// Creates a published release for `tag` with no assets.
pub fn create_test_release(id: u64, tag: &str) -> Release {
    Release {
        id,
        tag_name: tag.to_string(),
        name: Some(tag.to_string()),
        body: None,
        html_url: format!("https://github.com/test/repo/releases/tag/{tag}"),
        upload_url: format!(
            "https://uploads.github.com/repos/test/repo/releases/{id}/assets{{?name,label}}"
        ),
        target_commitish: "main".to_string(),
        draft: false,
        prerelease: false,
        assets: vec![],
    }
}

pub fn create_test_asset(id: u64, name: &str) -> ReleaseAsset {
    ReleaseAsset {
        id,
        name: name.to_string(),
        size: 3,
        state: "uploaded".to_string(),
    }
}

/// The release GitHub would return for a create request.
pub fn release_from_request(id: u64, req: &CreateReleaseRequest) -> Release {
    let tag = req.tag_name.clone().unwrap_or_default();
    Release {
        name: req.name.clone(),
        body: req.body.clone(),
        draft: req.draft,
        prerelease: req.prerelease,
        target_commitish: req
            .target_commitish
            .clone()
            .unwrap_or_else(|| "main".to_string()),
        ..create_test_release(id, &tag)
    }
}

/// Asset descriptor as the upload endpoint returns it, uploader included.
pub fn uploaded_asset(id: u64, req: &UploadAssetRequest) -> Value {
    json!({
        "id": id,
        "name": req.name,
        "content_type": req.content_type,
        "size": req.data.len(),
        "state": "uploaded",
        "uploader": { "login": "github-actions[bot]", "id": 41898282 },
        "browser_download_url": format!(
            "https://github.com/test/repo/releases/download/{}/{}",
            TEST_TAG,
            req.name
        ),
    })
}

/// Writes each relative path under `root` with small contents.
pub fn write_test_files(root: &Path, paths: &[&str]) {
    for path in paths {
        let full = root.join(path);
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(full, path.as_bytes()).unwrap();
    }
}
