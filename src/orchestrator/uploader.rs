//! Uploads resolved files as release assets.
use bytes::Bytes;
use futures::stream::{FuturesUnordered, StreamExt};
use log::*;
use serde_json::Value;
use std::{path::Path, sync::Arc};

use crate::{
    Result,
    files::MatchedFile,
    forge::{
        request::{Release, UploadAssetRequest},
        traits::Forge,
    },
};

/// Descriptor field naming the account that uploaded an asset.
pub const UPLOADER_FIELD: &str = "uploader";

/// Uploads files against a release whose asset list was captured before
/// any upload began.
pub struct AssetUploader {
    forge: Arc<dyn Forge>,
    overwrite: bool,
    preserve_order: bool,
}

/// Everything one upload needs, owned so it can run as its own task.
#[derive(Clone)]
struct UploadJob {
    forge: Arc<dyn Forge>,
    /// Release as it was before any upload in this batch.
    release: Arc<Release>,
    overwrite: bool,
}

impl AssetUploader {
    pub fn new(
        forge: Arc<dyn Forge>,
        overwrite: bool,
        preserve_order: bool,
    ) -> Self {
        Self {
            forge,
            overwrite,
            preserve_order,
        }
    }

    /// Uploads every file and returns their descriptors in file order.
    ///
    /// The first failure aborts the batch. Uploads already in flight are
    /// left to finish; their results are discarded.
    pub async fn upload(
        &self,
        release: &Release,
        files: Vec<MatchedFile>,
    ) -> Result<Vec<Value>> {
        let job = UploadJob {
            forge: Arc::clone(&self.forge),
            release: Arc::new(release.clone()),
            overwrite: self.overwrite,
        };

        if self.preserve_order {
            let mut assets = vec![];
            for file in files {
                if let Some(asset) = job.run(file).await? {
                    assets.push(asset);
                }
            }
            return Ok(assets);
        }

        let mut pending = files
            .into_iter()
            .enumerate()
            .map(|(index, file)| {
                let job = job.clone();
                let handle = tokio::spawn(async move { job.run(file).await });
                async move { (index, handle.await) }
            })
            .collect::<FuturesUnordered<_>>();

        let mut uploaded = vec![];

        while let Some((index, joined)) = pending.next().await {
            if let Some(asset) = joined?? {
                uploaded.push((index, asset));
            }
        }

        uploaded.sort_by_key(|(index, _)| *index);

        Ok(uploaded.into_iter().map(|(_, asset)| asset).collect())
    }
}

impl UploadJob {
    /// Delete any asset already using the name, then upload the file.
    /// Returns `None` when the file was skipped.
    async fn run(&self, file: MatchedFile) -> Result<Option<Value>> {
        if let Some(existing) = self.release.find_asset(&file.name) {
            if !self.overwrite {
                warn!(
                    "Asset {} already exists and overwrite_files is false: skipping",
                    file.name
                );
                return Ok(None);
            }

            info!("♻️ Deleting previously uploaded asset {}...", file.name);
            self.forge.delete_asset(existing.id).await?;
        }

        let data = tokio::fs::read(&file.path).await?;

        info!("⬆️ Uploading {} ({} bytes)...", file.name, data.len());

        let req = UploadAssetRequest {
            upload_url: self.release.upload_endpoint().to_string(),
            name: file.name.clone(),
            content_type: content_type(&file.path).to_string(),
            data: Bytes::from(data),
        };

        let asset = self.forge.upload_asset(req).await?;

        debug!("uploaded {} from {}", file.name, file.path.display());

        Ok(Some(strip_uploader(asset)))
    }
}

/// Remove the uploader identity from an asset descriptor.
pub fn strip_uploader(mut asset: Value) -> Value {
    if let Value::Object(map) = &mut asset {
        map.remove(UPLOADER_FIELD);
    }
    asset
}

/// MIME type for an artifact, by extension.
pub fn content_type(path: &Path) -> &'static str {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default()
        .to_lowercase();

    if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
        return "application/gzip";
    }

    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .as_deref()
    {
        Some("gz") => "application/gzip",
        Some("zip") => "application/zip",
        Some("tar") => "application/x-tar",
        Some("xz") => "application/x-xz",
        Some("bz2") => "application/x-bzip2",
        Some("zst") => "application/zstd",
        Some("7z") => "application/x-7z-compressed",
        Some("deb") => "application/vnd.debian.binary-package",
        Some("rpm") => "application/x-rpm",
        Some("exe") | Some("msi") => "application/x-msdownload",
        Some("dmg") => "application/x-apple-diskimage",
        Some("appimage") => "application/x-executable",
        Some("json") => "application/json",
        Some("txt") | Some("sha256") | Some("sha512") | Some("asc")
        | Some("sig") => "text/plain",
        Some("md") => "text/markdown",
        Some("pdf") => "application/pdf",
        Some("png") => "image/png",
        Some("svg") => "image/svg+xml",
        _ => "application/octet-stream",
    }
}
