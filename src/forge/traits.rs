//! Traits related to the remote release API
use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

use crate::{
    Result,
    forge::request::{
        CreateReleaseRequest, Release, UpdateReleaseRequest,
        UploadAssetRequest,
    },
};

/// Capability to read and mutate releases and their assets.
///
/// Implementations surface throttling as [`crate::ReleaseError::RateLimited`]
/// and [`crate::ReleaseError::AbuseDetected`] so the throttle policy can tell
/// them apart from ordinary failures.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait Forge: Send + Sync {
    /// Published release for `tag`, or `None` when the API reports 404.
    async fn get_release_by_tag(&self, tag: &str) -> Result<Option<Release>>;
    /// Every release of the repository, drafts included.
    async fn list_releases(&self) -> Result<Vec<Release>>;
    async fn create_release(&self, req: CreateReleaseRequest)
    -> Result<Release>;
    async fn update_release(
        &self,
        release_id: u64,
        req: UpdateReleaseRequest,
    ) -> Result<Release>;
    async fn delete_asset(&self, asset_id: u64) -> Result<()>;
    /// Uploads an asset and returns the API's asset descriptor verbatim.
    async fn upload_asset(
        &self,
        req: UploadAssetRequest,
    ) -> Result<serde_json::Value>;
}
