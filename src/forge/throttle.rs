//! Rate-limit and abuse-limit handling for forge calls.
use async_trait::async_trait;
use log::*;
use std::future::Future;
use tokio::time::sleep;

use crate::{
    ReleaseError, Result,
    forge::{
        request::{
            CreateReleaseRequest, Release, UpdateReleaseRequest,
            UploadAssetRequest,
        },
        traits::Forge,
    },
};

/// Retries allowed for a single call after a rate-limit signal.
pub const MAX_RATE_LIMIT_RETRIES: u32 = 1;

/// Forge decorator that applies the throttle policy to every call.
///
/// A rate-limit signal is waited out and the call retried once; a second
/// signal on the retry fails the call. Abuse signals are never retried.
/// The retry count belongs to one call, so separate calls each get their
/// own retry.
pub struct ThrottledForge {
    inner: Box<dyn Forge>,
}

impl ThrottledForge {
    pub fn new(inner: Box<dyn Forge>) -> Self {
        Self { inner }
    }

    async fn call<T, F, Fut>(&self, op: F) -> Result<T>
    where
        F: Fn() -> Fut + Send + Sync,
        Fut: Future<Output = Result<T>> + Send,
        T: Send,
    {
        let mut retry_count = 0;

        loop {
            match op().await {
                Err(ReleaseError::RateLimited {
                    method,
                    url,
                    retry_after,
                }) => {
                    warn!("Request quota exhausted for request {method} {url}");

                    if retry_count >= MAX_RATE_LIMIT_RETRIES {
                        return Err(ReleaseError::RateLimited {
                            method,
                            url,
                            retry_after,
                        });
                    }

                    retry_count += 1;
                    info!("Retrying after {} seconds!", retry_after.as_secs());
                    sleep(retry_after).await;
                }
                Err(ReleaseError::AbuseDetected {
                    method,
                    url,
                    retry_after,
                }) => {
                    warn!("Abuse detected for request {method} {url}");
                    return Err(ReleaseError::AbuseDetected {
                        method,
                        url,
                        retry_after,
                    });
                }
                result => return result,
            }
        }
    }
}

#[async_trait]
impl Forge for ThrottledForge {
    async fn get_release_by_tag(&self, tag: &str) -> Result<Option<Release>> {
        self.call(|| self.inner.get_release_by_tag(tag)).await
    }

    async fn list_releases(&self) -> Result<Vec<Release>> {
        self.call(|| self.inner.list_releases()).await
    }

    async fn create_release(
        &self,
        req: CreateReleaseRequest,
    ) -> Result<Release> {
        self.call(|| self.inner.create_release(req.clone())).await
    }

    async fn update_release(
        &self,
        release_id: u64,
        req: UpdateReleaseRequest,
    ) -> Result<Release> {
        self.call(|| self.inner.update_release(release_id, req.clone()))
            .await
    }

    async fn delete_asset(&self, asset_id: u64) -> Result<()> {
        self.call(|| self.inner.delete_asset(asset_id)).await
    }

    async fn upload_asset(
        &self,
        req: UploadAssetRequest,
    ) -> Result<serde_json::Value> {
        self.call(|| self.inner.upload_asset(req.clone())).await
    }
}
