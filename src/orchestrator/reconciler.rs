//! Finds or creates the release for a run and brings its fields in line
//! with the configuration.
use log::*;

use crate::{
    Result,
    config::Config,
    forge::{
        request::{CreateReleaseRequest, Release, UpdateReleaseRequest},
        traits::Forge,
    },
};

pub struct ReleaseReconciler<'a> {
    forge: &'a dyn Forge,
    config: &'a Config,
}

impl<'a> ReleaseReconciler<'a> {
    pub fn new(forge: &'a dyn Forge, config: &'a Config) -> Self {
        Self { forge, config }
    }

    /// Returns the release record after any create or update.
    ///
    /// Fails before touching the network when no tag can be determined and
    /// the release is not a draft.
    pub async fn reconcile(&self) -> Result<Release> {
        self.config.validate()?;

        let tag = self.config.effective_tag();
        let body = self.config.release_body().await?;

        let existing = match &tag {
            Some(tag) => self.find_release(tag).await?,
            None => {
                info!("no tag determined: creating draft release");
                None
            }
        };

        let Some(existing) = existing else {
            let req = self.create_request(tag, body);
            info!(
                "👩‍🏭 Creating new GitHub release for tag {}...",
                req.tag_name.as_deref().unwrap_or("<draft>")
            );
            return self.forge.create_release(req).await;
        };

        match self.update_request(&existing, tag, body) {
            Some(req) => {
                info!("updating release {} ({})", existing.tag_name, existing.id);
                self.forge.update_release(existing.id, req).await
            }
            None => {
                info!(
                    "release {} already up to date: skipping update",
                    existing.tag_name
                );
                Ok(existing)
            }
        }
    }

    /// Published release for the tag, falling back to a draft carrying it.
    async fn find_release(&self, tag: &str) -> Result<Option<Release>> {
        if let Some(release) = self.forge.get_release_by_tag(tag).await? {
            debug!("found release {} for tag {tag}", release.id);
            return Ok(Some(release));
        }

        debug!("no published release for tag {tag}: searching drafts");

        let release = self
            .forge
            .list_releases()
            .await?
            .into_iter()
            .find(|r| r.tag_name == tag);

        Ok(release)
    }

    fn create_request(
        &self,
        tag: Option<String>,
        body: Option<String>,
    ) -> CreateReleaseRequest {
        let name = non_empty(&self.config.name).or_else(|| tag.clone());

        CreateReleaseRequest {
            tag_name: tag,
            name,
            body,
            draft: self.config.is_draft(),
            prerelease: self.config.prerelease.unwrap_or(false),
            target_commitish: non_empty(&self.config.target_commitish),
            discussion_category_name: non_empty(
                &self.config.discussion_category_name,
            ),
            generate_release_notes: self.config.generate_release_notes,
            make_latest: self.config.make_latest,
        }
    }

    /// Merged desired state, or `None` when it already matches `existing`.
    ///
    /// Configured fields win; unset fields keep the remote values.
    fn update_request(
        &self,
        existing: &Release,
        tag: Option<String>,
        body: Option<String>,
    ) -> Option<UpdateReleaseRequest> {
        let name = non_empty(&self.config.name)
            .or_else(|| non_empty(&existing.name))
            .or_else(|| tag.clone());

        let body = match body {
            Some(body) if self.config.append_body => {
                Some(append_body(existing.body.as_deref(), &body))
            }
            Some(body) => Some(body),
            None => existing.body.clone(),
        };

        let draft = self.config.draft.unwrap_or(existing.draft);
        let prerelease = self.config.prerelease.unwrap_or(existing.prerelease);
        let target_commitish = non_empty(&self.config.target_commitish)
            .filter(|t| *t != existing.target_commitish);

        let unchanged = name == existing.name
            && body == existing.body
            && draft == existing.draft
            && prerelease == existing.prerelease
            && target_commitish.is_none();

        if unchanged {
            return None;
        }

        Some(UpdateReleaseRequest {
            tag_name: tag,
            name,
            body,
            draft: Some(draft),
            prerelease: Some(prerelease),
            target_commitish,
            discussion_category_name: non_empty(
                &self.config.discussion_category_name,
            ),
            make_latest: self.config.make_latest,
        })
    }
}

/// Existing body followed by `body`, unless it already ends with it.
fn append_body(existing: Option<&str>, body: &str) -> String {
    match existing {
        Some(existing) if existing.ends_with(body) => existing.to_string(),
        Some(existing) if !existing.is_empty() => format!("{existing}\n{body}"),
        _ => body.to_string(),
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value.as_ref().filter(|v| !v.trim().is_empty()).cloned()
}
