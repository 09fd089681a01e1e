//! Sequences a run: validate, resolve files, reconcile the release, upload
//! assets, report outputs.
use log::*;
use serde::Serialize;
use serde_json::Value;
use std::{fmt, sync::Arc};

use crate::{
    ReleaseError, Result,
    config::Config,
    files::{MatchedFile, resolve_patterns},
    forge::{request::Release, traits::Forge},
};

pub mod reconciler;
pub mod uploader;

pub use reconciler::ReleaseReconciler;
pub use uploader::AssetUploader;

/// Stages of a run, in order. Any stage may end the run with an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    ValidateConfig,
    ResolvePatterns,
    ReconcileRelease,
    UploadAssets,
    ReportOutputs,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::ValidateConfig => "validate-config",
            Stage::ResolvePatterns => "resolve-patterns",
            Stage::ReconcileRelease => "reconcile-release",
            Stage::UploadAssets => "upload-assets",
            Stage::ReportOutputs => "report-outputs",
        };
        write!(f, "{name}")
    }
}

/// Values reported back to the invoking environment on success.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunOutputs {
    pub url: String,
    pub id: String,
    pub upload_url: String,
    /// Present only when files were configured.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assets: Option<Vec<Value>>,
}

impl RunOutputs {
    fn new(release: &Release, assets: Option<Vec<Value>>) -> Self {
        Self {
            url: release.html_url.clone(),
            id: release.id.to_string(),
            upload_url: release.upload_url.clone(),
            assets,
        }
    }
}

pub struct Orchestrator {
    config: Arc<Config>,
    forge: Arc<dyn Forge>,
}

impl Orchestrator {
    pub fn new(config: Config, forge: Arc<dyn Forge>) -> Self {
        Self {
            config: Arc::new(config),
            forge,
        }
    }

    pub async fn run(&self) -> Result<RunOutputs> {
        debug!("stage: {}", Stage::ValidateConfig);
        self.config.validate()?;

        let files = if self.config.has_files() {
            debug!("stage: {}", Stage::ResolvePatterns);
            Some(self.resolve_files()?)
        } else {
            None
        };

        debug!("stage: {}", Stage::ReconcileRelease);
        let release = ReleaseReconciler::new(self.forge.as_ref(), &self.config)
            .reconcile()
            .await?;

        let assets = match files {
            Some(files) if files.is_empty() => Some(vec![]),
            Some(files) => {
                debug!("stage: {}", Stage::UploadAssets);
                let uploader = AssetUploader::new(
                    Arc::clone(&self.forge),
                    self.config.overwrite_files,
                    self.config.preserve_order,
                );
                Some(uploader.upload(&release, files).await?)
            }
            None => None,
        };

        debug!("stage: {}", Stage::ReportOutputs);
        info!("🎉 Release ready at {}", release.html_url);

        Ok(RunOutputs::new(&release, assets))
    }

    /// Unmatched patterns and an empty result are warnings, or fatal when
    /// `fail_on_unmatched_files` is set.
    fn resolve_files(&self) -> Result<Vec<MatchedFile>> {
        let matches = resolve_patterns(
            &self.config.files,
            self.config.working_directory.as_deref(),
        )?;

        for pattern in matches.unmatched() {
            if self.config.fail_on_unmatched_files {
                return Err(ReleaseError::UnmatchedPattern(pattern.to_string()));
            }
            warn!("🤔 Pattern '{pattern}' does not match any files.");
        }

        if matches.files().is_empty() {
            let patterns = self.config.files_display();
            if self.config.fail_on_unmatched_files {
                return Err(ReleaseError::NoValidFiles(patterns));
            }
            warn!("🤔 {patterns} not include valid file.");
        }

        Ok(matches.into_files())
    }
}
