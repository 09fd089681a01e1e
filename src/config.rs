//! Run configuration: the desired release state and the files to attach.
use clap::ValueEnum;
use derive_builder::Builder;
use serde::Serialize;
use std::{fmt, path::PathBuf};

use crate::{ReleaseError, Result};

/// Prefix carried by git refs that point at tags.
pub const TAG_REF_PREFIX: &str = "refs/tags/";

/// Separator between a file glob and an explicit asset name (`glob#name`).
pub const RENAME_SEPARATOR: char = '#';

/// Whether GitHub should mark the release as the repository's latest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum MakeLatest {
    True,
    False,
    Legacy,
}

/// A user supplied glob, optionally paired with the asset name every match
/// should be uploaded as.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FilePattern {
    pub glob: String,
    pub name: Option<String>,
}

impl FilePattern {
    /// Parse `glob` or `glob#name`. A trailing segment containing a path
    /// separator is treated as part of the glob.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();

        if let Some((glob, name)) = raw.rsplit_once(RENAME_SEPARATOR) {
            let name = name.trim();
            if !glob.trim().is_empty()
                && !name.is_empty()
                && !name.contains(['/', '\\'])
            {
                return Self {
                    glob: glob.trim().to_string(),
                    name: Some(name.to_string()),
                };
            }
        }

        Self {
            glob: raw.to_string(),
            name: None,
        }
    }
}

impl fmt::Display for FilePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{}{}{}", self.glob, RENAME_SEPARATOR, name),
            None => write!(f, "{}", self.glob),
        }
    }
}

/// Split the raw `files` input on newlines and commas into patterns.
pub fn parse_input_files(raw: &str) -> Vec<FilePattern> {
    raw.lines()
        .flat_map(|line| line.split(','))
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(FilePattern::parse)
        .collect()
}

/// Desired release state for a single run. Read-only once built.
#[derive(Debug, Clone, Builder)]
#[builder(default, setter(into))]
pub struct Config {
    /// Ref that triggered the run, e.g. `refs/tags/v1.0.0`.
    #[builder(setter(into, strip_option))]
    pub github_ref: Option<String>,
    #[builder(setter(into, strip_option))]
    pub tag_name: Option<String>,
    #[builder(setter(into, strip_option))]
    pub name: Option<String>,
    #[builder(setter(into, strip_option))]
    pub body: Option<String>,
    /// File whose contents replace `body` when set.
    #[builder(setter(into, strip_option))]
    pub body_path: Option<PathBuf>,
    pub append_body: bool,
    #[builder(setter(into, strip_option))]
    pub draft: Option<bool>,
    #[builder(setter(into, strip_option))]
    pub prerelease: Option<bool>,
    #[builder(setter(into, strip_option))]
    pub target_commitish: Option<String>,
    pub files: Vec<FilePattern>,
    /// Directory patterns are resolved against.
    #[builder(setter(into, strip_option))]
    pub working_directory: Option<PathBuf>,
    pub fail_on_unmatched_files: bool,
    #[builder(setter(into, strip_option))]
    pub discussion_category_name: Option<String>,
    pub generate_release_notes: bool,
    #[builder(setter(into, strip_option))]
    pub make_latest: Option<MakeLatest>,
    /// Replace assets whose name already exists on the release.
    pub overwrite_files: bool,
    /// Upload files one at a time in resolved order.
    pub preserve_order: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            github_ref: None,
            tag_name: None,
            name: None,
            body: None,
            body_path: None,
            append_body: false,
            draft: None,
            prerelease: None,
            target_commitish: None,
            files: vec![],
            working_directory: None,
            fail_on_unmatched_files: false,
            discussion_category_name: None,
            generate_release_notes: false,
            make_latest: None,
            overwrite_files: true,
            preserve_order: false,
        }
    }
}

impl Config {
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Explicit tag if configured, otherwise the tag named by the
    /// triggering ref.
    pub fn effective_tag(&self) -> Option<String> {
        if let Some(tag) = self.tag_name.as_deref().map(str::trim)
            && !tag.is_empty()
        {
            return Some(tag.to_string());
        }

        self.github_ref
            .as_deref()
            .and_then(|r| r.strip_prefix(TAG_REF_PREFIX))
            .filter(|tag| !tag.is_empty())
            .map(str::to_string)
    }

    pub fn is_draft(&self) -> bool {
        self.draft.unwrap_or(false)
    }

    pub fn has_files(&self) -> bool {
        !self.files.is_empty()
    }

    /// Fails when no tag can be determined and the release is not a draft.
    pub fn validate(&self) -> Result<()> {
        if self.effective_tag().is_none() && !self.is_draft() {
            return Err(ReleaseError::MissingTag);
        }
        Ok(())
    }

    /// Body text for the release: `body_path` contents win over `body`.
    pub async fn release_body(&self) -> Result<Option<String>> {
        if let Some(path) = &self.body_path {
            let content = tokio::fs::read_to_string(path).await?;
            if !content.is_empty() {
                return Ok(Some(content));
            }
        }

        Ok(self.body.clone().filter(|b| !b.is_empty()))
    }

    /// Patterns rendered the way the user wrote them.
    pub fn files_display(&self) -> String {
        self.files
            .iter()
            .map(|p| p.to_string())
            .collect::<Vec<String>>()
            .join(",")
    }
}
