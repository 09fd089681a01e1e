//! Expansion of file patterns into the local files to upload.
use log::*;
use std::{
    collections::HashSet,
    path::{Path, PathBuf},
};

use crate::{ReleaseError, Result, config::FilePattern};

/// A resolved local file and the asset name it uploads as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchedFile {
    pub path: PathBuf,
    pub name: String,
}

/// Outcome of resolving a list of patterns against the filesystem.
#[derive(Debug, Default)]
pub struct PatternMatches {
    files: Vec<MatchedFile>,
    unmatched: Vec<FilePattern>,
}

impl PatternMatches {
    /// Regular files in pattern order, without duplicates.
    pub fn files(&self) -> &[MatchedFile] {
        &self.files
    }

    pub fn paths(&self) -> Vec<&Path> {
        self.files.iter().map(|f| f.path.as_path()).collect()
    }

    /// Patterns that matched no regular file.
    pub fn unmatched(&self) -> &[FilePattern] {
        &self.unmatched
    }

    pub fn into_files(self) -> Vec<MatchedFile> {
        self.files
    }
}

/// Expand each pattern into existing regular files.
///
/// Directories never count as matches. A path matched by several patterns
/// is kept once, at the position (and with the name) of the first pattern
/// that matched it. Relative patterns are resolved against `base` when one
/// is given.
pub fn resolve_patterns(
    patterns: &[FilePattern],
    base: Option<&Path>,
) -> Result<PatternMatches> {
    let mut matches = PatternMatches::default();
    let mut seen: HashSet<PathBuf> = HashSet::new();

    for pattern in patterns {
        let paths = expand(pattern, base)?;

        if paths.is_empty() {
            debug!("pattern matched no files: {pattern}");
            matches.unmatched.push(pattern.clone());
            continue;
        }

        let rename = match (&pattern.name, paths.len()) {
            (Some(name), 1) => Some(name.clone()),
            (Some(name), count) => {
                warn!(
                    "🤔 Pattern '{}' matched {count} files: ignoring asset name '{name}'",
                    pattern.glob
                );
                None
            }
            (None, _) => None,
        };

        for path in paths {
            if !seen.insert(path.clone()) {
                continue;
            }

            let name = match &rename {
                Some(name) => name.clone(),
                None => asset_name(&path)?,
            };

            matches.files.push(MatchedFile { path, name });
        }
    }

    Ok(matches)
}

fn expand(pattern: &FilePattern, base: Option<&Path>) -> Result<Vec<PathBuf>> {
    let not_utf8 = || ReleaseError::InvalidPattern {
        pattern: pattern.to_string(),
        reason: "path is not valid UTF-8".into(),
    };

    // base is a literal directory: only the pattern may carry glob syntax
    let glob_path = match base {
        Some(base) if Path::new(&pattern.glob).is_relative() => {
            let base = base.to_str().ok_or_else(not_utf8)?;
            PathBuf::from(glob::Pattern::escape(base)).join(&pattern.glob)
        }
        _ => PathBuf::from(&pattern.glob),
    };

    let glob_str = glob_path.to_str().ok_or_else(not_utf8)?;

    let entries =
        glob::glob(glob_str).map_err(|e| ReleaseError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })?;

    let mut paths = vec![];

    for entry in entries {
        match entry {
            Ok(path) if path.is_file() => paths.push(path),
            Ok(path) => debug!("skipping non-file match: {}", path.display()),
            Err(err) => warn!("unable to read {}: {err}", err.path().display()),
        }
    }

    Ok(paths)
}

/// Base file name of `path`, used as the default asset name.
pub fn asset_name(path: &Path) -> Result<String> {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
        .ok_or_else(|| {
            ReleaseError::invalid_config(format!(
                "invalid file name for upload: {}",
                path.display()
            ))
        })
}
