//! Common test utilities for orchestrator tests.

use std::sync::Arc;
use tempfile::TempDir;

use crate::{
    Orchestrator,
    config::{Config, ConfigBuilder, FilePattern},
    forge::traits::MockForge,
    test_helpers::write_test_files,
};

pub use crate::test_helpers::*;

/// Creates a test Orchestrator with the provided mock forge.
/// This allows tests to set expectations on the mock before creating it.
///
/// # Example
/// ```ignore
/// let mut mock_forge = MockForge::new();
/// mock_forge.expect_get_release_by_tag().returning(|_| Ok(None));
/// let orchestrator = create_test_orchestrator(mock_forge, config);
/// ```
pub fn create_test_orchestrator(
    mock_forge: MockForge,
    config: Config,
) -> Orchestrator {
    Orchestrator::new(config, Arc::new(mock_forge))
}

/// Config builder for [`TEST_TAG`] rooted at `dir` with the given patterns.
pub fn config_with_files(dir: &TempDir, patterns: &[&str]) -> ConfigBuilder {
    let mut builder = Config::builder();
    builder
        .tag_name(TEST_TAG)
        .working_directory(dir.path())
        .files(
            patterns
                .iter()
                .map(|p| FilePattern::parse(p))
                .collect::<Vec<FilePattern>>(),
        );
    builder
}

/// Temp directory holding the given artifact files.
pub fn artifacts_dir(paths: &[&str]) -> TempDir {
    let dir = TempDir::new().unwrap();
    write_test_files(dir.path(), paths);
    dir
}
