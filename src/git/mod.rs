pub mod repository;

pub use repository::{GitRepository, Identity, MergeOutcome};

use crate::errors::{StackError, Result};
use std::path::{Path, PathBuf};

/// Find the root of the Git repository
pub fn find_repository_root(start_path: &Path) -> Result<PathBuf> {
    let repo = git2::Repository::discover(start_path)
        .map_err(|e| StackError::config(format!("Not a git repository: {e}")))?;

    let workdir = repo
        .workdir()
        .ok_or_else(|| StackError::config("Repository has no working directory (bare repo?)"))?;

    Ok(workdir.to_path_buf())
}
