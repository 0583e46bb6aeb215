pub mod settings;

pub use settings::Settings;

use crate::errors::{StackError, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Directory inside the git directory holding all stack bookkeeping
pub fn get_state_dir(git_dir: &Path) -> PathBuf {
    git_dir.join("patchstack")
}

/// Directory holding the bookkeeping for one branch
pub fn get_branch_state_dir(git_dir: &Path, branch: &str) -> PathBuf {
    get_state_dir(git_dir).join(branch)
}

/// Ensure a state directory exists
pub fn ensure_state_dir(dir: &Path) -> Result<()> {
    if !dir.exists() {
        fs::create_dir_all(dir).map_err(|e| {
            StackError::config(format!("Failed to create state directory: {}", e))
        })?;
    }

    Ok(())
}
