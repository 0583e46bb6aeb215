use super::Stack;
use crate::config::get_branch_state_dir;
use crate::errors::{StackError, Result};
use crate::utils::atomic_file;
use std::path::{Path, PathBuf};

const STACK_FILE: &str = "stack.json";

/// Persists stack bookkeeping as JSON inside the git directory
pub struct StackStore {
    git_dir: PathBuf,
}

impl StackStore {
    pub fn new(git_dir: &Path) -> Self {
        Self {
            git_dir: git_dir.to_path_buf(),
        }
    }

    /// File holding the stack of a branch
    pub fn stack_file(&self, branch: &str) -> PathBuf {
        get_branch_state_dir(&self.git_dir, branch).join(STACK_FILE)
    }

    /// Load a branch's stack; `None` when nothing is stored
    pub fn load(&self, branch: &str) -> Result<Option<Stack>> {
        let stack: Option<Stack> = atomic_file::read_json(&self.stack_file(branch))?;

        if let Some(stack) = &stack {
            stack.validate().map_err(|e| {
                StackError::inconsistent(format!("Stored stack for '{}' is invalid: {}", branch, e))
            })?;
        }

        Ok(stack)
    }

    /// Save a stack atomically
    pub fn save(&self, stack: &Stack) -> Result<()> {
        atomic_file::write_json(&self.stack_file(&stack.branch), stack)?;
        tracing::debug!(
            "Saved stack for '{}' ({} applied, {} unapplied)",
            stack.branch,
            stack.series.applied().len(),
            stack.series.unapplied().len()
        );
        Ok(())
    }

    /// Remove a branch's stored stack
    pub fn remove(&self, branch: &str) -> Result<()> {
        atomic_file::remove(&self.stack_file(branch))
    }
}
