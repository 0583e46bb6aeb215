pub mod branch;
pub mod commit;
pub mod completions;
pub mod delete;
pub mod init;
pub mod new;
pub mod pop;
pub mod push;
pub mod refresh;
pub mod series;

use crate::errors::{Result, StackError};
use crate::git::find_repository_root;
use crate::stack::{BranchManager, PatchCount, StackManager};
use clap::Args;
use std::env;
use std::path::PathBuf;

/// `-a` / `-n N` selection shared by push, pop and commit
#[derive(Debug, Clone, Copy, Default, Args)]
pub struct CountArgs {
    /// Act on all patches
    #[arg(long, short, conflicts_with = "number")]
    pub all: bool,

    /// Act on this many patches
    #[arg(long, short)]
    pub number: Option<usize>,
}

impl CountArgs {
    pub fn patch_count(&self) -> PatchCount {
        PatchCount::from_flags(self.all, self.number)
    }
}

/// Root of the repository containing the current directory
pub(crate) fn repository_root() -> Result<PathBuf> {
    let current_dir = env::current_dir()
        .map_err(|e| StackError::config(format!("Could not get current directory: {}", e)))?;
    find_repository_root(&current_dir)
}

pub(crate) fn stack_manager() -> Result<StackManager> {
    StackManager::new(&repository_root()?)
}

pub(crate) fn branch_manager() -> Result<BranchManager> {
    BranchManager::new(&repository_root()?)
}

/// The branch named on the command line, or the current one
pub(crate) fn target_branch(manager: &StackManager, branch: Option<String>) -> Result<String> {
    match branch {
        Some(branch) => Ok(branch),
        None => manager.git_repo().get_current_branch(),
    }
}
