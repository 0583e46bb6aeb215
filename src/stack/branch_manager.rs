use super::manager::StackManager;
use super::metadata::MetadataStore;
use crate::errors::{Result, StackError};
use crate::git::GitRepository;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info, warn};

/// Information about a branch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchInfo {
    pub name: String,
    pub is_current: bool,
    /// Whether the branch carries a stack
    pub has_stack: bool,
    pub description: Option<String>,
}

impl BranchInfo {
    /// One-line listing: current marker, stack marker, name and description
    pub fn list_line(&self) -> String {
        format!(
            "{} {} \t{}\t| {}",
            if self.is_current { ">" } else { " " },
            if self.has_stack { "s" } else { " " },
            self.name,
            self.description.as_deref().unwrap_or("")
        )
    }
}

/// Creates, clones, switches, lists, renames and deletes branches,
/// keeping their stacks in step
pub struct BranchManager {
    stacks: StackManager,
}

impl BranchManager {
    pub fn new(repo_path: &Path) -> Result<Self> {
        Ok(Self {
            stacks: StackManager::new(repo_path)?,
        })
    }

    pub fn stacks(&self) -> &StackManager {
        &self.stacks
    }

    pub fn git_repo(&self) -> &GitRepository {
        self.stacks.git_repo()
    }

    fn metadata(&self) -> MetadataStore<'_> {
        MetadataStore::new(self.git_repo())
    }

    pub fn current(&self) -> Result<String> {
        self.git_repo().get_current_branch()
    }

    /// Create `name` at `committish` (default: HEAD), switch to it, and
    /// initialize a stack there when auto-init is enabled
    pub fn create(&self, name: &str, committish: Option<&str>) -> Result<()> {
        let repo = self.git_repo();
        if repo.branch_exists(name) {
            return Err(StackError::branch(format!("Branch '{}' already exists", name)));
        }
        if repo.has_local_changes()? {
            return Err(StackError::LocalChanges);
        }

        let (target, parent) = match committish {
            Some(committish) => {
                let parent = repo
                    .branch_exists(committish)
                    .then(|| committish.to_string());
                (repo.resolve_commit(committish)?, parent)
            }
            None => (repo.resolve_commit("HEAD")?, repo.get_current_branch().ok()),
        };

        repo.create_branch(name, target)?;
        if let Err(e) = repo.checkout_branch(name) {
            warn!("Could not switch to '{}', removing it again", name);
            repo.delete_branch(name)?;
            return Err(e);
        }

        if let Some(parent) = parent {
            self.metadata().set_parent_branch(name, &parent)?;
        }
        if self.stacks.settings().autoinit {
            self.stacks.init(name)?;
        }

        info!("Created branch '{}' at {}", name, target);
        Ok(())
    }

    /// Clone the current branch with its stack and switch to the clone
    pub fn clone_current(&self, new_name: Option<&str>) -> Result<String> {
        let repo = self.git_repo();
        let source = self.current()?;
        let target = match new_name {
            Some(name) => name.to_string(),
            None => format!("{}-{}", source, Utc::now().format("%Y%m%d-%H%M%S")),
        };
        if repo.branch_exists(&target) {
            return Err(StackError::branch(format!(
                "Branch '{}' already exists",
                target
            )));
        }

        let head = repo.get_branch_head(&source)?;
        repo.create_branch(&target, head)?;

        let cloned = match self.stacks.clone_stack(&source, &target) {
            Ok(cloned) => cloned,
            Err(e) => {
                warn!("Clone of '{}' failed, removing '{}'", source, target);
                // Leftovers of a partial copy are removed with the branch
                if let Err(cleanup) = self.stacks.destroy(&target) {
                    debug!("Could not remove partial stack: {}", cleanup);
                }
                repo.delete_branch(&target)?;
                return Err(e);
            }
        };
        if cloned {
            self.metadata()
                .set_description(&target, &format!("clone of {}", source))?;
        }

        repo.checkout_branch(&target)?;
        info!("Cloned '{}' to '{}'", source, target);
        Ok(target)
    }

    /// Switch to an existing branch
    pub fn switch(&self, name: &str) -> Result<()> {
        let repo = self.git_repo();
        if !repo.branch_exists(name) {
            return Err(StackError::NoSuchBranch(name.to_string()));
        }
        if self.current().ok().as_deref() == Some(name) {
            debug!("Already on '{}'", name);
            return Ok(());
        }
        if repo.has_local_changes()? {
            return Err(StackError::LocalChanges);
        }

        repo.checkout_branch(name)
    }

    /// Remove the stack of the named branch (zero or one argument; default
    /// the current branch). The current branch does not change.
    pub fn cleanup(&self, args: &[String], force: bool) -> Result<String> {
        let branch = match args {
            [] => self.current()?,
            [name] => name.clone(),
            _ => return Err(StackError::invalid_arguments()),
        };
        if !self.git_repo().branch_exists(&branch) {
            return Err(StackError::NoSuchBranch(branch));
        }

        self.stacks.cleanup(&branch, force)?;
        Ok(branch)
    }

    /// Every local branch with its stack and description
    pub fn list(&self) -> Result<Vec<BranchInfo>> {
        let repo = self.git_repo();
        let current = repo.get_current_branch().ok();
        let metadata = self.metadata();

        let mut branches = Vec::new();
        for name in repo.list_branches()? {
            branches.push(BranchInfo {
                is_current: current.as_deref() == Some(name.as_str()),
                has_stack: metadata.exists(&name)?,
                description: metadata.description(&name)?,
                name,
            });
        }

        Ok(branches)
    }

    /// Delete a branch other than the current one, together with its stack
    pub fn delete(&self, name: &str, force: bool) -> Result<()> {
        let repo = self.git_repo();
        if !repo.branch_exists(name) {
            return Err(StackError::NoSuchBranch(name.to_string()));
        }
        if self.current().ok().as_deref() == Some(name) {
            return Err(StackError::branch(format!(
                "Cannot delete the current branch '{}'",
                name
            )));
        }

        if self.stacks.exists(name)? {
            self.stacks.cleanup(name, force)?;
        }
        self.metadata().remove(name)?;
        repo.delete_branch(name)?;

        info!("Deleted branch '{}'", name);
        Ok(())
    }

    /// Rename a branch (`[new]` renames the current branch, `[old, new]` any
    /// branch) and move its stack along
    pub fn rename(&self, args: &[String]) -> Result<(String, String)> {
        let (old, new) = match args {
            [new] => (self.current()?, new.clone()),
            [old, new] => (old.clone(), new.clone()),
            _ => return Err(StackError::invalid_arguments()),
        };

        let repo = self.git_repo();
        if !repo.branch_exists(&old) {
            return Err(StackError::NoSuchBranch(old));
        }
        if repo.branch_exists(&new) {
            return Err(StackError::branch(format!("Branch '{}' already exists", new)));
        }

        repo.rename_branch(&old, &new)?;
        self.stacks.rename_stack(&old, &new)?;

        info!("Renamed '{}' to '{}'", old, new);
        Ok((old, new))
    }
}
