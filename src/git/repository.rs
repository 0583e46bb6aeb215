use crate::errors::{StackError, Result};
use git2::build::CheckoutBuilder;
use git2::{
    BranchType, ConfigLevel, ErrorCode, Oid, Repository, ResetType, Signature, Status,
    StatusOptions,
};
use std::path::{Path, PathBuf};

/// Author identity carried by a patch commit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub name: String,
    pub email: String,
}

/// Outcome of replaying a commit's change onto another parent
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeOutcome {
    /// The change applied; the resulting tree id
    Clean(Oid),
    /// The change conflicts on these paths
    Conflicted(Vec<String>),
}

/// Wrapper around git2::Repository with the operations the patch stack needs
pub struct GitRepository {
    repo: Repository,
    path: PathBuf,
}

impl GitRepository {
    /// Open a Git repository at (or above) the given path
    pub fn open(path: &Path) -> Result<Self> {
        let repo = Repository::discover(path)
            .map_err(|e| StackError::config(format!("Not a git repository: {}", e)))?;

        let workdir = repo
            .workdir()
            .ok_or_else(|| StackError::config("Repository has no working directory"))?
            .to_path_buf();

        Ok(Self {
            repo,
            path: workdir,
        })
    }

    /// Working directory of the repository
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The `.git` directory (per worktree)
    pub fn git_dir(&self) -> &Path {
        self.repo.path()
    }

    /// Get the current branch name
    pub fn get_current_branch(&self) -> Result<String> {
        let head = self
            .repo
            .head()
            .map_err(|e| StackError::branch(format!("Could not get HEAD: {}", e)))?;

        if !head.is_branch() {
            return Err(StackError::branch("HEAD is detached; not on any branch"));
        }

        head.shorthand()
            .map(str::to_string)
            .ok_or_else(|| StackError::branch("Current branch name is not valid UTF-8"))
    }

    /// Check if a local branch exists
    pub fn branch_exists(&self, name: &str) -> bool {
        self.repo.find_branch(name, BranchType::Local).is_ok()
    }

    /// List all local branches
    pub fn list_branches(&self) -> Result<Vec<String>> {
        let branches = self.repo.branches(Some(BranchType::Local))?;

        let mut branch_names = Vec::new();
        for branch in branches {
            let (branch, _) = branch?;
            if let Some(name) = branch.name()? {
                branch_names.push(name.to_string());
            }
        }
        branch_names.sort();

        Ok(branch_names)
    }

    /// Get the commit id at the head of a branch
    pub fn get_branch_head(&self, branch_name: &str) -> Result<Oid> {
        let branch = self
            .repo
            .find_branch(branch_name, BranchType::Local)
            .map_err(|_| StackError::NoSuchBranch(branch_name.to_string()))?;

        let commit = branch.get().peel_to_commit().map_err(|e| {
            StackError::branch(format!(
                "Could not get commit for branch '{}': {}",
                branch_name, e
            ))
        })?;

        Ok(commit.id())
    }

    /// Resolve a branch name, tag or commit hash to a commit id
    pub fn resolve_commit(&self, reference: &str) -> Result<Oid> {
        let obj = self.repo.revparse_single(reference).map_err(|e| {
            StackError::branch(format!("Could not resolve reference '{}': {}", reference, e))
        })?;

        let commit = obj.peel_to_commit().map_err(|e| {
            StackError::branch(format!(
                "Reference '{}' does not point to a commit: {}",
                reference, e
            ))
        })?;

        Ok(commit.id())
    }

    /// Create a new branch pointing at `target`
    pub fn create_branch(&self, name: &str, target: Oid) -> Result<()> {
        if self.branch_exists(name) {
            return Err(StackError::branch(format!(
                "Branch '{}' already exists",
                name
            )));
        }

        let commit = self.repo.find_commit(target)?;
        self.repo.branch(name, &commit, false).map_err(|e| {
            StackError::branch(format!("Could not create branch '{}': {}", name, e))
        })?;

        tracing::info!("Created branch '{}' at {}", name, target);
        Ok(())
    }

    /// Delete a local branch
    pub fn delete_branch(&self, name: &str) -> Result<()> {
        let mut branch = self
            .repo
            .find_branch(name, BranchType::Local)
            .map_err(|_| StackError::NoSuchBranch(name.to_string()))?;

        branch.delete().map_err(|e| {
            StackError::branch(format!("Could not delete branch '{}': {}", name, e))
        })?;

        tracing::info!("Deleted branch '{}'", name);
        Ok(())
    }

    /// Rename a local branch
    pub fn rename_branch(&self, old: &str, new: &str) -> Result<()> {
        let mut branch = self
            .repo
            .find_branch(old, BranchType::Local)
            .map_err(|_| StackError::NoSuchBranch(old.to_string()))?;

        branch.rename(new, false).map_err(|e| {
            StackError::branch(format!("Could not rename '{}' to '{}': {}", old, new, e))
        })?;

        tracing::info!("Renamed branch '{}' to '{}'", old, new);
        Ok(())
    }

    /// Move a branch reference without touching the working tree
    pub fn set_branch_target(&self, name: &str, target: Oid, reason: &str) -> Result<()> {
        self.repo
            .reference(&format!("refs/heads/{}", name), target, true, reason)
            .map_err(|e| {
                StackError::branch(format!("Could not update branch '{}': {}", name, e))
            })?;

        tracing::debug!("Branch '{}' -> {} ({})", name, target, reason);
        Ok(())
    }

    /// Switch to a branch
    pub fn checkout_branch(&self, name: &str) -> Result<()> {
        let branch = self
            .repo
            .find_branch(name, BranchType::Local)
            .map_err(|_| StackError::NoSuchBranch(name.to_string()))?;

        let tree = branch.get().peel_to_tree().map_err(|e| {
            StackError::branch(format!("Could not get tree for branch '{}': {}", name, e))
        })?;

        self.repo
            .checkout_tree(tree.as_object(), None)
            .map_err(|e| {
                StackError::branch(format!("Could not checkout branch '{}': {}", name, e))
            })?;

        self.repo
            .set_head(&format!("refs/heads/{}", name))
            .map_err(|e| {
                StackError::branch(format!("Could not update HEAD to '{}': {}", name, e))
            })?;

        tracing::info!("Switched to branch '{}'", name);
        Ok(())
    }

    /// Hard reset the current branch, index and working tree to `target`
    pub fn reset_hard(&self, target: Oid) -> Result<()> {
        let commit = self.repo.find_commit(target)?;
        self.repo.reset(commit.as_object(), ResetType::Hard, None)?;

        tracing::debug!("Hard reset to {}", target);
        Ok(())
    }

    /// Move the current branch, index and working tree to `target`.
    ///
    /// The tree is checked out in safe mode first, so untracked files in the
    /// way make this fail with [`StackError::LocalChanges`] before anything
    /// is written.
    pub fn checkout_commit(&self, target: Oid) -> Result<()> {
        let commit = self.repo.find_commit(target)?;

        let mut checkout = CheckoutBuilder::new();
        checkout.safe();
        self.repo
            .checkout_tree(commit.as_object(), Some(&mut checkout))
            .map_err(|e| match e.code() {
                ErrorCode::Conflict => StackError::LocalChanges,
                _ => StackError::Git(e),
            })?;
        self.repo.reset(commit.as_object(), ResetType::Hard, None)?;

        tracing::debug!("Checked out {}", target);
        Ok(())
    }

    /// Check for uncommitted changes to tracked files (untracked files are ignored)
    pub fn has_local_changes(&self) -> Result<bool> {
        let mut options = StatusOptions::new();
        options.include_untracked(false).include_ignored(false);
        let statuses = self.repo.statuses(Some(&mut options))?;

        let dirty = statuses.iter().any(|entry| {
            entry.status().intersects(
                Status::INDEX_NEW
                    | Status::INDEX_MODIFIED
                    | Status::INDEX_DELETED
                    | Status::INDEX_RENAMED
                    | Status::INDEX_TYPECHANGE
                    | Status::WT_MODIFIED
                    | Status::WT_DELETED
                    | Status::WT_TYPECHANGE
                    | Status::WT_RENAMED
                    | Status::CONFLICTED,
            )
        });

        Ok(dirty)
    }

    /// Stage tracked modifications and write the index as a tree
    pub fn capture_worktree(&self) -> Result<Oid> {
        let mut index = self.repo.index()?;
        // Pick up changes staged by other processes
        index.read(false)?;
        index.update_all(["*"].iter(), None)?;
        index.write()?;

        Ok(index.write_tree()?)
    }

    /// Tree id of a commit
    pub fn commit_tree(&self, commit: Oid) -> Result<Oid> {
        Ok(self.repo.find_commit(commit)?.tree_id())
    }

    /// First parent of a commit, if any
    pub fn commit_parent(&self, commit: Oid) -> Result<Option<Oid>> {
        let commit = self.repo.find_commit(commit)?;
        Ok(commit.parent_ids().next())
    }

    /// Author of a commit
    pub fn commit_author(&self, commit: Oid) -> Result<Identity> {
        let commit = self.repo.find_commit(commit)?;
        let author = commit.author();
        Ok(Identity {
            name: author.name().unwrap_or_default().to_string(),
            email: author.email().unwrap_or_default().to_string(),
        })
    }

    /// Check if a commit exists
    pub fn commit_exists(&self, commit: Oid) -> bool {
        self.repo.find_commit(commit).is_ok()
    }

    /// Create a commit object without moving any reference
    pub fn create_commit(
        &self,
        tree: Oid,
        parent: Oid,
        message: &str,
        author: Option<&Identity>,
    ) -> Result<Oid> {
        let committer = self.get_signature()?;
        let author = match author {
            Some(identity) => Signature::now(&identity.name, &identity.email)?,
            None => committer.clone(),
        };
        let tree = self.repo.find_tree(tree)?;
        let parent = self.repo.find_commit(parent)?;

        let commit_id = self
            .repo
            .commit(None, &author, &committer, message, &tree, &[&parent])?;

        tracing::debug!("Created commit {} - {}", commit_id, message.trim());
        Ok(commit_id)
    }

    /// Replay the change introduced by `commit` (relative to its first parent) onto `onto`
    pub fn replay_commit(&self, commit: Oid, onto: Oid) -> Result<MergeOutcome> {
        let commit = self.repo.find_commit(commit)?;
        let commit_tree = commit.tree()?;
        let ancestor_tree = match commit.parent_ids().next() {
            Some(parent) => self.repo.find_commit(parent)?.tree()?,
            None => {
                let empty = self.repo.treebuilder(None)?.write()?;
                self.repo.find_tree(empty)?
            }
        };
        let onto_tree = self.repo.find_commit(onto)?.tree()?;

        let mut index = self
            .repo
            .merge_trees(&ancestor_tree, &onto_tree, &commit_tree, None)?;

        if index.has_conflicts() {
            let mut files = Vec::new();
            for conflict in index.conflicts()? {
                let conflict = conflict?;
                let entry = conflict.our.or(conflict.their).or(conflict.ancestor);
                if let Some(entry) = entry {
                    files.push(String::from_utf8_lossy(&entry.path).into_owned());
                }
            }
            files.sort();
            files.dedup();
            return Ok(MergeOutcome::Conflicted(files));
        }

        let tree = index.write_tree_to(&self.repo)?;
        Ok(MergeOutcome::Clean(tree))
    }

    /// Create or move a reference
    pub fn set_reference(&self, name: &str, target: Oid, reason: &str) -> Result<()> {
        self.repo.reference(name, target, true, reason)?;
        Ok(())
    }

    /// Delete a reference; missing references are not an error
    pub fn delete_reference(&self, name: &str) -> Result<()> {
        match self.repo.find_reference(name) {
            Ok(mut reference) => {
                reference.delete()?;
                Ok(())
            }
            Err(e) if e.code() == ErrorCode::NotFound => Ok(()),
            Err(e) => Err(StackError::Git(e)),
        }
    }

    /// Resolve a reference to its target, if it exists
    pub fn reference_target(&self, name: &str) -> Result<Option<Oid>> {
        match self.repo.find_reference(name) {
            Ok(reference) => Ok(reference.target()),
            Err(e) if e.code() == ErrorCode::NotFound => Ok(None),
            Err(e) => Err(StackError::Git(e)),
        }
    }

    /// Check that a string is a valid full reference name
    pub fn is_valid_reference_name(name: &str) -> bool {
        git2::Reference::is_valid_name(name)
    }

    /// Read a string from the merged git configuration
    pub fn config_get(&self, key: &str) -> Result<Option<String>> {
        let config = self.repo.config()?;
        match config.get_string(key) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.code() == ErrorCode::NotFound => Ok(None),
            Err(e) => Err(StackError::Git(e)),
        }
    }

    /// Read a boolean from the merged git configuration
    pub fn config_get_bool(&self, key: &str) -> Result<Option<bool>> {
        let config = self.repo.config()?;
        match config.get_bool(key) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.code() == ErrorCode::NotFound => Ok(None),
            Err(e) => Err(StackError::config(format!("Invalid value for {}: {}", key, e))),
        }
    }

    /// Read an integer from the merged git configuration
    pub fn config_get_i64(&self, key: &str) -> Result<Option<i64>> {
        let config = self.repo.config()?;
        match config.get_i64(key) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.code() == ErrorCode::NotFound => Ok(None),
            Err(e) => Err(StackError::config(format!("Invalid value for {}: {}", key, e))),
        }
    }

    /// Write a string to the repository-local configuration
    pub fn config_set(&self, key: &str, value: &str) -> Result<()> {
        let mut config = self.repo.config()?.open_level(ConfigLevel::Local)?;
        config.set_str(key, value)?;
        Ok(())
    }

    /// Remove a key from the repository-local configuration; missing keys are not an error
    pub fn config_remove(&self, key: &str) -> Result<()> {
        let mut config = self.repo.config()?.open_level(ConfigLevel::Local)?;
        match config.remove(key) {
            Ok(()) => Ok(()),
            Err(e) if e.code() == ErrorCode::NotFound => Ok(()),
            Err(e) => Err(StackError::Git(e)),
        }
    }

    /// Get a signature for commits
    fn get_signature(&self) -> Result<Signature<'static>> {
        if let Ok(config) = self.repo.config() {
            if let (Ok(name), Ok(email)) = (
                config.get_string("user.name"),
                config.get_string("user.email"),
            ) {
                return Ok(Signature::now(&name, &email)?);
            }
        }

        Ok(Signature::now("Patchstack", "patchstack@example.com")?)
    }
}
