use super::store::StackStore;
use super::Stack;
use crate::errors::Result;
use crate::git::GitRepository;
use git2::Oid;
use tracing::{debug, warn};

/// How a head change reaches the working tree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeadUpdate {
    /// Move the branch reference only; the tree already matches
    RefOnly,
    /// Check out the target on the (current) branch, index and working tree
    Checkout,
}

/// Groups the reference, HEAD and bookkeeping changes of one stack operation.
///
/// Patch references are updated eagerly and remembered; the branch head and
/// the stack file are written by [`StackTransaction::finish`]. If any step of
/// `finish` fails, every recorded change is reverted before the error is
/// returned.
pub struct StackTransaction<'r> {
    repo: &'r GitRepository,
    branch: String,
    old_head: Oid,
    new_head: Option<(Oid, HeadUpdate)>,
    ref_log: Vec<(String, Option<Oid>)>,
}

impl<'r> StackTransaction<'r> {
    pub fn begin(repo: &'r GitRepository, branch: &str) -> Result<Self> {
        let old_head = repo.get_branch_head(branch)?;
        Ok(Self {
            repo,
            branch: branch.to_string(),
            old_head,
            new_head: None,
            ref_log: Vec::new(),
        })
    }

    /// Point a patch reference at a commit
    pub fn set_patch_ref(&mut self, name: &str, target: Oid) -> Result<()> {
        self.remember(name)?;
        self.repo.set_reference(name, target, "patchstack: update patch")
    }

    /// Delete a patch reference
    pub fn delete_patch_ref(&mut self, name: &str) -> Result<()> {
        self.remember(name)?;
        self.repo.delete_reference(name)
    }

    /// Schedule the branch to move to `target`
    pub fn set_head(&mut self, target: Oid, update: HeadUpdate) {
        self.new_head = Some((target, update));
    }

    /// Apply the head change and persist the stack, reverting everything on failure
    pub fn finish(self, store: &StackStore, stack: &mut Stack) -> Result<()> {
        stack.touch();

        let result = self.apply_head().and_then(|()| store.save(stack));
        if let Err(e) = result {
            warn!("Stack update for '{}' failed, rolling back: {}", self.branch, e);
            self.rollback();
            return Err(e);
        }

        Ok(())
    }

    /// Revert recorded changes without persisting anything
    pub fn abort(self) {
        self.rollback();
    }

    fn remember(&mut self, name: &str) -> Result<()> {
        if !self.ref_log.iter().any(|(logged, _)| logged == name) {
            let previous = self.repo.reference_target(name)?;
            self.ref_log.push((name.to_string(), previous));
        }
        Ok(())
    }

    fn apply_head(&self) -> Result<()> {
        match self.new_head {
            Some((target, _)) if target == self.old_head => Ok(()),
            Some((target, HeadUpdate::Checkout)) => self.repo.checkout_commit(target),
            Some((target, HeadUpdate::RefOnly)) => {
                self.repo
                    .set_branch_target(&self.branch, target, "patchstack: update head")
            }
            None => Ok(()),
        }
    }

    fn rollback(&self) {
        if let Some((target, update)) = self.new_head {
            if target != self.old_head {
                let restored = match update {
                    HeadUpdate::Checkout => self.repo.reset_hard(self.old_head),
                    HeadUpdate::RefOnly => self.repo.set_branch_target(
                        &self.branch,
                        self.old_head,
                        "patchstack: rollback",
                    ),
                };
                if let Err(e) = restored {
                    warn!("Could not restore '{}' to {}: {}", self.branch, self.old_head, e);
                }
            }
        }

        for (name, previous) in self.ref_log.iter().rev() {
            let restored = match previous {
                Some(target) => self
                    .repo
                    .set_reference(name, *target, "patchstack: rollback"),
                None => self.repo.delete_reference(name),
            };
            if let Err(e) = restored {
                warn!("Could not restore reference {}: {}", name, e);
            }
        }

        debug!("Rolled back stack transaction on '{}'", self.branch);
    }
}
