use super::metadata::MetadataStore;
use super::series::{patch_name_from_message, Patch, SeriesFilter};
use super::store::StackStore;
use super::transaction::{HeadUpdate, StackTransaction};
use super::Stack;
use crate::config::Settings;
use crate::errors::{Result, StackError};
use crate::git::{GitRepository, Identity, MergeOutcome};
use git2::Oid;
use std::path::Path;
use tracing::{debug, info, warn};

/// How many patches a push, pop or commit acts on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchCount {
    Count(usize),
    All,
}

impl Default for PatchCount {
    fn default() -> Self {
        PatchCount::Count(1)
    }
}

impl PatchCount {
    /// Build from the `-a` / `-n N` command-line pair
    pub fn from_flags(all: bool, number: Option<usize>) -> Self {
        match (all, number) {
            (true, _) => PatchCount::All,
            (false, Some(n)) => PatchCount::Count(n),
            (false, None) => PatchCount::default(),
        }
    }

    fn resolve(self, available: usize) -> usize {
        match self {
            PatchCount::Count(n) => n.min(available),
            PatchCount::All => available,
        }
    }
}

/// Result of applying patches during a push
struct PushProgress {
    head: Oid,
    pushed: Vec<String>,
    conflict: Option<StackError>,
}

/// Owns every stack of a repository and implements the patch operations
pub struct StackManager {
    /// Git repository interface
    repo: GitRepository,
    /// Where stack bookkeeping is persisted
    store: StackStore,
    settings: Settings,
}

impl StackManager {
    /// Create a StackManager for the repository at `repo_path`
    pub fn new(repo_path: &Path) -> Result<Self> {
        let repo = GitRepository::open(repo_path)?;
        Self::from_repo(repo)
    }

    pub fn from_repo(repo: GitRepository) -> Result<Self> {
        let settings = Settings::load(&repo)?;
        let store = StackStore::new(repo.git_dir());
        debug!("Opened repository at {}", repo.path().display());
        Ok(Self {
            repo,
            store,
            settings,
        })
    }

    pub fn git_repo(&self) -> &GitRepository {
        &self.repo
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    fn metadata(&self) -> MetadataStore<'_> {
        MetadataStore::new(&self.repo)
    }

    /// Whether `branch` carries a stack
    pub fn exists(&self, branch: &str) -> Result<bool> {
        self.metadata().exists(branch)
    }

    /// Load the stack of an initialized branch
    pub fn load_stack(&self, branch: &str) -> Result<Stack> {
        if !self.exists(branch)? {
            return Err(StackError::not_initialized(branch));
        }

        let stack = self.store.load(branch)?.ok_or_else(|| {
            StackError::inconsistent(format!(
                "'{}' is initialized but its stack data is missing",
                branch
            ))
        })?;

        if !self.repo.commit_exists(parse_oid(&stack.base)?) {
            return Err(StackError::inconsistent(format!(
                "base commit {} of '{}' is missing",
                stack.base, branch
            )));
        }

        Ok(stack)
    }

    /// Create an empty stack on `branch`, based on its current head
    pub fn init(&self, branch: &str) -> Result<()> {
        let head = self.repo.get_branch_head(branch)?;
        if self.exists(branch)? {
            return Err(StackError::AlreadyInitialized(branch.to_string()));
        }

        let stack = Stack::new(branch.to_string(), head.to_string());
        self.store.save(&stack)?;
        // The marker is written last: a stack exists once it is present
        self.metadata().initialize(branch)?;

        info!("Initialized stack on '{}' at {}", branch, head);
        Ok(())
    }

    /// Create a new empty patch on top of the stack and return its name
    pub fn new_patch(
        &self,
        branch: &str,
        name: Option<&str>,
        message: Option<&str>,
    ) -> Result<String> {
        let mut stack = self.load_stack(branch)?;
        self.require_current(branch)?;
        let head = self.check_head(&stack)?;

        let message = match (name, message) {
            (_, Some(message)) if !message.trim().is_empty() => message.to_string(),
            (Some(name), _) => name.to_string(),
            _ => {
                return Err(StackError::validation(
                    "a patch name or a message is required",
                ))
            }
        };

        let name = match name {
            Some(name) => {
                validate_patch_name(branch, name)?;
                if stack.series.contains(name) {
                    return Err(StackError::DuplicatePatch(name.to_string()));
                }
                name.to_string()
            }
            None => stack.series.unique_name(&patch_name_from_message(
                &message,
                self.settings.name_length,
            )),
        };

        let tree = self.repo.commit_tree(head)?;
        let commit = self.repo.create_commit(tree, head, &message, None)?;
        let author = self.repo.commit_author(commit)?;

        stack.series.push_applied(Patch::new(
            name.clone(),
            commit.to_string(),
            message,
            author.name,
            author.email,
        ))?;

        let mut tx = StackTransaction::begin(&self.repo, branch)?;
        tx.set_patch_ref(&stack.patch_ref(&name), commit)?;
        tx.set_head(commit, HeadUpdate::RefOnly);
        tx.finish(&self.store, &mut stack)?;

        info!("Created patch '{}' on '{}'", name, branch);
        Ok(name)
    }

    /// Fold tracked working-tree changes into the top patch; false when nothing changed
    pub fn refresh(&self, branch: &str) -> Result<bool> {
        let mut stack = self.load_stack(branch)?;
        self.require_current(branch)?;
        self.check_head(&stack)?;

        let top = stack
            .series
            .top()
            .cloned()
            .ok_or_else(|| StackError::validation("no patches applied"))?;
        let top_commit = parse_oid(&top.commit_hash)?;

        let tree = self.repo.capture_worktree()?;
        if tree == self.repo.commit_tree(top_commit)? {
            debug!("Patch '{}' is already up to date", top.name);
            return Ok(false);
        }

        let parent = self.repo.commit_parent(top_commit)?.ok_or_else(|| {
            StackError::inconsistent(format!("patch '{}' has no parent commit", top.name))
        })?;
        let author = Identity {
            name: top.author_name.clone(),
            email: top.author_email.clone(),
        };
        let commit = self
            .repo
            .create_commit(tree, parent, &top.message, Some(&author))?;

        if let Some(patch) = stack.series.top_mut() {
            patch.set_commit(commit.to_string());
        }

        let mut tx = StackTransaction::begin(&self.repo, branch)?;
        tx.set_patch_ref(&stack.patch_ref(&top.name), commit)?;
        tx.set_head(commit, HeadUpdate::RefOnly);
        tx.finish(&self.store, &mut stack)?;

        info!("Refreshed patch '{}'", top.name);
        Ok(true)
    }

    /// Apply unapplied patches in order; returns the names pushed.
    ///
    /// On a conflict the patches applied so far stay applied, the tree is
    /// left at the last good patch and `ApplyConflict` is returned.
    pub fn push(&self, branch: &str, count: PatchCount) -> Result<Vec<String>> {
        let mut stack = self.load_stack(branch)?;
        self.require_current(branch)?;
        self.require_clean()?;
        let head = self.check_head(&stack)?;

        let available = stack.series.unapplied().len();
        if available == 0 {
            return Err(StackError::validation("no unapplied patches"));
        }

        let mut tx = StackTransaction::begin(&self.repo, branch)?;
        let n = count.resolve(available);
        let progress = match self.apply_patches(&mut stack, &mut tx, n, head) {
            Ok(progress) => progress,
            Err(e) => {
                tx.abort();
                return Err(e);
            }
        };
        let PushProgress {
            head: current,
            pushed,
            conflict,
        } = progress;

        if !pushed.is_empty() {
            tx.set_head(current, HeadUpdate::Checkout);
            tx.finish(&self.store, &mut stack)?;
            info!("Pushed {} patch(es) onto '{}'", pushed.len(), branch);
        }

        match conflict {
            Some(conflict) => Err(conflict),
            None => Ok(pushed),
        }
    }

    /// Unapply the top patches; returns the names popped, top first in series order
    pub fn pop(&self, branch: &str, count: PatchCount) -> Result<Vec<String>> {
        let mut stack = self.load_stack(branch)?;
        self.require_current(branch)?;
        self.require_clean()?;

        let applied = stack.series.applied().len();
        if applied == 0 {
            return Err(StackError::validation("no patches applied"));
        }

        let head = self.repo.get_branch_head(branch)?;
        if head.to_string() != stack.expected_head() {
            return Err(StackError::PopConflict(format!(
                "HEAD of '{}' has moved away from the top patch",
                branch
            )));
        }

        let n = count.resolve(applied);
        let target = self.verify_applied_chain(&stack, applied - n)?;

        let popped = stack.series.retreat(n);

        let mut tx = StackTransaction::begin(&self.repo, branch)?;
        tx.set_head(target, HeadUpdate::Checkout);
        tx.finish(&self.store, &mut stack)?;

        match stack.series.top() {
            Some(top) => info!("Popped {:?}; now at patch '{}'", popped, top.name),
            None => info!("Popped {:?}; no patches applied", popped),
        }
        Ok(popped)
    }

    /// Permanently fold the bottom applied patches into history
    pub fn commit(&self, branch: &str, count: PatchCount) -> Result<Vec<String>> {
        let mut stack = self.load_stack(branch)?;
        self.check_head(&stack)?;

        let applied = stack.series.applied().len();
        if applied == 0 {
            return Err(StackError::validation("no patches applied"));
        }

        let committed = stack.series.take_applied_prefix(count.resolve(applied));
        if let Some(last) = committed.last() {
            stack.base = last.commit_hash.clone();
        }

        let mut tx = StackTransaction::begin(&self.repo, branch)?;
        for patch in &committed {
            if let Err(e) = tx.delete_patch_ref(&stack.patch_ref(&patch.name)) {
                tx.abort();
                return Err(e);
            }
        }
        tx.finish(&self.store, &mut stack)?;

        let names: Vec<String> = committed.into_iter().map(|patch| patch.name).collect();
        info!("Committed {:?} on '{}'", names, branch);
        Ok(names)
    }

    /// Remove the stack of `branch`; without `force` only an empty stack is removed
    pub fn cleanup(&self, branch: &str, force: bool) -> Result<()> {
        if !self.exists(branch)? {
            return Err(StackError::not_initialized(branch));
        }

        match self.store.load(branch) {
            Ok(Some(stack)) if !force && !stack.is_empty() => {
                return Err(StackError::NonEmptySeries)
            }
            Ok(_) => {}
            Err(e) if force => warn!("Discarding unreadable stack of '{}': {}", branch, e),
            Err(e) => return Err(e),
        }

        self.destroy(branch)?;
        info!("Cleaned up stack of '{}'", branch);
        Ok(())
    }

    /// Remove a stack with its patch refs, data file and metadata record
    pub fn destroy(&self, branch: &str) -> Result<()> {
        let stack = self.store.load(branch);
        // Marker first: a partial teardown must not look initialized
        self.metadata().remove(branch)?;
        if let Ok(Some(stack)) = stack {
            for name in stack.names(SeriesFilter::All) {
                self.repo.delete_reference(&stack.patch_ref(&name))?;
            }
        }
        self.store.remove(branch)?;

        debug!("Destroyed stack of '{}'", branch);
        Ok(())
    }

    /// Patch names of a branch, filtered by state
    pub fn series(&self, branch: &str, filter: SeriesFilter) -> Result<Vec<String>> {
        Ok(self.load_stack(branch)?.names(filter))
    }

    /// Name of the topmost applied patch
    pub fn top(&self, branch: &str) -> Result<Option<String>> {
        Ok(self
            .load_stack(branch)?
            .series
            .top()
            .map(|patch| patch.name.clone()))
    }

    /// Delete patches. Unapplied patches are dropped; applied ones must form
    /// the top of the stack and are popped first.
    pub fn delete_patches(&self, branch: &str, names: &[String]) -> Result<()> {
        if names.is_empty() {
            return Err(StackError::invalid_arguments());
        }

        let mut unique: Vec<String> = Vec::with_capacity(names.len());
        for name in names {
            if !unique.contains(name) {
                unique.push(name.clone());
            }
        }
        let names = unique.as_slice();

        let mut stack = self.load_stack(branch)?;
        for name in names {
            if !stack.series.contains(name) {
                return Err(StackError::UnknownPatch(name.clone()));
            }
        }

        let applied_count = names
            .iter()
            .filter(|name| stack.series.is_applied(name))
            .count();

        let mut tx = StackTransaction::begin(&self.repo, branch)?;
        if applied_count > 0 {
            self.require_current(branch)?;
            self.require_clean()?;
            self.check_head(&stack)?;

            let applied = stack.series.applied();
            let top_names = &applied[applied.len() - applied_count..];
            if let Some(buried) = top_names.iter().find(|patch| !names.contains(&patch.name)) {
                return Err(StackError::validation(format!(
                    "cannot delete applied patches below '{}'; pop them first",
                    buried.name
                )));
            }

            let target = self.verify_applied_chain(&stack, applied.len() - applied_count)?;
            stack.series.retreat(applied_count);
            tx.set_head(target, HeadUpdate::Checkout);
        }

        for name in names {
            stack.series.remove_unapplied(name);
            if let Err(e) = tx.delete_patch_ref(&stack.patch_ref(name)) {
                tx.abort();
                return Err(e);
            }
        }
        tx.finish(&self.store, &mut stack)?;

        info!("Deleted {:?} from '{}'", names, branch);
        Ok(())
    }

    /// Copy the stack of `source` onto the existing branch `target`.
    /// Returns false when `source` has no stack.
    pub fn clone_stack(&self, source: &str, target: &str) -> Result<bool> {
        if !self.exists(source)? {
            debug!("'{}' has no stack to clone", source);
            return Ok(false);
        }
        if self.exists(target)? {
            return Err(StackError::AlreadyInitialized(target.to_string()));
        }

        let stack = self.load_stack(source)?;
        let clone = stack.duplicate_for(target);

        for patch in clone.series.patches(SeriesFilter::All) {
            let commit = parse_oid(&patch.commit_hash)?;
            self.repo
                .set_reference(&clone.patch_ref(&patch.name), commit, "patchstack: clone")?;
        }
        self.store.save(&clone)?;
        self.metadata().copy(source, target)?;

        info!("Cloned stack of '{}' to '{}'", source, target);
        Ok(true)
    }

    /// Move the stack of `old` to `new` after a branch rename.
    /// Returns false when `old` has no stack.
    pub fn rename_stack(&self, old: &str, new: &str) -> Result<bool> {
        if !self.exists(old)? {
            self.metadata().rename(old, new)?;
            return Ok(false);
        }

        let mut stack = self.load_stack(old)?;
        let names = stack.names(SeriesFilter::All);
        stack.branch = new.to_string();
        stack.touch();

        for name in &names {
            let old_ref = super::patch_ref(old, name);
            if let Some(commit) = self.repo.reference_target(&old_ref)? {
                self.repo
                    .set_reference(&stack.patch_ref(name), commit, "patchstack: rename")?;
            }
            self.repo.delete_reference(&old_ref)?;
        }
        self.store.save(&stack)?;
        self.store.remove(old)?;
        self.metadata().rename(old, new)?;

        info!("Moved stack of '{}' to '{}'", old, new);
        Ok(true)
    }

    /// Apply up to `count` unapplied patches onto `onto`, stopping at the first conflict
    fn apply_patches(
        &self,
        stack: &mut Stack,
        tx: &mut StackTransaction<'_>,
        count: usize,
        onto: Oid,
    ) -> Result<PushProgress> {
        let mut current = onto;
        let mut pushed = Vec::new();

        for _ in 0..count {
            let patch = match stack.series.next_unapplied() {
                Some(patch) => patch.clone(),
                None => break,
            };
            let commit = parse_oid(&patch.commit_hash)?;

            let applied = if self.repo.commit_parent(commit)? == Some(current) {
                debug!("Fast-forwarding patch '{}'", patch.name);
                commit
            } else {
                match self.repo.replay_commit(commit, current)? {
                    MergeOutcome::Clean(tree) => {
                        if tree == self.repo.commit_tree(current)? {
                            info!("Patch '{}' is now empty", patch.name);
                        }
                        let author = Identity {
                            name: patch.author_name.clone(),
                            email: patch.author_email.clone(),
                        };
                        self.repo
                            .create_commit(tree, current, &patch.message, Some(&author))?
                    }
                    MergeOutcome::Conflicted(files) => {
                        warn!("Patch '{}' conflicts in {:?}", patch.name, files);
                        return Ok(PushProgress {
                            head: current,
                            pushed,
                            conflict: Some(StackError::ApplyConflict {
                                patch: patch.name,
                                files,
                            }),
                        });
                    }
                }
            };

            tx.set_patch_ref(&stack.patch_ref(&patch.name), applied)?;
            stack.series.advance(applied.to_string());
            current = applied;
            pushed.push(patch.name);
        }

        Ok(PushProgress {
            head: current,
            pushed,
            conflict: None,
        })
    }

    fn require_current(&self, branch: &str) -> Result<()> {
        let current = self.repo.get_current_branch()?;
        if current != branch {
            return Err(StackError::validation(format!(
                "'{}' is not the current branch (on '{}')",
                branch, current
            )));
        }
        Ok(())
    }

    fn require_clean(&self) -> Result<()> {
        if self.repo.has_local_changes()? {
            return Err(StackError::LocalChanges);
        }
        Ok(())
    }

    /// Check that the branch head matches the recorded stack top
    fn check_head(&self, stack: &Stack) -> Result<Oid> {
        let head = self.repo.get_branch_head(&stack.branch)?;
        if head.to_string() != stack.expected_head() {
            return Err(StackError::inconsistent(format!(
                "HEAD of '{}' ({}) does not match the stack top ({}); \
                 the branch was changed outside the stack",
                stack.branch,
                head,
                stack.expected_head()
            )));
        }
        Ok(head)
    }

    /// Check that applied patches above position `keep` still chain onto each
    /// other, and return the commit the branch falls back to when they are popped
    fn verify_applied_chain(&self, stack: &Stack, keep: usize) -> Result<Oid> {
        let applied = stack.series.applied();
        let target = match keep {
            0 => parse_oid(&stack.base)?,
            n => parse_oid(&applied[n - 1].commit_hash)?,
        };

        let mut below = target;
        for patch in &applied[keep..] {
            let commit = parse_oid(&patch.commit_hash)?;
            if self.repo.commit_parent(commit)? != Some(below) {
                return Err(StackError::PopConflict(format!(
                    "patch '{}' is no longer based on the commit below it",
                    patch.name
                )));
            }
            below = commit;
        }

        Ok(target)
    }
}

fn parse_oid(hash: &str) -> Result<Oid> {
    Oid::from_str(hash)
        .map_err(|_| StackError::inconsistent(format!("invalid commit id '{}'", hash)))
}

fn validate_patch_name(branch: &str, name: &str) -> Result<()> {
    if name.is_empty()
        || name.contains('/')
        || name.chars().any(char::is_whitespace)
        || !GitRepository::is_valid_reference_name(&super::patch_ref(branch, name))
    {
        return Err(StackError::validation(format!(
            "invalid patch name \"{}\"",
            name
        )));
    }
    Ok(())
}
