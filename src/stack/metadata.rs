use crate::errors::Result;
use crate::git::GitRepository;
use serde::{Deserialize, Serialize};

/// Format version written as the stack existence marker
pub const STACK_FORMAT_VERSION: &str = "1";

const VERSION_KEY: &str = "version";
const PARENT_BRANCH_KEY: &str = "parentbranch";
const DESCRIPTION_KEY: &str = "description";
const ALL_KEYS: [&str; 3] = [VERSION_KEY, PARENT_BRANCH_KEY, DESCRIPTION_KEY];

/// Per-branch record kept in the repository configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchMetadata {
    /// Stack format version; `None` when the branch has no stack
    pub version: Option<String>,
    /// Branch this branch was created from
    pub parent_branch: Option<String>,
    /// Free-form description
    pub description: Option<String>,
}

impl BranchMetadata {
    pub fn is_initialized(&self) -> bool {
        self.version.is_some()
    }
}

/// Reads and writes `branch.<name>.patchstack.*` configuration keys
pub struct MetadataStore<'a> {
    repo: &'a GitRepository,
}

impl<'a> MetadataStore<'a> {
    pub fn new(repo: &'a GitRepository) -> Self {
        Self { repo }
    }

    /// Configuration key for one field of a branch's record
    pub fn key(branch: &str, field: &str) -> String {
        format!("branch.{branch}.patchstack.{field}")
    }

    /// Whether the branch carries a stack; absence of the marker is authoritative
    pub fn exists(&self, branch: &str) -> Result<bool> {
        Ok(self
            .repo
            .config_get(&Self::key(branch, VERSION_KEY))?
            .is_some())
    }

    /// Load the whole record for a branch
    pub fn load(&self, branch: &str) -> Result<BranchMetadata> {
        Ok(BranchMetadata {
            version: self.repo.config_get(&Self::key(branch, VERSION_KEY))?,
            parent_branch: self.repo.config_get(&Self::key(branch, PARENT_BRANCH_KEY))?,
            description: self.repo.config_get(&Self::key(branch, DESCRIPTION_KEY))?,
        })
    }

    /// Write the existence marker
    pub fn initialize(&self, branch: &str) -> Result<()> {
        self.repo
            .config_set(&Self::key(branch, VERSION_KEY), STACK_FORMAT_VERSION)?;
        tracing::debug!("Recorded stack marker for '{}'", branch);
        Ok(())
    }

    /// Remove every key of the record; keys already missing are ignored
    pub fn remove(&self, branch: &str) -> Result<()> {
        for field in ALL_KEYS {
            self.repo.config_remove(&Self::key(branch, field))?;
        }
        tracing::debug!("Removed metadata record for '{}'", branch);
        Ok(())
    }

    pub fn parent_branch(&self, branch: &str) -> Result<Option<String>> {
        self.repo.config_get(&Self::key(branch, PARENT_BRANCH_KEY))
    }

    pub fn set_parent_branch(&self, branch: &str, parent: &str) -> Result<()> {
        self.repo
            .config_set(&Self::key(branch, PARENT_BRANCH_KEY), parent)
    }

    pub fn description(&self, branch: &str) -> Result<Option<String>> {
        self.repo.config_get(&Self::key(branch, DESCRIPTION_KEY))
    }

    pub fn set_description(&self, branch: &str, description: &str) -> Result<()> {
        self.repo
            .config_set(&Self::key(branch, DESCRIPTION_KEY), description)
    }

    /// Store a record under a branch, replacing whatever was there
    pub fn store(&self, branch: &str, record: &BranchMetadata) -> Result<()> {
        self.remove(branch)?;
        let fields = [
            (VERSION_KEY, &record.version),
            (PARENT_BRANCH_KEY, &record.parent_branch),
            (DESCRIPTION_KEY, &record.description),
        ];
        for (field, value) in fields {
            if let Some(value) = value {
                self.repo.config_set(&Self::key(branch, field), value)?;
            }
        }
        Ok(())
    }

    /// Copy a record to another branch
    pub fn copy(&self, from: &str, to: &str) -> Result<()> {
        let record = self.load(from)?;
        self.store(to, &record)
    }

    /// Move a record to another branch
    pub fn rename(&self, from: &str, to: &str) -> Result<()> {
        self.copy(from, to)?;
        self.remove(from)
    }
}
