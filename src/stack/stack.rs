use super::series::{Series, SeriesFilter};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Namespace holding one reference per tracked patch commit
pub const PATCH_REF_PREFIX: &str = "refs/patches";

/// Bookkeeping for the patch stack of one branch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stack {
    /// Unique identifier for this stack record
    pub id: Uuid,
    /// Branch owning this stack (looked up by name, never held)
    pub branch: String,
    /// Commit the bottommost patch is built on
    pub base: String,
    /// Applied and unapplied patches
    pub series: Series,
    /// When this stack was created
    pub created_at: DateTime<Utc>,
    /// When this stack was last updated
    pub updated_at: DateTime<Utc>,
}

impl Stack {
    /// Create a new empty stack on `base`
    pub fn new(branch: String, base: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            branch,
            base,
            series: Series::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Commit the branch HEAD must point at: the top applied patch, or the base
    pub fn expected_head(&self) -> &str {
        self.series
            .top()
            .map(|patch| patch.commit_hash.as_str())
            .unwrap_or(&self.base)
    }

    /// Check if the stack tracks no patches at all
    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    pub fn names(&self, filter: SeriesFilter) -> Vec<String> {
        self.series.names(filter)
    }

    /// Reference keeping a patch commit of this stack reachable
    pub fn patch_ref(&self, patch: &str) -> String {
        patch_ref(&self.branch, patch)
    }

    /// Record a modification
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Duplicate this stack for another branch under a fresh identity
    pub fn duplicate_for(&self, branch: &str) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            branch: branch.to_string(),
            base: self.base.clone(),
            series: self.series.clone(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Validate the stack structure
    pub fn validate(&self) -> Result<(), String> {
        if self.base.is_empty() {
            return Err(format!("Stack for '{}' has no base commit", self.branch));
        }
        self.series.validate()
    }
}

/// Reference name for a patch of a branch
pub fn patch_ref(branch: &str, patch: &str) -> String {
    format!("{PATCH_REF_PREFIX}/{branch}/{patch}")
}
