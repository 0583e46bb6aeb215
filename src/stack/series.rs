use crate::errors::{StackError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A named patch tracked by a stack
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Patch {
    /// Name, unique within its stack
    pub name: String,
    /// Commit carrying the patch's change relative to its parent
    pub commit_hash: String,
    /// Commit message
    pub message: String,
    pub author_name: String,
    pub author_email: String,
    /// When this patch was created
    pub created_at: DateTime<Utc>,
    /// When this patch's content or position last changed
    pub updated_at: DateTime<Utc>,
}

impl Patch {
    pub fn new(
        name: String,
        commit_hash: String,
        message: String,
        author_name: String,
        author_email: String,
    ) -> Self {
        let now = Utc::now();
        Self {
            name,
            commit_hash,
            message,
            author_name,
            author_email,
            created_at: now,
            updated_at: now,
        }
    }

    /// Point this patch at a new commit
    pub fn set_commit(&mut self, commit_hash: String) {
        self.commit_hash = commit_hash;
        self.updated_at = Utc::now();
    }

    /// First line of the message
    pub fn summary(&self) -> &str {
        self.message.lines().next().unwrap_or("")
    }
}

/// Which part of a series to list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SeriesFilter {
    Applied,
    Unapplied,
    #[default]
    All,
}

/// Ordered patches split into an applied prefix and an unapplied suffix.
///
/// The two halves are kept as separate vectors so that moving one patch
/// between them is the unit of progress for push and pop.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Series {
    applied: Vec<Patch>,
    unapplied: Vec<Patch>,
}

impl Series {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn applied(&self) -> &[Patch] {
        &self.applied
    }

    pub fn unapplied(&self) -> &[Patch] {
        &self.unapplied
    }

    /// Total number of patches, applied and unapplied
    pub fn len(&self) -> usize {
        self.applied.len() + self.unapplied.len()
    }

    pub fn is_empty(&self) -> bool {
        self.applied.is_empty() && self.unapplied.is_empty()
    }

    /// Topmost applied patch
    pub fn top(&self) -> Option<&Patch> {
        self.applied.last()
    }

    pub fn top_mut(&mut self) -> Option<&mut Patch> {
        self.applied.last_mut()
    }

    /// Next patch a push would apply
    pub fn next_unapplied(&self) -> Option<&Patch> {
        self.unapplied.first()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn get(&self, name: &str) -> Option<&Patch> {
        self.applied
            .iter()
            .chain(self.unapplied.iter())
            .find(|patch| patch.name == name)
    }

    pub fn is_applied(&self, name: &str) -> bool {
        self.applied.iter().any(|patch| patch.name == name)
    }

    /// Patches in series order, filtered by state
    pub fn patches(&self, filter: SeriesFilter) -> Vec<&Patch> {
        match filter {
            SeriesFilter::Applied => self.applied.iter().collect(),
            SeriesFilter::Unapplied => self.unapplied.iter().collect(),
            SeriesFilter::All => self.applied.iter().chain(self.unapplied.iter()).collect(),
        }
    }

    /// Patch names in series order, filtered by state
    pub fn names(&self, filter: SeriesFilter) -> Vec<String> {
        self.patches(filter)
            .into_iter()
            .map(|patch| patch.name.clone())
            .collect()
    }

    /// Append a patch on top of the applied region
    pub fn push_applied(&mut self, patch: Patch) -> Result<()> {
        if self.contains(&patch.name) {
            return Err(StackError::DuplicatePatch(patch.name));
        }
        self.applied.push(patch);
        Ok(())
    }

    /// Move the next unapplied patch onto the applied region, now carried by `commit_hash`
    pub fn advance(&mut self, commit_hash: String) -> Option<&Patch> {
        if self.unapplied.is_empty() {
            return None;
        }
        let mut patch = self.unapplied.remove(0);
        if patch.commit_hash != commit_hash {
            patch.set_commit(commit_hash);
        }
        self.applied.push(patch);
        self.applied.last()
    }

    /// Move the top `count` applied patches back to the front of the unapplied region
    pub fn retreat(&mut self, count: usize) -> Vec<String> {
        let count = count.min(self.applied.len());
        let split = self.applied.len() - count;
        let mut popped: Vec<Patch> = self.applied.drain(split..).collect();
        let names = popped.iter().map(|patch| patch.name.clone()).collect();
        popped.append(&mut self.unapplied);
        self.unapplied = popped;
        names
    }

    /// Remove the bottom `count` applied patches from tracking
    pub fn take_applied_prefix(&mut self, count: usize) -> Vec<Patch> {
        let count = count.min(self.applied.len());
        self.applied.drain(..count).collect()
    }

    /// Remove an unapplied patch by name
    pub fn remove_unapplied(&mut self, name: &str) -> Option<Patch> {
        let position = self.unapplied.iter().position(|patch| patch.name == name)?;
        Some(self.unapplied.remove(position))
    }

    /// Pick a name derived from `base` that is not yet used in this series
    pub fn unique_name(&self, base: &str) -> String {
        if !self.contains(base) {
            return base.to_string();
        }

        let mut counter = 1;
        loop {
            let candidate = format!("{base}-{counter}");
            if !self.contains(&candidate) {
                return candidate;
            }
            counter += 1;
        }
    }

    /// Validate the series structure
    pub fn validate(&self) -> std::result::Result<(), String> {
        let mut seen = HashSet::new();
        for patch in self.applied.iter().chain(self.unapplied.iter()) {
            if patch.name.is_empty() {
                return Err("Patch with an empty name".to_string());
            }
            if !seen.insert(patch.name.as_str()) {
                return Err(format!("Duplicate patch name '{}'", patch.name));
            }
        }
        Ok(())
    }
}

/// Generate a patch name from a commit message
pub fn patch_name_from_message(message: &str, max_len: usize) -> String {
    let summary = message.lines().next().unwrap_or("");
    let base_name = summary
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-");

    let truncated: String = base_name.chars().take(max_len).collect();
    let truncated = truncated.trim_end_matches('-');

    if truncated.is_empty() {
        "patch".to_string()
    } else {
        truncated.to_string()
    }
}
