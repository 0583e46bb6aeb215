//! Stack management module
//!
//! This module implements the core patch stack functionality:
//! - Patch series and stack data structures
//! - Per-branch metadata and persistence
//! - Stack operations (new, refresh, push, pop, commit, cleanup)
//! - Branch lifecycle management

pub mod branch_manager;
pub mod manager;
pub mod metadata;
pub mod series;
pub mod stack;
pub mod store;
pub mod transaction;

pub use branch_manager::{BranchInfo, BranchManager};
pub use manager::{PatchCount, StackManager};
pub use metadata::{BranchMetadata, MetadataStore};
pub use series::{Patch, Series, SeriesFilter};
pub use stack::{patch_ref, Stack};
pub use store::StackStore;
