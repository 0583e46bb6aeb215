//! Shared fixtures for unit tests.

use git2::{Oid, Repository, RepositoryInitOptions, Signature};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Create a repository on `master` with one commit containing README.md
pub fn create_test_repo() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let repo_path = temp_dir.path().to_path_buf();

    let mut options = RepositoryInitOptions::new();
    options.initial_head("master");
    let repo = Repository::init_opts(&repo_path, &options).unwrap();

    {
        let mut config = repo.config().unwrap();
        config.set_str("user.name", "Test User").unwrap();
        config.set_str("user.email", "test@example.com").unwrap();
    }

    commit_file(&repo_path, "README.md", "# Test Repo\n", "Initial commit");

    (temp_dir, repo_path)
}

/// Write a file, stage it and commit on the current branch
pub fn commit_file(repo_path: &Path, name: &str, content: &str, message: &str) -> Oid {
    let repo = Repository::open(repo_path).unwrap();
    std::fs::write(repo_path.join(name), content).unwrap();

    let mut index = repo.index().unwrap();
    index.add_path(Path::new(name)).unwrap();
    index.write().unwrap();
    let tree_id = index.write_tree().unwrap();
    let tree = repo.find_tree(tree_id).unwrap();

    let signature = Signature::now("Test User", "test@example.com").unwrap();
    let parents = match repo.head().ok().and_then(|head| head.peel_to_commit().ok()) {
        Some(parent) => vec![parent],
        None => Vec::new(),
    };
    let parent_refs: Vec<&git2::Commit> = parents.iter().collect();

    repo.commit(
        Some("HEAD"),
        &signature,
        &signature,
        message,
        &tree,
        &parent_refs,
    )
    .unwrap()
}

/// Stage a file without committing
pub fn stage_file(repo_path: &Path, name: &str, content: &str) {
    let repo = Repository::open(repo_path).unwrap();
    std::fs::write(repo_path.join(name), content).unwrap();

    let mut index = repo.index().unwrap();
    index.add_path(Path::new(name)).unwrap();
    index.write().unwrap();
}
