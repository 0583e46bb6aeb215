use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use git2::{Repository, RepositoryInitOptions, Signature};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Create a test repository on `master` with one commit containing README.md
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

    commit_file(&repo_path, "README.md", "# Test Repository\n", "Initial commit");

    (temp_dir, repo_path)
}

/// Commit a file directly with git, bypassing the stack
pub fn commit_file(repo_path: &Path, name: &str, content: &str, message: &str) {
    let repo = Repository::open(repo_path).unwrap();
    std::fs::write(repo_path.join(name), content).unwrap();

    let mut index = repo.index().unwrap();
    index.add_path(Path::new(name)).unwrap();
    index.write().unwrap();
    let tree = repo.find_tree(index.write_tree().unwrap()).unwrap();

    let signature = Signature::now("Test User", "test@example.com").unwrap();
    let parent = repo.head().ok().and_then(|head| head.peel_to_commit().ok());
    let parents: Vec<&git2::Commit> = parent.iter().collect();

    repo.commit(Some("HEAD"), &signature, &signature, message, &tree, &parents)
        .unwrap();
}

/// Overwrite a tracked file in the working tree
pub fn write_file(repo_path: &Path, name: &str, content: &str) {
    std::fs::write(repo_path.join(name), content).unwrap();
}

/// Read a key from the repository's git configuration
pub fn config_value(repo_path: &Path, key: &str) -> Option<String> {
    let repo = Repository::open(repo_path).unwrap();
    let config = repo.config().unwrap().snapshot().unwrap();
    config.get_string(key).ok()
}

pub fn current_branch(repo_path: &Path) -> String {
    let repo = Repository::open(repo_path).unwrap();
    let head = repo.head().unwrap();
    head.shorthand().unwrap().to_string()
}

/// The binary, run inside `repo_path` without colors
pub fn pstack(repo_path: &Path) -> Command {
    let mut cmd = cargo_bin_cmd!("pstack");
    cmd.current_dir(repo_path).arg("--no-color");
    cmd
}

/// Run the binary and return its stdout, asserting success
pub fn pstack_ok(repo_path: &Path, args: &[&str]) -> String {
    let output = pstack(repo_path).args(args).assert().success();
    String::from_utf8(output.get_output().stdout.clone()).unwrap()
}
