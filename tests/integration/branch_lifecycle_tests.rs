use super::test_helpers::*;
use predicates::prelude::*;

#[test]
fn test_branch_list_markers() {
    let (_temp_dir, repo_path) = create_test_repo();
    pstack_ok(&repo_path, &["branch", "--create", "foo"]);
    pstack_ok(&repo_path, &["branch", "--clone", "bar"]);

    let listing = pstack_ok(&repo_path, &["branch", "--list"]);
    let lines: Vec<&str> = listing.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], "> s \tbar\t| clone of foo");
    assert!(lines[1].starts_with("  s \tfoo"));
    assert!(lines[2].starts_with("    \tmaster"));
}

#[test]
fn test_switch_to_missing_branch_fails() {
    let (_temp_dir, repo_path) = create_test_repo();

    pstack(&repo_path)
        .args(["branch", "nope"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Branch \"nope\" does not exist"));
}

#[test]
fn test_create_without_autoinit() {
    let (_temp_dir, repo_path) = create_test_repo();
    let repo = git2::Repository::open(&repo_path).unwrap();
    repo.config()
        .unwrap()
        .set_bool("patchstack.autoinit", false)
        .unwrap();

    pstack_ok(&repo_path, &["branch", "--create", "plain"]);
    pstack(&repo_path)
        .arg("series")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("plain: branch not initialized"));
    pstack_ok(&repo_path, &["init"]);
}

#[test]
fn test_delete_branch() {
    let (_temp_dir, repo_path) = create_test_repo();
    pstack_ok(&repo_path, &["branch", "--create", "foo"]);
    pstack_ok(&repo_path, &["new", "p0"]);

    pstack(&repo_path)
        .args(["branch", "--delete", "foo"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("current branch"));

    pstack_ok(&repo_path, &["branch", "master"]);
    pstack(&repo_path)
        .args(["branch", "--delete", "foo"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Cannot clean up"));

    pstack_ok(&repo_path, &["branch", "--delete", "--force", "foo"]);
    assert_eq!(config_value(&repo_path, "branch.foo.patchstack.version"), None);
    assert!(!pstack_ok(&repo_path, &["branch", "--list"]).contains("foo"));
}

#[test]
fn test_rename_branch_keeps_stack() {
    let (_temp_dir, repo_path) = create_test_repo();
    pstack_ok(&repo_path, &["branch", "--create", "foo"]);
    pstack_ok(&repo_path, &["new", "p0"]);

    pstack_ok(&repo_path, &["branch", "--rename", "bar"]);
    assert_eq!(current_branch(&repo_path), "bar");
    assert_eq!(pstack_ok(&repo_path, &["series"]), "> p0\n");
    assert_eq!(config_value(&repo_path, "branch.foo.patchstack.version"), None);

    pstack(&repo_path)
        .args(["branch", "--rename"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("incorrect number of arguments"));
}
