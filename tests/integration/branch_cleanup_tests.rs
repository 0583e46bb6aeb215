use super::test_helpers::*;
use predicates::prelude::*;

/// Full lifecycle of stack cleanup across a branch and its clone
#[test]
fn test_branch_cleanup_lifecycle() {
    let (_temp_dir, repo_path) = create_test_repo();

    // A new branch carries an empty stack
    pstack_ok(&repo_path, &["branch", "--create", "foo"]);
    assert_eq!(current_branch(&repo_path), "foo");
    assert_eq!(pstack_ok(&repo_path, &["series"]), "");

    // One patch, created and refreshed
    pstack_ok(&repo_path, &["new", "p0", "-m", "p0"]);
    write_file(&repo_path, "README.md", "# Changed by p0\n");
    pstack_ok(&repo_path, &["refresh"]);
    assert_eq!(pstack_ok(&repo_path, &["series"]), "> p0\n");

    pstack(&repo_path)
        .args(["branch", "--cleanup"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Cannot clean up"));

    // Unapplied patches still count
    pstack_ok(&repo_path, &["pop"]);
    assert_eq!(
        pstack_ok(&repo_path, &["series", "--unapplied", "--noprefix"]),
        "p0\n"
    );
    pstack(&repo_path)
        .args(["branch", "--cleanup"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Cannot clean up"));

    // The clone inherits the unapplied patch
    pstack_ok(&repo_path, &["branch", "--clone", "foo2"]);
    assert_eq!(current_branch(&repo_path), "foo2");
    assert_eq!(
        pstack_ok(&repo_path, &["series", "--unapplied", "--noprefix"]),
        "p0\n"
    );

    pstack_ok(&repo_path, &["branch", "--cleanup", "--force"]);
    pstack(&repo_path)
        .arg("series")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("branch not initialized"));
    pstack(&repo_path)
        .args(["new", "p1", "-m", "p1"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("branch not initialized"));
    assert_eq!(config_value(&repo_path, "branch.foo2.patchstack.version"), None);
    assert_eq!(
        config_value(&repo_path, "branch.foo.patchstack.version").as_deref(),
        Some("1")
    );

    // Folding the patch into history empties the stack
    pstack_ok(&repo_path, &["branch", "foo"]);
    pstack_ok(&repo_path, &["push"]);
    pstack_ok(&repo_path, &["commit"]);
    assert_eq!(pstack_ok(&repo_path, &["series", "--count"]), "0\n");
    assert_eq!(
        std::fs::read_to_string(repo_path.join("README.md")).unwrap(),
        "# Changed by p0\n"
    );

    pstack_ok(&repo_path, &["branch", "--cleanup"]);
    pstack_ok(&repo_path, &["init"]);

    // Cleaning up another branch leaves the current one alone
    pstack_ok(&repo_path, &["branch", "master"]);
    pstack_ok(&repo_path, &["branch", "--cleanup", "foo"]);
    assert_eq!(pstack_ok(&repo_path, &["branch"]), "master\n");
    assert_eq!(config_value(&repo_path, "branch.foo.patchstack.version"), None);
}

#[test]
fn test_cleanup_rejects_extra_arguments() {
    let (_temp_dir, repo_path) = create_test_repo();
    pstack_ok(&repo_path, &["init"]);
    pstack_ok(&repo_path, &["branch", "--create", "foo"]);

    pstack(&repo_path)
        .args(["branch", "--cleanup", "foo", "master"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("incorrect number of arguments"));

    assert!(config_value(&repo_path, "branch.foo.patchstack.version").is_some());
    assert!(config_value(&repo_path, "branch.master.patchstack.version").is_some());
}

#[test]
fn test_cleanup_uninitialized_branch_fails() {
    let (_temp_dir, repo_path) = create_test_repo();

    pstack(&repo_path)
        .args(["branch", "--cleanup"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("master: branch not initialized"));
}

#[test]
fn test_cleanup_missing_branch_fails() {
    let (_temp_dir, repo_path) = create_test_repo();

    pstack(&repo_path)
        .args(["branch", "--cleanup", "nope"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("does not exist"));
}
