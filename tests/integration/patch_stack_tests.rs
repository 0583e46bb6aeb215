use super::test_helpers::*;
use predicates::prelude::*;

#[test]
fn test_init_twice_fails() {
    let (_temp_dir, repo_path) = create_test_repo();

    pstack_ok(&repo_path, &["init"]);
    pstack(&repo_path)
        .arg("init")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("already initialized"));
}

#[test]
fn test_push_pop_series() {
    let (_temp_dir, repo_path) = create_test_repo();
    pstack_ok(&repo_path, &["init"]);

    for (name, file) in [("p0", "a.txt"), ("p1", "b.txt"), ("p2", "c.txt")] {
        write_file(&repo_path, file, name);
        commit_file_via_stack(&repo_path, name, file);
    }
    assert_eq!(pstack_ok(&repo_path, &["series"]), "+ p0\n+ p1\n> p2\n");
    assert_eq!(pstack_ok(&repo_path, &["top"]), "p2\n");

    pstack_ok(&repo_path, &["pop", "-n", "2"]);
    assert_eq!(pstack_ok(&repo_path, &["series"]), "> p0\n- p1\n- p2\n");
    assert!(!repo_path.join("b.txt").exists());

    pstack_ok(&repo_path, &["push", "-a"]);
    assert_eq!(
        pstack_ok(&repo_path, &["series", "--applied", "--noprefix"]),
        "p0\np1\np2\n"
    );
    assert!(repo_path.join("c.txt").exists());

    pstack_ok(&repo_path, &["pop", "-a"]);
    pstack(&repo_path)
        .arg("top")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("No patches applied"));
}

/// Create a patch and record a new, untracked file in it
fn commit_file_via_stack(repo_path: &std::path::Path, name: &str, file: &str) {
    pstack_ok(repo_path, &["new", name]);
    let repo = git2::Repository::open(repo_path).unwrap();
    let mut index = repo.index().unwrap();
    index.add_path(std::path::Path::new(file)).unwrap();
    index.write().unwrap();
    pstack_ok(repo_path, &["refresh"]);
}

#[test]
fn test_generated_patch_names() {
    let (_temp_dir, repo_path) = create_test_repo();
    pstack_ok(&repo_path, &["init"]);

    pstack_ok(&repo_path, &["new", "-m", "Fix the frobnicator"]);
    pstack_ok(&repo_path, &["new", "-m", "Fix the frobnicator"]);

    assert_eq!(
        pstack_ok(&repo_path, &["series", "--noprefix"]),
        "fix-the-frobnicator\nfix-the-frobnicator-1\n"
    );

    pstack(&repo_path)
        .args(["new", "fix-the-frobnicator"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn test_push_conflict_exits_with_conflict_code() {
    let (_temp_dir, repo_path) = create_test_repo();
    pstack_ok(&repo_path, &["init"]);

    pstack_ok(&repo_path, &["new", "p0"]);
    write_file(&repo_path, "README.md", "one\n");
    pstack_ok(&repo_path, &["refresh"]);
    pstack_ok(&repo_path, &["new", "p1"]);
    write_file(&repo_path, "README.md", "two\n");
    pstack_ok(&repo_path, &["refresh"]);

    pstack_ok(&repo_path, &["pop", "-a"]);
    pstack_ok(&repo_path, &["delete", "p0"]);
    pstack_ok(&repo_path, &["new", "q0"]);
    write_file(&repo_path, "README.md", "other\n");
    pstack_ok(&repo_path, &["refresh"]);

    pstack(&repo_path)
        .args(["push", "-a"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("p1: patch does not apply cleanly"))
        .stderr(predicate::str::contains("Push stopped early"));

    assert_eq!(pstack_ok(&repo_path, &["series"]), "> q0\n- p1\n");
    assert_eq!(
        std::fs::read_to_string(repo_path.join("README.md")).unwrap(),
        "other\n"
    );
}

#[test]
fn test_pop_after_outside_commit_exits_with_conflict_code() {
    let (_temp_dir, repo_path) = create_test_repo();
    pstack_ok(&repo_path, &["init"]);
    pstack_ok(&repo_path, &["new", "p0"]);

    commit_file(&repo_path, "x.txt", "x\n", "made behind the stack");

    pstack(&repo_path)
        .arg("pop")
        .assert()
        .code(3)
        .stderr(predicate::str::contains("Cannot pop"));
}

#[test]
fn test_push_with_local_changes_fails() {
    let (_temp_dir, repo_path) = create_test_repo();
    pstack_ok(&repo_path, &["init"]);
    pstack_ok(&repo_path, &["new", "p0"]);
    pstack_ok(&repo_path, &["pop"]);

    write_file(&repo_path, "README.md", "dirty\n");
    pstack(&repo_path)
        .arg("push")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("local changes"));
}

#[test]
fn test_usage_errors_exit_with_two() {
    let (_temp_dir, repo_path) = create_test_repo();

    pstack(&repo_path)
        .args(["branch", "--create", "--list"])
        .assert()
        .code(2);
    pstack(&repo_path).args(["push", "-a", "-n", "2"]).assert().code(2);
}

#[test]
fn test_completions() {
    let (_temp_dir, repo_path) = create_test_repo();

    pstack(&repo_path)
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("pstack"));
}

#[test]
fn test_push_refuses_to_overwrite_untracked_file() {
    let (_temp_dir, repo_path) = create_test_repo();
    pstack_ok(&repo_path, &["init"]);
    write_file(&repo_path, "a.txt", "patch content\n");
    commit_file_via_stack(&repo_path, "p0", "a.txt");
    pstack_ok(&repo_path, &["pop"]);

    write_file(&repo_path, "a.txt", "untracked work\n");
    pstack(&repo_path)
        .arg("push")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("local changes"));

    assert_eq!(
        std::fs::read_to_string(repo_path.join("a.txt")).unwrap(),
        "untracked work\n"
    );
    assert_eq!(pstack_ok(&repo_path, &["series"]), "- p0\n");
}

#[test]
fn test_delete_repeated_patch_name() {
    let (_temp_dir, repo_path) = create_test_repo();
    pstack_ok(&repo_path, &["init"]);
    write_file(&repo_path, "a.txt", "patch content\n");
    commit_file_via_stack(&repo_path, "p0", "a.txt");

    pstack_ok(&repo_path, &["delete", "p0", "p0"]);
    assert_eq!(pstack_ok(&repo_path, &["series"]), "");
}
