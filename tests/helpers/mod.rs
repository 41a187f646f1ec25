#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn git(dir: &Path, args: &[&str]) {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .expect("Failed to run git");
    assert!(
        output.status.success(),
        "git {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
}

/// Helper to create a test git repository on branch `main`
pub fn create_test_repo() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let repo_path = temp_dir.path().to_path_buf();

    git(&repo_path, &["init"]);
    git(&repo_path, &["symbolic-ref", "HEAD", "refs/heads/main"]);
    git(&repo_path, &["config", "user.name", "Test User"]);
    git(&repo_path, &["config", "user.email", "test@example.com"]);
    git(&repo_path, &["config", "commit.gpgsign", "false"]);
    git(&repo_path, &["config", "tag.gpgsign", "false"]);

    (temp_dir, repo_path)
}

/// Helper to create a commit
pub fn create_commit(repo_path: &Path, file: &str, content: &str, message: &str) {
    fs::write(repo_path.join(file), content).expect("Failed to write file");
    git(repo_path, &["add", file]);
    git(repo_path, &["commit", "-m", message]);
}

/// Create a bare repository and register it as `origin` of `repo_path`
pub fn add_bare_origin(repo_path: &Path) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let bare_path = temp_dir.path().join("origin.git");

    fs::create_dir(&bare_path).expect("Failed to create bare dir");
    git(&bare_path, &["init", "--bare"]);
    git(&bare_path, &["symbolic-ref", "HEAD", "refs/heads/main"]);
    git(
        repo_path,
        &["remote", "add", "origin", bare_path.to_str().expect("utf-8 temp path")],
    );

    (temp_dir, bare_path)
}

/// Run git in `dir` and return its trimmed stdout
pub fn git_stdout(dir: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .expect("Failed to run git");
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

/// Detach HEAD at the current commit
pub fn detach_head(repo_path: &Path) {
    git(repo_path, &["checkout", "--detach"]);
}

/// Create a bare repository at `repo_path/relative` holding a copy of `main`
pub fn create_local_mirror(repo_path: &Path, relative: &str) {
    let mirror_path = repo_path.join(relative);

    fs::create_dir_all(&mirror_path).expect("Failed to create mirror dir");
    git(&mirror_path, &["init", "--bare"]);
    git(repo_path, &["push", relative, "main"]);
}
