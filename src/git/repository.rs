use crate::error::{GitError, GitResult};
use crate::git::classifier::{self, Operation};
use crate::git::command;
use crate::git::executor::{Executor, GitExecutor};
use crate::git::parser::{self, BranchConfig, Ref, Remote};
use regex::escape;
use std::env;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Remote consulted by [`Repository::remote_branch_exists`] unless overridden
pub const DEFAULT_REMOTE: &str = "origin";

/// Config key suffix recording which project a remote resolves to
const RESOLVED_KEY: &str = "glab-resolved";

/// Represents a git repository and the operations available on it
///
/// Every operation is a single blocking git invocation (two for
/// [`remotes`](Self::remotes) and [`set_config`](Self::set_config)); nothing is
/// retried or cached.
#[derive(Debug)]
pub struct Repository<E: Executor = GitExecutor> {
    path: PathBuf,
    executor: E,
    default_remote: String,
}

impl Repository<GitExecutor> {
    /// Detect git repository from current working directory
    pub fn discover() -> GitResult<Self> {
        let current_dir = env::current_dir()?;
        Self::discover_from(&current_dir)
    }

    /// Detect git repository starting from a specific directory
    pub fn discover_from<P: AsRef<Path>>(start_path: P) -> GitResult<Self> {
        let mut current = start_path.as_ref().to_path_buf();

        loop {
            // `.git` is a file inside worktrees and submodules
            if current.join(".git").exists() {
                return Ok(Self::new(current));
            }

            // Move up to parent directory
            if !current.pop() {
                return Err(GitError::NotARepository);
            }
        }
    }

    /// Create a Repository for a known git directory
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let executor = GitExecutor::new(&path);

        Self::with_executor(path, executor)
    }
}

impl<E: Executor> Repository<E> {
    /// Create a Repository that runs git through the given executor
    pub fn with_executor<P: AsRef<Path>>(path: P, executor: E) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            executor,
            default_remote: DEFAULT_REMOTE.to_string(),
        }
    }

    /// Use `remote` instead of [`DEFAULT_REMOTE`] for remote branch lookups
    pub fn with_default_remote(mut self, remote: impl Into<String>) -> Self {
        self.default_remote = remote.into();
        self
    }

    pub fn default_remote(&self) -> &str {
        &self.default_remote
    }

    /// Get the repository path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get the executor running this repository's commands
    pub fn executor(&self) -> &E {
        &self.executor
    }

    // Branches

    /// Name of the checked-out branch
    ///
    /// Fails with [`GitError::NotOnAnyBranch`] on a detached HEAD.
    pub fn current_branch(&self) -> GitResult<String> {
        let output = self.executor.run(&command::symbolic_ref_head())?;
        let stdout = classifier::classify(Operation::CurrentBranch, output)?;
        Ok(parser::first_line(&stdout))
    }

    /// Default branch advertised by `remote`, or an empty string if git does not report one
    pub fn default_branch(&self, remote: &str) -> GitResult<String> {
        let output = self.executor.run(&command::remote_show(remote))?;
        let stdout = classifier::require_success(output)?;
        Ok(parser::parse_default_branch(&stdout))
    }

    /// Whether `branch` exists on the default remote
    ///
    /// A missing branch surfaces as [`GitError::NotOnAnyBranch`], since git
    /// reports it with a silent non-zero exit.
    pub fn remote_branch_exists(&self, branch: &str) -> GitResult<bool> {
        let output = self
            .executor
            .run(&command::ls_remote_heads(&self.default_remote, branch))?;
        classifier::classify(Operation::RemoteBranchExists, output)?;
        Ok(true)
    }

    /// Tracking configuration of `branch`; any failure yields an empty config
    pub fn read_branch_config(&self, branch: &str) -> BranchConfig {
        let pattern = format!("^{}(remote|merge)$", escape(&format!("branch.{}.", branch)));
        let output = match self.executor.run(&command::config_get_regexp(&pattern)) {
            Ok(output) if output.success => output,
            _ => return BranchConfig::default(),
        };
        parser::parse_branch_config(&parser::output_lines(&output.stdout))
    }

    /// Set the upstream of the current branch to `<remote>/<branch>`
    pub fn set_upstream(&self, remote: &str, branch: &str) -> GitResult<()> {
        let output = self.executor.run(&command::set_upstream(remote, branch))?;
        classifier::require_success(output)?;
        Ok(())
    }

    pub fn checkout_branch(&self, branch: &str) -> GitResult<()> {
        let output = self.executor.run(&command::checkout(branch))?;
        classifier::require_success(output)?;
        Ok(())
    }

    pub fn checkout_new_branch(&self, branch: &str) -> GitResult<()> {
        let output = self.executor.run(&command::checkout_new_branch(branch))?;
        classifier::require_success(output)?;
        Ok(())
    }

    /// Force-delete a local branch
    pub fn delete_local_branch(&self, branch: &str) -> GitResult<()> {
        let output = self.executor.run(&command::delete_branch(branch))?;
        classifier::require_success(output)?;
        Ok(())
    }

    // Remotes

    /// Configured remotes with their resolution, in `git remote -v` order
    pub fn remotes(&self) -> GitResult<Vec<Remote>> {
        let output = self.executor.run(&command::remote_list())?;
        let stdout = classifier::require_success(output)?;
        let mut remotes = parser::parse_remotes(&parser::output_lines(&stdout));

        // Resolution is optional metadata; a failed lookup leaves it unset
        let pattern = format!(r"^remote\..*\.{}$", RESOLVED_KEY);
        if let Ok(output) = self.executor.run(&command::config_get_regexp(&pattern)) {
            if output.success {
                let lines = parser::output_lines(&output.stdout);
                for (name, resolved) in parser::parse_resolved_remotes(&lines) {
                    if let Some(remote) = remotes.iter_mut().find(|r| r.name == name) {
                        remote.resolved = Some(resolved);
                    }
                }
            }
        }

        Ok(remotes)
    }

    /// Add a remote and fetch from it
    ///
    /// Local paths git accepts but that are not URLs leave the returned
    /// remote's URL fields unset.
    pub fn add_remote(&self, name: &str, url: &str) -> GitResult<Remote> {
        let output = self.executor.run(&command::remote_add(name, url))?;
        classifier::require_success(output)?;

        Ok(Remote::new(name, url))
    }

    /// Add and fetch an `upstream` remote in `clone_dir`, streaming git's output
    pub fn add_upstream_remote(&self, upstream_url: &str, clone_dir: &str) -> GitResult<()> {
        let output = self
            .executor
            .run(&command::remote_add_upstream(clone_dir, upstream_url))?;
        classifier::require_success(output)?;
        Ok(())
    }

    /// Record which project `name` resolves to
    pub fn set_remote_resolution(&self, name: &str, resolution: &str) -> GitResult<()> {
        self.set_remote_config(name, RESOLVED_KEY, resolution)
    }

    pub fn set_remote_config(&self, remote: &str, key: &str, value: &str) -> GitResult<()> {
        self.set_config(&format!("remote.{}.{}", remote, key), value)
    }

    // Config

    /// Add `value` under `key` unless that exact value is already present
    pub fn set_config(&self, key: &str, value: &str) -> GitResult<()> {
        let present = self
            .config_values(key)?
            .is_some_and(|stdout| parser::output_contains_line(&stdout, value));
        if present {
            return Ok(());
        }

        let output = self.executor.run(&command::config_add(key, value))?;
        classifier::require_success(output)?;
        Ok(())
    }

    /// All values of `key`; empty when the key is unset
    pub fn get_all_config(&self, key: &str) -> GitResult<Vec<String>> {
        Ok(self
            .config_values(key)?
            .map(|stdout| parser::output_lines(&stdout))
            .unwrap_or_default())
    }

    /// Raw `--get-all` output for `key`, `None` when unset
    fn config_values(&self, key: &str) -> GitResult<Option<Vec<u8>>> {
        assert_valid_config_key(key)?;

        let output = self.executor.run(&command::config_get_all(key))?;
        classifier::read_optional(output)
    }

    /// Configured `user.name`, or an empty string if unavailable
    pub fn user_name(&self) -> String {
        self.config_first_line("user.name")
    }

    /// Configured `user.email`, or an empty string if unavailable
    pub fn user_email(&self) -> String {
        self.config_first_line("user.email")
    }

    fn config_first_line(&self, key: &str) -> String {
        match self.executor.run(&command::config_get(key)) {
            Ok(output) if output.success => parser::first_line(&output.stdout),
            _ => String::new(),
        }
    }

    // Working tree and history

    /// Number of entries reported by `git status --porcelain`
    pub fn uncommitted_change_count(&self) -> GitResult<usize> {
        let output = self.executor.run(&command::status_porcelain())?;
        let stdout = classifier::require_success(output)?;
        Ok(parser::count_changes(&stdout))
    }

    /// Body of the commit message for `sha`, without the subject line
    pub fn commit_body(&self, sha: &str) -> GitResult<String> {
        let output = self.executor.run(&command::show_commit_body(sha))?;
        let stdout = classifier::require_success(output)?;
        Ok(String::from_utf8_lossy(&stdout).into_owned())
    }

    /// Top-level directory of the working tree
    pub fn toplevel_dir(&self) -> GitResult<String> {
        let output = self.executor.run(&command::rev_parse_toplevel())?;
        let stdout = classifier::require_success(output)?;
        Ok(parser::first_line(&stdout))
    }

    /// `git describe --tags` for HEAD, lightweight tags included
    pub fn describe_by_tags(&self) -> GitResult<String> {
        let output = self.executor.run(&command::describe_tags())?;
        let stdout = classifier::require_success(output)?;
        Ok(String::from_utf8_lossy(&stdout).into_owned())
    }

    pub fn list_tags(&self) -> GitResult<Vec<String>> {
        let output = self.executor.run(&command::list_tags())?;
        let stdout = classifier::require_success(output)?;
        Ok(parser::parse_tags(&stdout))
    }

    /// Resolve fully-qualified ref names to their hashes
    pub fn show_refs<S: AsRef<str>>(&self, refs: &[S]) -> GitResult<Vec<Ref>> {
        let output = self.executor.run(&command::show_refs(refs))?;
        let stdout = classifier::require_success(output)?;
        Ok(parser::parse_refs(&parser::output_lines(&stdout)))
    }

    // Mutations

    pub fn stage_files<S: AsRef<str>>(&self, files: &[S]) -> GitResult<bool> {
        let output = self.executor.run(&command::stage(files))?;
        classifier::classify(Operation::Stage, output)?;
        Ok(true)
    }

    /// Commit staged changes
    pub fn commit(&self, message: &str) -> GitResult<bool> {
        let output = self.executor.run(&command::commit(message))?;
        let stdout = classifier::classify(Operation::Commit, output)?;
        debug!(summary = %parser::first_line(&stdout), "created commit");
        Ok(true)
    }

    /// Stage every tracked modification and commit it
    pub fn stage_and_commit_tracked(&self, message: &str) -> GitResult<bool> {
        let output = self.executor.run(&command::commit_tracked(message))?;
        let stdout = classifier::classify(Operation::Commit, output)?;
        debug!(summary = %parser::first_line(&stdout), "created commit");
        Ok(true)
    }

    /// Create a lightweight tag at HEAD
    pub fn tag(&self, name: &str) -> GitResult<bool> {
        let output = self.executor.run(&command::tag(name))?;
        classifier::classify(Operation::Tag, output)?;
        Ok(true)
    }

    /// Publish `reference` to `remote`
    pub fn push(&self, remote: &str, reference: &str) -> GitResult<bool> {
        let output = self.executor.run(&command::push(remote, reference))?;
        classifier::classify(Operation::Push, output)?;
        debug!(remote, reference, "pushed");
        Ok(true)
    }

    /// Clone `url`, streaming git's progress, and return the directory cloned into
    pub fn run_clone(&self, url: &str, target: Option<&str>, args: &[&str]) -> GitResult<String> {
        let output = self.executor.run(&command::clone(url, target, args))?;
        classifier::require_success(output)?;

        Ok(match target {
            Some(target) => target.to_string(),
            None => parser::clone_target_dir(url),
        })
    }

    /// Run arbitrary git arguments attached to the terminal
    pub fn run_passthrough<S: AsRef<str>>(&self, args: &[S]) -> GitResult<()> {
        let output = self.executor.run(&command::passthrough(args))?;
        classifier::require_success(output)?;
        Ok(())
    }
}

/// Config keys need at least a section and a name
fn assert_valid_config_key(key: &str) -> GitResult<()> {
    if key.split('.').count() < 2 {
        return Err(GitError::ConfigKeyInvalid(key.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::git::mock::MockExecutor;
    use std::fs;
    use std::process::Command;
    use tempfile::TempDir;

    fn create_test_repo() -> (TempDir, PathBuf) {
        let temp_dir = TempDir::new().unwrap();
        let repo_path = temp_dir.path().to_path_buf();

        // Initialize git repo on a predictable branch name
        Command::new("git")
            .args(["init"])
            .current_dir(&repo_path)
            .output()
            .unwrap();

        Command::new("git")
            .args(["symbolic-ref", "HEAD", "refs/heads/main"])
            .current_dir(&repo_path)
            .output()
            .unwrap();

        // Configure git
        Command::new("git")
            .args(["config", "user.name", "Test User"])
            .current_dir(&repo_path)
            .output()
            .unwrap();

        Command::new("git")
            .args(["config", "user.email", "test@example.com"])
            .current_dir(&repo_path)
            .output()
            .unwrap();

        (temp_dir, repo_path)
    }

    fn mock_repo(mock: MockExecutor) -> Repository<MockExecutor> {
        Repository::with_executor("/repo", mock)
    }

    #[test]
    fn test_discover_from_subdirectory() {
        let (_temp, repo_path) = create_test_repo();

        // Create subdirectory
        let sub_dir = repo_path.join("subdir");
        fs::create_dir(&sub_dir).unwrap();

        let repo = Repository::discover_from(&sub_dir).unwrap();
        assert_eq!(repo.path(), repo_path.as_path());
    }

    #[test]
    fn test_discover_not_a_repo() {
        let temp_dir = TempDir::new().unwrap();
        let result = Repository::discover_from(temp_dir.path());

        assert!(matches!(result.unwrap_err(), GitError::NotARepository));
    }

    #[test]
    fn test_current_branch_in_empty_repo() {
        let (_temp, repo_path) = create_test_repo();
        let repo = Repository::new(&repo_path);

        assert_eq!(repo.current_branch().unwrap(), "main");
    }

    #[test]
    fn test_user_identity() {
        let (_temp, repo_path) = create_test_repo();
        let repo = Repository::new(&repo_path);

        assert_eq!(repo.user_name(), "Test User");
        assert_eq!(repo.user_email(), "test@example.com");
    }

    #[test]
    fn test_current_branch_detached() {
        let repo = mock_repo(MockExecutor::new().fail_silently());
        let err = repo.current_branch().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotOnAnyBranch);
    }

    #[test]
    fn test_current_branch_unknown_error() {
        let repo = mock_repo(MockExecutor::new().fail_with("fatal: not a git repository"));
        let err = repo.current_branch().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unknown);
    }

    #[test]
    fn test_remote_branch_exists() {
        let repo = mock_repo(
            MockExecutor::new()
                .succeed("abc123\trefs/heads/main\n")
                .fail_silently(),
        );

        assert!(repo.remote_branch_exists("main").unwrap());
        let err = repo.remote_branch_exists("gone").unwrap_err();
        assert!(matches!(err, GitError::NotOnAnyBranch));
        assert_eq!(
            repo.executor().call_args()[1],
            vec!["ls-remote", "--exit-code", "--heads", "origin", "gone"]
        );
    }

    #[test]
    fn test_remote_branch_exists_on_configured_remote() {
        let repo = mock_repo(MockExecutor::new().succeed("abc123\trefs/heads/main\n"))
            .with_default_remote("upstream");

        assert!(repo.remote_branch_exists("main").unwrap());
        assert_eq!(repo.executor().call_args()[0][3], "upstream");
    }

    #[test]
    fn test_default_branch_from_remote_show() {
        let repo = mock_repo(MockExecutor::new().succeed(
            "* remote origin\n  Fetch URL: https://example.com/r.git\n  HEAD branch: develop\n",
        ));
        assert_eq!(repo.default_branch("origin").unwrap(), "develop");
        assert_eq!(repo.executor().call_args()[0], vec!["remote", "show", "origin"]);
    }

    #[test]
    fn test_read_branch_config_escapes_branch_name() {
        let repo = mock_repo(
            MockExecutor::new().succeed("branch.feat.x.remote origin\nbranch.feat.x.merge refs/heads/feat.x\n"),
        );

        let cfg = repo.read_branch_config("feat.x");
        assert_eq!(cfg.remote_name.as_deref(), Some("origin"));
        assert_eq!(cfg.merge_ref.as_deref(), Some("refs/heads/feat.x"));
        assert_eq!(
            repo.executor().call_args()[0],
            vec!["config", "--get-regexp", r"^branch\.feat\.x\.(remote|merge)$"]
        );
    }

    #[test]
    fn test_read_branch_config_failure_is_empty() {
        let repo = mock_repo(MockExecutor::new().fail_silently());
        assert_eq!(repo.read_branch_config("main"), BranchConfig::default());
    }

    #[test]
    fn test_remotes_apply_resolution() {
        let repo = mock_repo(
            MockExecutor::new()
                .succeed("origin\thttps://example.com/me/app.git (fetch)\norigin\thttps://example.com/me/app.git (push)\n")
                .succeed("remote.origin.glab-resolved base\n"),
        );

        let remotes = repo.remotes().unwrap();
        assert_eq!(remotes.len(), 1);
        assert_eq!(remotes[0].resolved.as_deref(), Some("base"));
    }

    #[test]
    fn test_remotes_without_resolution() {
        let repo = mock_repo(
            MockExecutor::new()
                .succeed("origin\thttps://example.com/me/app.git (fetch)\n")
                .fail_silently(),
        );

        let remotes = repo.remotes().unwrap();
        assert_eq!(remotes[0].resolved, None);
    }

    #[test]
    fn test_invalid_config_key_spawns_nothing() {
        let repo = mock_repo(MockExecutor::new());
        let err = repo.get_all_config("nodots").unwrap_err();

        assert_eq!(err.kind(), ErrorKind::ConfigKeyInvalid);
        assert!(repo.executor().calls().is_empty());
    }

    #[test]
    fn test_set_config_skips_existing_value() {
        let repo = mock_repo(MockExecutor::new().succeed("one\ntwo\n"));
        repo.set_config("cliborg.key", "two").unwrap();

        assert_eq!(repo.executor().calls().len(), 1);
    }

    #[test]
    fn test_set_config_adds_missing_value() {
        let repo = mock_repo(MockExecutor::new().fail_silently().succeed(""));
        repo.set_remote_resolution("origin", "base").unwrap();

        assert_eq!(
            repo.executor().call_args(),
            vec![
                vec!["config", "--get-all", "remote.origin.glab-resolved"],
                vec!["config", "--add", "remote.origin.glab-resolved", "base"],
            ]
        );
    }

    #[test]
    fn test_user_name_failure_is_empty() {
        let repo = mock_repo(MockExecutor::new().fail_with("fatal: bad config"));
        assert_eq!(repo.user_name(), "");
    }

    #[test]
    fn test_mutations_classify_silent_failures() {
        let repo = mock_repo(
            MockExecutor::new()
                .fail_silently()
                .fail_silently()
                .fail_silently()
                .fail_silently()
                .fail_silently(),
        );

        assert_eq!(repo.stage_files(&["a"]).unwrap_err().kind(), ErrorKind::CommitFailed);
        assert_eq!(repo.commit("m").unwrap_err().kind(), ErrorKind::CommitFailed);
        assert_eq!(
            repo.stage_and_commit_tracked("m").unwrap_err().kind(),
            ErrorKind::CommitFailed
        );
        assert_eq!(repo.tag("v1").unwrap_err().kind(), ErrorKind::TagFailed);
        assert_eq!(repo.push("origin", "v1").unwrap_err().kind(), ErrorKind::PushFailed);
    }

    #[test]
    fn test_clone_target_from_url() {
        let repo = mock_repo(MockExecutor::new().succeed("").succeed(""));

        assert_eq!(
            repo.run_clone("https://example.com/group/app.git", None, &[]).unwrap(),
            "app"
        );
        assert_eq!(
            repo.run_clone("https://example.com/group/app.git", Some("dest"), &["--depth", "1"])
                .unwrap(),
            "dest"
        );
    }

    #[test]
    fn test_add_remote_accepts_relative_path() {
        let repo = mock_repo(MockExecutor::new().succeed(""));
        let remote = repo.add_remote("rel", "../sibling").unwrap();

        assert_eq!(remote.name, "rel");
        assert!(remote.fetch_url.is_none());
        assert!(remote.push_url.is_none());
        assert_eq!(
            repo.executor().call_args(),
            vec![vec!["remote", "add", "-f", "rel", "../sibling"]]
        );
    }

    #[test]
    fn test_add_remote_parses_scp_url() {
        let repo = mock_repo(MockExecutor::new().succeed(""));
        let remote = repo.add_remote("fork", "git@example.com:me/app.git").unwrap();

        let url = remote.fetch_url.as_ref().unwrap();
        assert_eq!(url.scheme(), "ssh");
        assert_eq!(url.path(), "/me/app.git");
        assert_eq!(remote.fetch_url, remote.push_url);
    }

    #[test]
    fn test_add_remote_git_failure_is_unknown() {
        let repo = mock_repo(MockExecutor::new().fail_with("error: remote rel already exists.\n"));
        let err = repo.add_remote("rel", "../sibling").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unknown);
    }

    #[test]
    fn test_set_config_matches_whole_lines() {
        let repo = mock_repo(MockExecutor::new().succeed("base-old\n").succeed(""));
        repo.set_config("cliborg.key", "base").unwrap();

        assert_eq!(
            repo.executor().call_args()[1],
            vec!["config", "--add", "cliborg.key", "base"]
        );
    }
}
