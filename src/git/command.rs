//! Argument vectors for every git operation the repository layer performs.
//!
//! Values supplied by callers (branch names, messages, URLs) are pushed as
//! discrete arguments and never pass through a shell.

use std::fmt;

/// Program name resolved through `PATH`
pub const GIT_PROGRAM: &str = "git";

/// How the child process's standard streams are wired
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stdio {
    /// stdout and stderr are captured, stdin is closed
    Captured,
    /// The child shares the caller's terminal streams
    Inherit,
}

/// A single git invocation, minus the program name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitCommand {
    args: Vec<String>,
    stdio: Stdio,
}

impl GitCommand {
    pub fn new<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            args: args.into_iter().map(Into::into).collect(),
            stdio: Stdio::Captured,
        }
    }

    /// Attach the caller's terminal instead of capturing output
    pub fn inherit_stdio(mut self) -> Self {
        self.stdio = Stdio::Inherit;
        self
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn stdio(&self) -> Stdio {
        self.stdio
    }
}

impl fmt::Display for GitCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", GIT_PROGRAM)?;
        for arg in &self.args {
            if arg.is_empty() || arg.contains(char::is_whitespace) {
                write!(f, " {:?}", arg)?;
            } else {
                write!(f, " {}", arg)?;
            }
        }
        Ok(())
    }
}

pub fn symbolic_ref_head() -> GitCommand {
    GitCommand::new(["symbolic-ref", "--quiet", "--short", "HEAD"])
}

pub fn ls_remote_heads(remote: &str, branch: &str) -> GitCommand {
    GitCommand::new(["ls-remote", "--exit-code", "--heads", remote, branch])
}

pub fn remote_show(remote: &str) -> GitCommand {
    GitCommand::new(["remote", "show", remote])
}

pub fn remote_list() -> GitCommand {
    GitCommand::new(["remote", "-v"])
}

pub fn remote_add(name: &str, url: &str) -> GitCommand {
    GitCommand::new(["remote", "add", "-f", name, url])
}

/// Adds an `upstream` remote to a freshly cloned repository
pub fn remote_add_upstream(clone_dir: &str, url: &str) -> GitCommand {
    GitCommand::new(["-C", clone_dir, "remote", "add", "-f", "upstream", url]).inherit_stdio()
}

pub fn status_porcelain() -> GitCommand {
    GitCommand::new(["status", "--porcelain"])
}

pub fn config_get(key: &str) -> GitCommand {
    GitCommand::new(["config", key])
}

pub fn config_get_all(key: &str) -> GitCommand {
    GitCommand::new(["config", "--get-all", key])
}

pub fn config_get_regexp(pattern: &str) -> GitCommand {
    GitCommand::new(["config", "--get-regexp", pattern])
}

pub fn config_add(key: &str, value: &str) -> GitCommand {
    GitCommand::new(["config", "--add", key, value])
}

pub fn show_commit_body(sha: &str) -> GitCommand {
    GitCommand::new([
        "-c",
        "log.ShowSignature=false",
        "show",
        "-s",
        "--pretty=format:%b",
        sha,
    ])
}

pub fn set_upstream(remote: &str, branch: &str) -> GitCommand {
    GitCommand::new([
        "branch".to_string(),
        "--set-upstream-to".to_string(),
        format!("{}/{}", remote, branch),
    ])
}

pub fn delete_branch(branch: &str) -> GitCommand {
    GitCommand::new(["branch", "-D", branch])
}

pub fn checkout(branch: &str) -> GitCommand {
    GitCommand::new(["checkout", branch])
}

pub fn checkout_new_branch(branch: &str) -> GitCommand {
    GitCommand::new(["checkout", "-b", branch])
}

/// `git clone [extra_args...] <url> [target]`, attached to the terminal
pub fn clone(url: &str, target: Option<&str>, extra_args: &[&str]) -> GitCommand {
    let mut args = vec!["clone".to_string()];
    args.extend(extra_args.iter().map(|a| a.to_string()));
    args.push(url.to_string());
    if let Some(target) = target {
        args.push(target.to_string());
    }
    GitCommand::new(args).inherit_stdio()
}

pub fn rev_parse_toplevel() -> GitCommand {
    GitCommand::new(["rev-parse", "--show-toplevel"])
}

pub fn describe_tags() -> GitCommand {
    GitCommand::new(["describe", "--tags"])
}

pub fn list_tags() -> GitCommand {
    GitCommand::new(["tag", "-l"])
}

/// `git add <files...>`; an empty list is passed through and left for git to reject
pub fn stage<S: AsRef<str>>(files: &[S]) -> GitCommand {
    let mut args = vec!["add".to_string()];
    args.extend(files.iter().map(|f| f.as_ref().to_string()));
    GitCommand::new(args)
}

pub fn commit(message: &str) -> GitCommand {
    GitCommand::new(["commit", "-m", message])
}

/// Commit with `-a`, staging every tracked modification first
pub fn commit_tracked(message: &str) -> GitCommand {
    GitCommand::new(["commit", "-am", message])
}

pub fn tag(name: &str) -> GitCommand {
    GitCommand::new(["tag", name])
}

pub fn push(remote: &str, reference: &str) -> GitCommand {
    GitCommand::new(["push", remote, reference])
}

pub fn show_refs<S: AsRef<str>>(refs: &[S]) -> GitCommand {
    let mut args = vec!["show-ref".to_string(), "--verify".to_string(), "--".to_string()];
    args.extend(refs.iter().map(|r| r.as_ref().to_string()));
    GitCommand::new(args)
}

pub fn version() -> GitCommand {
    GitCommand::new(["--version"])
}

/// Arbitrary git arguments, attached to the terminal
pub fn passthrough<S: AsRef<str>>(args: &[S]) -> GitCommand {
    GitCommand::new(args.iter().map(|a| a.as_ref().to_string())).inherit_stdio()
}
