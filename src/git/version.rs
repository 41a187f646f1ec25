use crate::error::{GitError, GitResult};
use crate::git::classifier;
use crate::git::command;
use crate::git::executor::{Executor, GitExecutor};

/// Minimum required git version
const MIN_GIT_VERSION: (u32, u32) = (2, 20);

/// Represents a git version
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct GitVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl GitVersion {
    /// Detect the git version found on `PATH`
    pub fn detect() -> GitResult<Self> {
        Self::detect_with(&GitExecutor::new("."))
    }

    /// Detect the git version through a specific executor
    pub fn detect_with<E: Executor>(executor: &E) -> GitResult<Self> {
        let output = executor
            .run(&command::version())
            .map_err(|e| GitError::GitVersionDetectionFailed(e.to_string()))?;
        let stdout = classifier::require_success(output)
            .map_err(|e| GitError::GitVersionDetectionFailed(e.to_string()))?;

        Self::parse(&String::from_utf8_lossy(&stdout))
    }

    /// Parse git version from string like "git version 2.39.2"
    pub fn parse(version_str: &str) -> GitResult<Self> {
        // Expected format: "git version X.Y.Z" or "git version X.Y.Z.windows.1" etc.
        let parts: Vec<&str> = version_str.split_whitespace().collect();

        if parts.len() < 3 || parts[0] != "git" || parts[1] != "version" {
            return Err(GitError::ParseError(format!(
                "Unexpected git version format: {}",
                version_str
            )));
        }

        let nums: Vec<&str> = parts[2].split('.').collect();
        if nums.len() < 2 {
            return Err(GitError::ParseError(format!(
                "Invalid version number format: {}",
                parts[2]
            )));
        }

        let component = |s: &str, what: &str| {
            s.parse::<u32>()
                .map_err(|_| GitError::ParseError(format!("Invalid {} version: {}", what, s)))
        };
        let major = component(nums[0], "major")?;
        let minor = component(nums[1], "minor")?;
        // Patch may carry vendor suffixes like "2-rc1"
        let patch = nums.get(2).and_then(|p| p.parse().ok()).unwrap_or(0);

        Ok(GitVersion {
            major,
            minor,
            patch,
        })
    }

    /// Check if this version meets minimum requirements
    pub fn is_supported(&self) -> bool {
        (self.major, self.minor) >= MIN_GIT_VERSION
    }

    /// Detect the installed git and fail if it is too old
    pub fn validate() -> GitResult<Self> {
        let version = Self::detect()?;

        if !version.is_supported() {
            return Err(GitError::GitVersionTooOld(format!(
                "{}\n\nPlease upgrade git to version {}.{} or higher.\nVisit: https://git-scm.com/downloads",
                version, MIN_GIT_VERSION.0, MIN_GIT_VERSION.1
            )));
        }

        Ok(version)
    }
}

impl std::fmt::Display for GitVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}
