use regex::Regex;
use std::fmt;
use std::sync::LazyLock;
use url::Url;

/// `<name> <url> (fetch|push)` lines from `git remote -v`; partial clones
/// append the object filter, as in `(fetch) [blob:none]`
static REMOTE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\S+)\s+(.+?)\s+\((push|fetch)\)(?:\s+\[[^\]]*\])?$")
        .expect("remote pattern is valid")
});

/// `HEAD branch: <name>` line from `git remote show`
static HEAD_BRANCH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"HEAD branch:\s+(.*)").expect("head branch pattern is valid"));

const PROTOCOL_PREFIXES: &[&str] = &[
    "ssh:",
    "git+ssh:",
    "git:",
    "http:",
    "git+https:",
    "https:",
    "ftp:",
    "ftps:",
    "file:",
];

/// Everything before the first newline, or the whole output
pub fn first_line(output: &[u8]) -> String {
    let line = match output.iter().position(|&b| b == b'\n') {
        Some(i) => &output[..i],
        None => output,
    };
    String::from_utf8_lossy(line).into_owned()
}

/// Split output into lines after dropping exactly one trailing newline
pub fn output_lines(output: &[u8]) -> Vec<String> {
    let text = String::from_utf8_lossy(output);
    let text = text.strip_suffix('\n').unwrap_or(&text);
    if text.is_empty() {
        return Vec::new();
    }
    text.split('\n').map(str::to_string).collect()
}

/// Whether any output line equals `needle` exactly
pub fn output_contains_line(output: &[u8], needle: &str) -> bool {
    output_lines(output).iter().any(|line| line == needle)
}

/// Find the default branch in `git remote show <remote>` output
///
/// Returns an empty string when the output has no `HEAD branch:` line.
pub fn parse_default_branch(output: &[u8]) -> String {
    let text = String::from_utf8_lossy(output);
    text.split('\n')
        .map(str::trim)
        .find_map(|line| HEAD_BRANCH_RE.captures(line))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_default()
}

/// Parse `git remote -v` lines into remotes, in first-seen order
pub fn parse_remotes<S: AsRef<str>>(lines: &[S]) -> Vec<Remote> {
    let mut remotes: Vec<Remote> = Vec::new();

    for line in lines {
        let Some(caps) = REMOTE_RE.captures(line.as_ref().trim_end()) else {
            continue;
        };
        let name = caps[1].trim();
        let url = caps[2].trim();
        let direction = &caps[3];

        let index = match remotes.iter().position(|r| r.name == name) {
            Some(i) => i,
            None => {
                remotes.push(Remote::named(name));
                remotes.len() - 1
            }
        };

        // A bad URL leaves the field unset rather than dropping the remote
        let Ok(parsed) = parse_url(url) else {
            continue;
        };

        match direction {
            "fetch" => remotes[index].fetch_url = Some(parsed),
            "push" => remotes[index].push_url = Some(parsed),
            _ => {}
        }
    }

    remotes
}

/// Parse `remote.<name>.glab-resolved <value>` config lines
pub fn parse_resolved_remotes<S: AsRef<str>>(lines: &[S]) -> Vec<(String, String)> {
    lines
        .iter()
        .filter_map(|line| {
            let (key, value) = line.as_ref().split_once(' ')?;
            let name = key
                .strip_prefix("remote.")?
                .strip_suffix(".glab-resolved")?;
            if name.is_empty() {
                return None;
            }
            Some((name.to_string(), value.to_string()))
        })
        .collect()
}

/// Parse `branch.<name>.remote` / `branch.<name>.merge` config lines
pub fn parse_branch_config<S: AsRef<str>>(lines: &[S]) -> BranchConfig {
    let mut cfg = BranchConfig::default();

    for line in lines {
        let Some((key, value)) = line.as_ref().split_once(' ') else {
            continue;
        };
        let Some(last_key) = key.rsplit('.').next() else {
            continue;
        };

        match last_key {
            "remote" => {
                if value.contains(':') {
                    if let Ok(url) = parse_url(value) {
                        cfg.remote_url = Some(url);
                    }
                } else if !is_filesystem_path(value) {
                    cfg.remote_name = Some(value.to_string());
                }
            }
            "merge" => cfg.merge_ref = Some(value.to_string()),
            _ => {}
        }
    }

    cfg
}

/// Parse `<hash> <refname>` lines from `git show-ref`
pub fn parse_refs<S: AsRef<str>>(lines: &[S]) -> Vec<Ref> {
    lines
        .iter()
        .filter_map(|line| {
            let (hash, name) = line.as_ref().split_once(' ')?;
            Some(Ref {
                hash: hash.to_string(),
                name: name.trim().to_string(),
            })
        })
        .collect()
}

/// Number of entries in `git status --porcelain` output
pub fn count_changes(output: &[u8]) -> usize {
    String::from_utf8_lossy(output)
        .split('\n')
        .filter(|line| !line.is_empty())
        .count()
}

/// Tag names from `git tag -l`
pub fn parse_tags(output: &[u8]) -> Vec<String> {
    String::from_utf8_lossy(output)
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

pub fn is_filesystem_path(p: &str) -> bool {
    p == "." || p.starts_with("./") || p.starts_with('/')
}

/// Directory name `git clone <url>` creates when no target is given
pub fn clone_target_dir(url: &str) -> String {
    let trimmed = url.trim_end_matches('/');
    let trimmed = trimmed.strip_suffix(".git").unwrap_or(trimmed);
    match trimmed.rsplit(['/', ':']).next() {
        Some(base) if !base.is_empty() => base.to_string(),
        _ => ".".to_string(),
    }
}

/// Parse a git remote URL, including scp-like `user@host:path` syntax
pub fn parse_url(raw: &str) -> Result<Url, url::ParseError> {
    let has_protocol = PROTOCOL_PREFIXES.iter().any(|p| raw.starts_with(p));

    let mut normalized = if raw.starts_with('/') {
        format!("file://{}", raw)
    } else if !has_protocol && raw.contains(':') && !raw.contains('\\') {
        format!("ssh://{}", raw.replacen(':', "/", 1))
    } else {
        raw.to_string()
    };

    if let Some(rest) = normalized.strip_prefix("git+ssh:") {
        normalized = format!("ssh:{}", rest);
    } else if let Some(rest) = normalized.strip_prefix("git+https:") {
        normalized = format!("https:{}", rest);
    }

    let mut url = Url::parse(&normalized)?;
    if url.scheme() != "ssh" {
        return Ok(url);
    }

    if url.path().starts_with("//") {
        let path = url.path()[1..].to_string();
        url.set_path(&path);
    }
    // ssh URLs never carry a port for host matching
    let _ = url.set_port(None);

    Ok(url)
}

/// A git remote with its fetch and push locations
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Remote {
    pub name: String,
    pub resolved: Option<String>,
    pub fetch_url: Option<Url>,
    pub push_url: Option<Url>,
}

impl Remote {
    /// A remote fetching from and pushing to `url`; URLs that do not parse,
    /// like relative paths, leave both fields unset
    pub fn new(name: impl Into<String>, url: &str) -> Self {
        let parsed = parse_url(url).ok();
        Self {
            name: name.into(),
            resolved: None,
            fetch_url: parsed.clone(),
            push_url: parsed,
        }
    }

    fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            resolved: None,
            fetch_url: None,
            push_url: None,
        }
    }
}

impl fmt::Display for Remote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Tracking configuration of a local branch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BranchConfig {
    pub remote_name: Option<String>,
    pub remote_url: Option<Url>,
    pub merge_ref: Option<String>,
}

/// A named git reference and the object it resolves to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ref {
    pub hash: String,
    pub name: String,
}
