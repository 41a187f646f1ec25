use chrono::Utc;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// History files are rotated once they grow past this size
const ROTATE_AT_BYTES: u64 = 10 * 1024 * 1024;

/// Append-only history of git invocations, one line each:
///
/// `[<rfc3339>] [<user>] [<repo>] [exit:<code>] git <args…>`
///
/// Invocations that never produced an exit status (spawn failures, timeouts,
/// signals) are recorded as `exit:-`.
#[derive(Debug, Clone)]
pub struct AuditLogger {
    log_path: PathBuf,
}

impl AuditLogger {
    /// Log to `~/.config/cliborg/history.log`
    pub fn new() -> io::Result<Self> {
        let home = std::env::var_os("HOME")
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "HOME is not set"))?;

        Self::with_path(
            PathBuf::from(home)
                .join(".config")
                .join("cliborg")
                .join("history.log"),
        )
    }

    /// Log to `path`, creating its parent directory
    pub fn with_path<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let log_path = path.as_ref().to_path_buf();
        if let Some(parent) = log_path.parent() {
            fs::create_dir_all(parent)?;
        }

        Ok(Self { log_path })
    }

    pub fn log_path(&self) -> &Path {
        &self.log_path
    }

    /// Where the previous history goes on rotation: `history.log.1`
    pub fn rotated_path(&self) -> PathBuf {
        let mut name = self.log_path.as_os_str().to_os_string();
        name.push(".1");
        PathBuf::from(name)
    }

    /// Append one invocation to the history
    pub fn log_command(
        &self,
        command: &str,
        repo_path: &Path,
        exit_code: Option<i32>,
    ) -> io::Result<()> {
        self.rotate_if_needed()?;

        let entry = format_entry(command, repo_path, exit_code);
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)?;
        file.write_all(entry.as_bytes())?;
        file.flush()
    }

    fn rotate_if_needed(&self) -> io::Result<()> {
        match fs::metadata(&self.log_path) {
            Ok(meta) if meta.len() > ROTATE_AT_BYTES => {
                fs::rename(&self.log_path, self.rotated_path())
            }
            Ok(_) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }
}

fn format_entry(command: &str, repo_path: &Path, exit_code: Option<i32>) -> String {
    let user = std::env::var("USER").unwrap_or_else(|_| "unknown".to_string());
    let exit = exit_code.map_or_else(|| "-".to_string(), |c| c.to_string());

    // Commit messages may span lines; keep one entry per line
    format!(
        "[{}] [{}] [{}] [exit:{}] {}\n",
        Utc::now().to_rfc3339(),
        user,
        repo_path.display(),
        exit,
        command.replace('\n', "\\n")
    )
}
