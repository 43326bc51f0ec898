use chrono::Utc;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

const MAX_LOG_SIZE: u64 = 10 * 1024 * 1024; // 10MB

/// Append-only history of executed and rejected commands
pub struct AuditLogger {
    log_path: PathBuf,
}

impl AuditLogger {
    /// Logger writing to ~/.config/gitpilot/history.log
    pub fn new() -> std::io::Result<Self> {
        Self::with_path(Self::default_log_path()?)
    }

    /// Create an AuditLogger with a custom log path
    pub fn with_path<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        let log_path = path.as_ref().to_path_buf();

        if let Some(parent) = log_path.parent() {
            fs::create_dir_all(parent)?;
        }

        Ok(Self { log_path })
    }

    fn default_log_path() -> std::io::Result<PathBuf> {
        let home = std::env::var("HOME").map_err(|_| {
            std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "HOME environment variable not set",
            )
        })?;

        Ok(PathBuf::from(home)
            .join(".config")
            .join("gitpilot")
            .join("history.log"))
    }

    /// Record a command that ran. `exit_code` is `None` when the shell never
    /// started or the process was killed.
    pub fn log_execution(
        &self,
        command: &str,
        working_dir: &Path,
        exit_code: Option<i32>,
    ) -> std::io::Result<()> {
        let exit = exit_code.map_or_else(|| "none".to_string(), |code| code.to_string());
        self.append(working_dir, &format!("[exit:{}] {}", exit, command))
    }

    /// Record a policy rejection, keeping the model's raw output for forensics
    pub fn log_rejection(
        &self,
        request: &str,
        raw_output: &str,
        reason: &str,
        working_dir: &Path,
    ) -> std::io::Result<()> {
        self.append(
            working_dir,
            &format!(
                "[REJECTED] request={:?} llm_output={:?} reason={:?}",
                request, raw_output, reason
            ),
        )
    }

    fn append(&self, working_dir: &Path, body: &str) -> std::io::Result<()> {
        self.rotate_if_needed()?;

        let timestamp = Utc::now().to_rfc3339();
        let user = std::env::var("USER").unwrap_or_else(|_| "unknown".to_string());
        let entry = format!(
            "[{}] [{}] [{}] {}\n",
            timestamp,
            user,
            working_dir.display(),
            body
        );

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)?;

        file.write_all(entry.as_bytes())?;
        file.flush()
    }

    /// Move history.log to history.log.1 once it outgrows MAX_LOG_SIZE
    fn rotate_if_needed(&self) -> std::io::Result<()> {
        if !self.log_path.exists() {
            return Ok(());
        }

        if fs::metadata(&self.log_path)?.len() > MAX_LOG_SIZE {
            let backup_path = self.log_path.with_extension("log.1");
            fs::rename(&self.log_path, backup_path)?;
        }

        Ok(())
    }

    pub fn log_path(&self) -> &Path {
        &self.log_path
    }
}
