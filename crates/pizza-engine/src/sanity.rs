//! OS facade for test bodies
//!
//! Cases that need to touch the host (files, directories, environment,
//! child processes) go through [`Sanity`], so a fake can stand in where the
//! real thing is unwanted. The engine never calls it.

use chrono::{SecondsFormat, Utc};
use std::env;
use std::fs;
use std::io;
use std::path::Path;
use std::process::Command;
use std::thread;
use std::time::{Duration, Instant};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SanityError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("{0} is not supported on this platform")]
    Unsupported(&'static str),

    #[error("command '{command}' exited with status {code}")]
    CommandFailed { command: String, code: i32 },
}

pub type SanityResult<T> = Result<T, SanityError>;

pub trait Sanity {
    /// Id of the current process
    fn pid(&self) -> u32;

    fn sleep(&self, duration: Duration);

    /// Run `command` through the platform shell and return its exit status
    fn execute(&self, command: &str) -> SanityResult<i32>;

    fn file_exists(&self, path: &Path) -> bool;
    /// Create an empty file, truncating an existing one
    fn create_file(&self, path: &Path) -> SanityResult<()>;
    fn delete_file(&self, path: &Path) -> SanityResult<()>;

    fn dir_exists(&self, path: &Path) -> bool;
    /// Create a directory and any missing parents
    fn create_dir(&self, path: &Path) -> SanityResult<()>;
    /// Remove a directory and everything in it
    fn remove_dir(&self, path: &Path) -> SanityResult<()>;

    fn env_get(&self, key: &str) -> Option<String>;
    fn env_set(&self, key: &str, value: &str);

    /// Current UTC time, RFC 3339 with millisecond precision
    fn timestamp(&self) -> String;

    /// Time since the facade was created
    fn uptime(&self) -> Duration;

    fn is_process_alive(&self, pid: u32) -> SanityResult<bool>;
    fn kill(&self, pid: u32) -> SanityResult<()>;
}

/// [`Sanity`] backed by the standard library and the platform shell
#[derive(Debug, Clone)]
pub struct SystemSanity {
    started: Instant,
}

impl SystemSanity {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
        }
    }
}

impl Default for SystemSanity {
    fn default() -> Self {
        Self::new()
    }
}

impl Sanity for SystemSanity {
    fn pid(&self) -> u32 {
        std::process::id()
    }

    fn sleep(&self, duration: Duration) {
        thread::sleep(duration);
    }

    fn execute(&self, command: &str) -> SanityResult<i32> {
        tracing::debug!(command, "executing shell command");
        let status = shell(command).status()?;
        // Killed by a signal: no code
        Ok(status.code().unwrap_or(-1))
    }

    fn file_exists(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn create_file(&self, path: &Path) -> SanityResult<()> {
        fs::File::create(path)?;
        Ok(())
    }

    fn delete_file(&self, path: &Path) -> SanityResult<()> {
        fs::remove_file(path)?;
        Ok(())
    }

    fn dir_exists(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn create_dir(&self, path: &Path) -> SanityResult<()> {
        fs::create_dir_all(path)?;
        Ok(())
    }

    fn remove_dir(&self, path: &Path) -> SanityResult<()> {
        fs::remove_dir_all(path)?;
        Ok(())
    }

    fn env_get(&self, key: &str) -> Option<String> {
        env::var(key).ok()
    }

    fn env_set(&self, key: &str, value: &str) {
        env::set_var(key, value);
    }

    fn timestamp(&self) -> String {
        Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    fn uptime(&self) -> Duration {
        self.started.elapsed()
    }

    #[cfg(unix)]
    fn is_process_alive(&self, pid: u32) -> SanityResult<bool> {
        let status = Command::new("kill")
            .args(["-0", &pid.to_string()])
            .stderr(std::process::Stdio::null())
            .status()?;
        Ok(status.success())
    }

    #[cfg(not(unix))]
    fn is_process_alive(&self, _pid: u32) -> SanityResult<bool> {
        Err(SanityError::Unsupported("process liveness check"))
    }

    #[cfg(unix)]
    fn kill(&self, pid: u32) -> SanityResult<()> {
        let command = format!("kill -9 {}", pid);
        let status = Command::new("kill")
            .args(["-9", &pid.to_string()])
            .stderr(std::process::Stdio::null())
            .status()?;
        if status.success() {
            Ok(())
        } else {
            Err(SanityError::CommandFailed {
                command,
                code: status.code().unwrap_or(-1),
            })
        }
    }

    #[cfg(not(unix))]
    fn kill(&self, _pid: u32) -> SanityResult<()> {
        Err(SanityError::Unsupported("process kill"))
    }
}

#[cfg(unix)]
fn shell(command: &str) -> Command {
    let mut cmd = Command::new("sh");
    cmd.args(["-c", command]);
    cmd
}

#[cfg(windows)]
fn shell(command: &str) -> Command {
    let mut cmd = Command::new("cmd");
    cmd.args(["/C", command]);
    cmd
}
