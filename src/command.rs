//! Execution of external listing commands (`lspath`, `vmstat -v`).
//!
//! Collectors that scrape command output depend on [`CommandRunner`] rather
//! than spawning processes themselves, so tests can feed them canned text.

use std::process::{Command, Stdio};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to execute `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

/// Runs a command and captures its standard output.
pub trait CommandRunner: Send + Sync {
    /// Returns everything the command wrote to standard output.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Spawn`] if the process cannot be started or its output
    /// cannot be read.
    fn output(&self, program: &str, args: &[&str]) -> Result<String>;
}

/// Spawns real child processes.
///
/// The exit status is not interpreted: whatever the command printed is
/// returned, matching how `popen(3)` based scrapers behave.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessRunner;

impl CommandRunner for ProcessRunner {
    fn output(&self, program: &str, args: &[&str]) -> Result<String> {
        let output = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .output()
            .map_err(|source| Error::Spawn {
                program: program.to_owned(),
                source,
            })?;

        if !output.status.success() {
            log::debug!(
                "`{}` exited with {}: {}",
                program,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}
