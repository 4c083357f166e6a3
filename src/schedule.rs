//! Synchronization of the stored schedule with the external cron mechanism.

use async_trait::async_trait;
use std::path::PathBuf;
use thiserror::Error;
use tokio::process::Command;
use tracing::{error, info};

#[cfg(any(test, feature = "test-export-mocks"))]
use mockall::automock;

#[derive(Debug, Error)]
pub enum ScheduleSyncError {
    #[error("failed to write cron file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to launch scheduler reload command: {0}")]
    Spawn(#[from] std::io::Error),
    #[error("scheduler reload exited with {status}")]
    Reload { status: std::process::ExitStatus },
}

/// Renders the single cron.d line encoding the recurrence and the fixed
/// batch-run command.
pub fn cron_line(minute: &str, hour: &str, command: &str) -> String {
    format!("{minute} {hour} * * * {command}\n")
}

/// Seam to the external recurring-execution mechanism. [`CronBackend`] is the
/// production implementation; tests install mocks.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait ScheduleBackend: Send + Sync {
    /// Replaces the active schedule definition with `line` and asks the
    /// mechanism to reload.
    async fn install(&self, line: &str) -> Result<(), ScheduleSyncError>;
}

/// Rewrites a cron.d file and reloads the cron service via a subprocess.
pub struct CronBackend {
    cron_file: PathBuf,
    reload_command: Vec<String>,
}

impl CronBackend {
    pub fn new(cron_file: impl Into<PathBuf>, reload_command: Vec<String>) -> Self {
        CronBackend {
            cron_file: cron_file.into(),
            reload_command,
        }
    }
}

#[async_trait]
impl ScheduleBackend for CronBackend {
    async fn install(&self, line: &str) -> Result<(), ScheduleSyncError> {
        std::fs::write(&self.cron_file, line).map_err(|e| {
            error!(error = ?e, path = %self.cron_file.display(), "Failed to write cron file");
            ScheduleSyncError::Write {
                path: self.cron_file.clone(),
                source: e,
            }
        })?;
        info!(path = %self.cron_file.display(), line = %line.trim_end(), "Wrote cron file");

        let (program, args) = self.reload_command.split_first().ok_or_else(|| {
            ScheduleSyncError::Spawn(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "empty scheduler reload command",
            ))
        })?;
        let status = Command::new(program).args(args).status().await?;
        if status.success() {
            info!(command = ?self.reload_command, "Scheduler reloaded");
            Ok(())
        } else {
            error!(command = ?self.reload_command, status = ?status, "Scheduler reload failed");
            Err(ScheduleSyncError::Reload { status })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cron_line_encodes_minute_hour_and_wildcards() {
        let line = cron_line("0", "*/6", "calibre /usr/local/bin/recipe-deck run-all");
        assert_eq!(
            line,
            "0 */6 * * * calibre /usr/local/bin/recipe-deck run-all\n"
        );
    }
}
