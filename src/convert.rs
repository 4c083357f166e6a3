//! Invocation of the external converter for a single recipe.

use async_trait::async_trait;
use chrono::Local;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info};

#[cfg(any(test, feature = "test-export-mocks"))]
use mockall::automock;

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("failed to run converter: {0}")]
    Spawn(#[from] std::io::Error),
    #[error("converter exited with {status}: {stderr}")]
    Failed {
        status: std::process::ExitStatus,
        stderr: String,
    },
    #[error("converter timed out after {0} seconds")]
    Timeout(u64),
}

/// Seam between orchestration and the external converter process. Implemented
/// by [`CommandConverter`] in production and by mocks in tests.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait Converter: Send + Sync {
    /// Converts one recipe definition into the artifact at `output_path`.
    /// The process exit code is the sole success signal.
    async fn convert(
        &self,
        name: &str,
        recipe_path: &Path,
        output_path: &Path,
    ) -> Result<(), ConvertError>;
}

/// Runs the converter executable as a subprocess with the fixed argument
/// template, bounded by a hard timeout.
pub struct CommandConverter {
    program: String,
    timeout: Duration,
}

impl CommandConverter {
    pub fn new(program: impl Into<String>, timeout: Duration) -> Self {
        CommandConverter {
            program: program.into(),
            timeout,
        }
    }
}

#[async_trait]
impl Converter for CommandConverter {
    async fn convert(
        &self,
        name: &str,
        recipe_path: &Path,
        output_path: &Path,
    ) -> Result<(), ConvertError> {
        let now = Local::now();
        let date = now.format("%Y-%m-%d");
        let series_index = now.format("%Y%m%d");

        let mut command = tokio::process::Command::new(&self.program);
        command
            .arg(recipe_path)
            .arg(output_path)
            .arg("--output-profile=tablet")
            .arg(format!("--pubdate={date}"))
            .arg(format!("--title={name} - {date}"))
            .arg(format!("--series={name}"))
            .arg(format!("--series-index={series_index}"))
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            // A timed-out child must not outlive the invocation.
            .kill_on_drop(true);

        info!(
            recipe = name,
            program = %self.program,
            output = %output_path.display(),
            "Invoking converter"
        );

        let child = command.spawn().map_err(|e| {
            error!(error = ?e, recipe = name, program = %self.program, "Failed to launch converter");
            ConvertError::Spawn(e)
        })?;

        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(waited) => waited?,
            Err(_) => {
                error!(
                    recipe = name,
                    timeout_secs = self.timeout.as_secs(),
                    "Converter timed out, killing process"
                );
                return Err(ConvertError::Timeout(self.timeout.as_secs()));
            }
        };

        if output.status.success() {
            info!(recipe = name, output = %output_path.display(), "Conversion succeeded");
            Ok(())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
            error!(
                recipe = name,
                status = ?output.status,
                stderr = %stderr,
                "Converter exited with non-zero code"
            );
            Err(ConvertError::Failed {
                status: output.status,
                stderr,
            })
        }
    }
}
