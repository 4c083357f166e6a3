//! Materializing a remote recipe collection into a local checkout.
//!
//! Shells out to `git`; an existing checkout is updated in place so repeated
//! fetches of the same repository are idempotent.

use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::process::Command;
use tracing::{error, info};

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid repository URL: {0}")]
    InvalidUrl(String),
    #[error("failed to prepare cache directory {path}: {source}")]
    CacheDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to launch git: {0}")]
    Spawn(#[from] std::io::Error),
    #[error("git {op} exited with {status}: {stderr}")]
    GitFailed {
        op: &'static str,
        status: std::process::ExitStatus,
        stderr: String,
    },
}

/// Derives the checkout directory name from the URL's final path segment.
/// Requires at least owner and repository segments after the host.
fn repo_dir_name(url: &str) -> Result<&str, FetchError> {
    let path = if let Some((_, rest)) = url.split_once("://") {
        rest.split_once('/').map(|(_, p)| p).unwrap_or("")
    } else if let Some((_, p)) = url.split_once(':') {
        // scp-like syntax: git@host:owner/repo.git
        p
    } else {
        url
    };
    let parts: Vec<&str> = path
        .trim_matches('/')
        .split('/')
        .filter(|s| !s.is_empty())
        .collect();
    if parts.len() < 2 {
        return Err(FetchError::InvalidUrl(url.to_string()));
    }
    Ok(parts[parts.len() - 1])
}

async fn run_git(op: &'static str, args: &[&str]) -> Result<(), FetchError> {
    let output = Command::new("git").args(args).output().await?;
    if output.status.success() {
        info!(op, ?args, "git succeeded");
        Ok(())
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        error!(op, ?args, status = ?output.status, stderr = %stderr, "git failed");
        Err(FetchError::GitFailed {
            op,
            status: output.status,
            stderr,
        })
    }
}

/// Clones `url` under `cache_dir`, or pulls if a checkout already exists.
/// Returns the checkout path.
pub async fn fetch_repo(url: &str, cache_dir: &Path) -> Result<PathBuf, FetchError> {
    let target = cache_dir.join(repo_dir_name(url)?);
    let target_str = target.to_string_lossy().into_owned();

    // Ensure the cache root exists for placing checkouts.
    std::fs::create_dir_all(cache_dir).map_err(|e| {
        error!(error = ?e, path = %cache_dir.display(), "Failed to create cache directory");
        FetchError::CacheDir {
            path: cache_dir.to_path_buf(),
            source: e,
        }
    })?;

    if target.exists() {
        info!(url, path = %target.display(), "Updating existing checkout");
        run_git("pull", &["-C", target_str.as_str(), "pull"]).await?;
    } else {
        info!(url, path = %target.display(), "Cloning repository");
        run_git("clone", &["clone", url, target_str.as_str()]).await?;
    }
    Ok(target)
}
