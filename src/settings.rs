//! Process settings, read from environment variables with the same defaults
//! a container deployment would bake in. No secrets live here.

use anyhow::Result;
use std::path::PathBuf;
use tracing::{error, info};

use crate::scan::ReconcilePolicy;

#[derive(Debug, Clone)]
pub struct Settings {
    /// Canonical recipe location: the scanner's read source and the
    /// importer's write target.
    pub recipes_dir: PathBuf,
    /// Where converted artifacts are delivered.
    pub library_dir: PathBuf,
    /// Path of the persisted config document.
    pub config_file: PathBuf,
    /// Cron definition file the schedule backend rewrites.
    pub cron_file: PathBuf,
    /// Where fetched source trees are checked out before import.
    pub import_cache_dir: PathBuf,
    /// External converter executable.
    pub converter_command: String,
    /// Extension of the delivered artifact, e.g. `epub`.
    pub artifact_ext: String,
    /// Hard bound on one converter invocation; the child is killed on expiry.
    pub convert_timeout_secs: u64,
    /// User + command portion of the generated cron line.
    pub cron_command: String,
    /// Command that makes the scheduler pick up a rewritten cron file.
    pub cron_reload_command: Vec<String>,
    /// Whether rescans drop registry entries whose definition file vanished.
    pub reconcile_policy: ReconcilePolicy,
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

impl Settings {
    /// Reads all settings from the environment, falling back to defaults.
    /// Only malformed values are errors; absence never is.
    pub fn from_env() -> Result<Self> {
        let convert_timeout_secs = match std::env::var("CONVERT_TIMEOUT_SECS") {
            Ok(raw) => raw.parse::<u64>().map_err(|e| {
                error!(error = ?e, value = %raw, "CONVERT_TIMEOUT_SECS must be a whole number of seconds");
                anyhow::anyhow!("CONVERT_TIMEOUT_SECS must be a whole number of seconds: {e}")
            })?,
            Err(_) => 1800,
        };

        let reconcile_policy = match env_or("PRUNE_MISSING_RECIPES", "true").as_str() {
            "true" | "1" | "yes" => ReconcilePolicy::PruneMissing,
            "false" | "0" | "no" => ReconcilePolicy::KeepMissing,
            other => {
                error!(value = %other, "PRUNE_MISSING_RECIPES must be a boolean");
                anyhow::bail!("PRUNE_MISSING_RECIPES must be a boolean, got {other:?}");
            }
        };

        let cron_reload_command: Vec<String> = env_or("CRON_RELOAD_CMD", "systemctl restart cron")
            .split_whitespace()
            .map(str::to_string)
            .collect();
        if cron_reload_command.is_empty() {
            anyhow::bail!("CRON_RELOAD_CMD must not be empty");
        }

        let settings = Settings {
            recipes_dir: env_or("RECIPES_FOLDER", "/opt/recipes").into(),
            library_dir: env_or("LIBRARY_FOLDER", "/opt/library").into(),
            config_file: env_or("CONFIG_FILE", "/opt/recipe_deck.json").into(),
            cron_file: env_or("CRON_FILE", "/etc/cron.d/recipe_deck").into(),
            import_cache_dir: std::env::var("IMPORT_CACHE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| std::env::temp_dir()),
            converter_command: env_or("CONVERTER_COMMAND", "ebook-convert"),
            artifact_ext: env_or("ARTIFACT_EXT", "epub"),
            convert_timeout_secs,
            cron_command: env_or("CRON_COMMAND", "calibre /usr/local/bin/recipe-deck run-all"),
            cron_reload_command,
            reconcile_policy,
        };

        info!(
            recipes_dir = %settings.recipes_dir.display(),
            library_dir = %settings.library_dir.display(),
            config_file = %settings.config_file.display(),
            converter = %settings.converter_command,
            "Settings loaded from environment"
        );
        Ok(settings)
    }
}
