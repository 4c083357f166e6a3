//! Coordinating module: owns the config store, the canonical directories and
//! the external collaborators, and exposes every registry operation.

use chrono::Local;
use std::io;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::{BatchResult, Config, ImportReport, RunOutcome};
use crate::convert::{CommandConverter, ConvertError, Converter};
use crate::fetch::{self, FetchError};
use crate::import;
use crate::scan::{self, ReconcilePolicy, RECIPE_EXT};
use crate::schedule::{cron_line, CronBackend, ScheduleBackend, ScheduleSyncError};
use crate::settings::Settings;
use crate::store::{ConfigStore, StoreError};

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("recipe '{0}' not found")]
    NotFound(String),
    #[error(transparent)]
    Convert(#[from] ConvertError),
    #[error(transparent)]
    ScheduleSync(#[from] ScheduleSyncError),
    #[error("failed to scan recipes directory {path}: {source}")]
    Scan {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Fetch(#[from] FetchError),
}

/// The registry and download orchestration engine. Constructed once at
/// process start with its collaborators injected; every mutation of the
/// persisted document flows through the store's serialized update cycle.
pub struct Orchestrator {
    store: ConfigStore,
    recipes_dir: PathBuf,
    library_dir: PathBuf,
    import_cache_dir: PathBuf,
    artifact_ext: String,
    cron_command: String,
    reconcile_policy: ReconcilePolicy,
    converter: Box<dyn Converter>,
    schedule_backend: Box<dyn ScheduleBackend>,
}

impl Orchestrator {
    /// Wires up the production collaborators: the subprocess converter and
    /// the cron backend.
    pub fn new(settings: &Settings) -> Self {
        let converter = CommandConverter::new(
            settings.converter_command.clone(),
            Duration::from_secs(settings.convert_timeout_secs),
        );
        let backend = CronBackend::new(
            settings.cron_file.clone(),
            settings.cron_reload_command.clone(),
        );
        Self::with_collaborators(settings, Box::new(converter), Box::new(backend))
    }

    /// Constructor with injectable collaborators, used by tests to swap in
    /// mocks.
    pub fn with_collaborators(
        settings: &Settings,
        converter: Box<dyn Converter>,
        schedule_backend: Box<dyn ScheduleBackend>,
    ) -> Self {
        Orchestrator {
            store: ConfigStore::new(settings.config_file.clone()),
            recipes_dir: settings.recipes_dir.clone(),
            library_dir: settings.library_dir.clone(),
            import_cache_dir: settings.import_cache_dir.clone(),
            artifact_ext: settings.artifact_ext.clone(),
            cron_command: settings.cron_command.clone(),
            reconcile_policy: settings.reconcile_policy,
            converter,
            schedule_backend,
        }
    }

    pub fn store(&self) -> &ConfigStore {
        &self.store
    }

    /// Reconciles the recipe definitions on disk against the stored registry
    /// and persists the result. Returns the updated document.
    pub async fn scan(&self) -> Result<Config, EngineError> {
        let discovered = scan::discover(&self.recipes_dir).map_err(|e| EngineError::Scan {
            path: self.recipes_dir.clone(),
            source: e,
        })?;
        let policy = self.reconcile_policy;
        let (_, config) = self
            .store
            .update(move |config| {
                let reconciled = scan::reconcile(&discovered, &config.recipes, policy);
                config.recipes = reconciled;
            })
            .await?;
        Ok(config)
    }

    /// Converts one recipe. On success stamps `last_run` with the current
    /// timestamp; on any failure the stored state is left untouched.
    pub async fn convert_recipe(&self, name: &str) -> Result<(), EngineError> {
        let recipe_path = self.recipes_dir.join(format!("{name}{RECIPE_EXT}"));
        if !recipe_path.exists() {
            warn!(recipe = name, path = %recipe_path.display(), "Recipe file not found");
            return Err(EngineError::NotFound(name.to_string()));
        }
        let output_path = self
            .library_dir
            .join(format!("{name}.{}", self.artifact_ext));

        self.converter
            .convert(name, &recipe_path, &output_path)
            .await?;

        let stamp = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
        self.store
            .update(move |config| {
                if let Some(recipe) = config.recipes.get_mut(name) {
                    recipe.last_run = Some(stamp);
                }
            })
            .await?;
        info!(recipe = name, "Conversion recorded");
        Ok(())
    }

    /// Runs the converter over every enabled recipe, sequentially, recording
    /// a per-recipe outcome and never stopping on individual failure.
    /// Disabled recipes are omitted from the result entirely. Store failures
    /// are terminal for the whole batch.
    pub async fn run_all(&self) -> Result<BatchResult, EngineError> {
        let config = self.store.load().await?;
        let mut results = BatchResult::new();
        for (name, recipe) in &config.recipes {
            if !recipe.enabled {
                continue;
            }
            let outcome = match self.convert_recipe(name).await {
                Ok(()) => RunOutcome {
                    success: true,
                    message: "Success".to_string(),
                },
                Err(EngineError::Store(e)) => return Err(e.into()),
                Err(e) => RunOutcome {
                    success: false,
                    message: e.to_string(),
                },
            };
            results.insert(name.clone(), outcome);
        }
        info!(
            attempted = results.len(),
            failed = results.values().filter(|o| !o.success).count(),
            "Batch run complete"
        );
        Ok(results)
    }

    /// Flips a recipe's `enabled` flag and persists it. Returns the new
    /// value.
    pub async fn toggle(&self, name: &str) -> Result<bool, EngineError> {
        let (new_state, _) = self
            .store
            .update(|config| {
                config.recipes.get_mut(name).map(|recipe| {
                    recipe.enabled = !recipe.enabled;
                    recipe.enabled
                })
            })
            .await?;
        match new_state {
            Some(enabled) => {
                info!(recipe = name, enabled, "Toggled recipe");
                Ok(enabled)
            }
            None => Err(EngineError::NotFound(name.to_string())),
        }
    }

    /// Persists the new schedule, then pushes it to the external mechanism.
    /// A backend failure is surfaced but does not roll back the persisted
    /// fields; stored intent and active schedule diverge until a retry
    /// succeeds.
    pub async fn set_schedule(&self, hour: &str, minute: &str) -> Result<(), EngineError> {
        self.store
            .update(|config| {
                config.schedule.hour = hour.to_string();
                config.schedule.minute = minute.to_string();
            })
            .await?;
        let line = cron_line(minute, hour, &self.cron_command);
        self.schedule_backend.install(&line).await?;
        info!(hour, minute, "Schedule updated");
        Ok(())
    }

    /// Merges recipe definitions from a local source tree into the canonical
    /// location, then rescans so imported recipes become visible with
    /// defaults like freshly authored ones.
    pub async fn import_from(&self, source: &std::path::Path) -> Result<ImportReport, EngineError> {
        let report = import::import_from_dir(source, &self.recipes_dir);
        self.scan().await?;
        Ok(report)
    }

    /// Fetches a remote repository into the import cache and merges the
    /// recipe definitions it contains.
    pub async fn import_from_repo(&self, url: &str) -> Result<ImportReport, EngineError> {
        let tree = fetch::fetch_repo(url, &self.import_cache_dir).await?;
        self.import_from(&tree).await
    }
}
