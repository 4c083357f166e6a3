use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// The persisted root document: the full recipe registry plus the
/// recurring-run schedule. Read and rewritten wholesale on every mutation.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub recipes: Registry,
    #[serde(default)]
    pub schedule: Schedule,
}

/// Mapping from recipe name to its stored state. Names are unique; insertion
/// order is irrelevant.
pub type Registry = BTreeMap<String, Recipe>;

impl Config {
    pub fn trace_loaded(&self) {
        info!(
            recipes_count = self.recipes.len(),
            hour = %self.schedule.hour,
            minute = %self.schedule.minute,
            "Loaded Config"
        );
        debug!(?self, "Config loaded (full debug)");
    }
}

/// A named content-source definition driving one conversion job. The name is
/// the registry key, derived from the definition file's base name.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Recipe {
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Controls inclusion in batch runs. Recipes stored before this field
    /// existed default to enabled.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Timestamp of the most recent successful conversion, formatted
    /// `YYYY-MM-DD HH:MM:SS`. Absent until the first success.
    #[serde(default)]
    pub last_run: Option<String>,
}

fn default_enabled() -> bool {
    true
}

/// Recurrence of the external executor, in cron field syntax.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Schedule {
    pub hour: String,
    pub minute: String,
}

impl Default for Schedule {
    fn default() -> Self {
        Schedule {
            hour: "*/6".to_string(),
            minute: "0".to_string(),
        }
    }
}

/// Outcome of one conversion attempt inside a batch run. Ephemeral.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RunOutcome {
    pub success: bool,
    pub message: String,
}

/// Per-recipe outcomes of one batch run, keyed by recipe name. Disabled
/// recipes are not present at all.
pub type BatchResult = BTreeMap<String, RunOutcome>;

/// Summary of one import operation. Ephemeral.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct ImportReport {
    pub total: usize,
    pub imported: usize,
    pub skipped: usize,
    pub details: Vec<String>,
}
