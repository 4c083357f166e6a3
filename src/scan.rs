//! Discovery of recipe definition files and reconciliation against the
//! stored registry.

use regex::Regex;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::{debug, error, info};

use crate::config::{Recipe, Registry};

/// Suffix identifying a recipe definition file.
pub const RECIPE_EXT: &str = ".recipe";

/// Description stored when a definition file cannot be read during a scan.
pub const READ_ERROR_DESCRIPTION: &str = "Error reading recipe";

/// What a rescan does with registry entries whose definition file vanished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReconcilePolicy {
    /// The reconciled registry is keyed exactly by the files found this scan.
    #[default]
    PruneMissing,
    /// Entries without a backing file are carried forward unchanged.
    KeepMissing,
}

/// Enumerates recipe definition files in `source_dir`, yielding the derived
/// recipe name and the file path. A missing or unreadable directory is an
/// error; individual entries never are.
pub fn discover(source_dir: &Path) -> io::Result<Vec<(String, PathBuf)>> {
    let mut found = Vec::new();
    for entry in fs::read_dir(source_dir)? {
        let entry = entry?;
        let file_name = entry.file_name().to_string_lossy().into_owned();
        if let Some(name) = file_name.strip_suffix(RECIPE_EXT) {
            found.push((name.to_string(), entry.path()));
        }
    }
    debug!(dir = %source_dir.display(), count = found.len(), "Discovered recipe files");
    Ok(found)
}

/// Best-effort extraction of declared `title` and `description` fields from
/// a definition file's text. Absence of a match is not an error. Kept
/// separate so the definition format can evolve without touching
/// orchestration logic.
pub fn parse_recipe_fields(content: &str) -> (Option<String>, Option<String>) {
    static TITLE_RE: OnceLock<Regex> = OnceLock::new();
    static DESC_RE: OnceLock<Regex> = OnceLock::new();
    let title_re = TITLE_RE
        .get_or_init(|| Regex::new(r#"title\s*=\s*['"](.+?)['"]"#).expect("valid pattern"));
    let desc_re = DESC_RE
        .get_or_init(|| Regex::new(r#"description\s*=\s*['"](.+?)['"]"#).expect("valid pattern"));
    let title = title_re.captures(content).map(|c| c[1].to_string());
    let description = desc_re.captures(content).map(|c| c[1].to_string());
    (title, description)
}

/// Synthesizes a fresh registry entry for a newly discovered definition file.
/// A read failure does not exclude the recipe: it is registered with the name
/// as title and a sentinel description, and the error is logged.
pub fn recipe_from_file(name: &str, path: &Path) -> Recipe {
    match fs::read_to_string(path) {
        Ok(content) => {
            let (title, description) = parse_recipe_fields(&content);
            Recipe {
                title: title.unwrap_or_else(|| name.to_string()),
                description: description.unwrap_or_default(),
                enabled: true,
                last_run: None,
            }
        }
        Err(e) => {
            error!(error = ?e, path = %path.display(), "Error reading recipe file");
            Recipe {
                title: name.to_string(),
                description: READ_ERROR_DESCRIPTION.to_string(),
                enabled: true,
                last_run: None,
            }
        }
    }
}

/// Reconciles discovered definition files against the stored registry.
/// Known names carry their stored entry forward unchanged, preserving user
/// edits to `enabled` and the recorded `last_run`; new names get a freshly
/// parsed entry. Under [`ReconcilePolicy::KeepMissing`], stored entries with
/// no backing file survive as well.
pub fn reconcile(
    discovered: &[(String, PathBuf)],
    existing: &Registry,
    policy: ReconcilePolicy,
) -> Registry {
    let mut recipes = match policy {
        ReconcilePolicy::PruneMissing => Registry::new(),
        ReconcilePolicy::KeepMissing => existing.clone(),
    };
    for (name, path) in discovered {
        let entry = match existing.get(name) {
            Some(known) => known.clone(),
            None => recipe_from_file(name, path),
        };
        recipes.insert(name.clone(), entry);
    }
    info!(
        discovered = discovered.len(),
        registered = recipes.len(),
        ?policy,
        "Reconciled recipe registry"
    );
    recipes
}
