//! Merging externally-sourced recipe definitions into the canonical recipe
//! location, with content-based deduplication.

use std::fs;
use std::path::Path;
use tracing::{debug, error, info};

use crate::config::ImportReport;
use crate::scan::RECIPE_EXT;

/// Walks `source` recursively and copies every recipe definition file into
/// `recipes_dir`. Files whose bytes already match the canonical copy are
/// skipped; anything else overwrites. Per-file failures are recorded in the
/// report and never abort the walk.
pub fn import_from_dir(source: &Path, recipes_dir: &Path) -> ImportReport {
    let mut report = ImportReport::default();
    visit_dir(source, recipes_dir, &mut report);
    info!(
        source = %source.display(),
        total = report.total,
        imported = report.imported,
        skipped = report.skipped,
        "Import walk complete"
    );
    report
}

fn visit_dir(dir: &Path, recipes_dir: &Path, report: &mut ImportReport) {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            error!(error = ?e, path = %dir.display(), "Failed to read directory during import");
            report
                .details
                .push(format!("Error reading {}: {e}", dir.display()));
            return;
        }
    };
    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                report
                    .details
                    .push(format!("Error reading entry in {}: {e}", dir.display()));
                continue;
            }
        };
        let path = entry.path();
        if path.is_dir() {
            let dir_name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
            if dir_name == ".git" {
                debug!(path = %path.display(), "Skipping directory");
                continue;
            }
            visit_dir(&path, recipes_dir, report);
        } else if path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.ends_with(RECIPE_EXT))
        {
            import_file(&path, recipes_dir, report);
        }
    }
}

fn import_file(source_path: &Path, recipes_dir: &Path, report: &mut ImportReport) {
    report.total += 1;
    // file_name is present: the suffix filter above matched on it.
    let file_name = source_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let target_path = recipes_dir.join(&file_name);

    let copy_result = (|| -> std::io::Result<bool> {
        if target_path.exists() {
            let incoming = fs::read(source_path)?;
            let current = fs::read(&target_path)?;
            if incoming == current {
                return Ok(false);
            }
        }
        fs::copy(source_path, &target_path)?;
        Ok(true)
    })();

    match copy_result {
        Ok(true) => {
            report.imported += 1;
            report.details.push(format!("Imported {file_name}"));
            debug!(file = %file_name, "Imported recipe file");
        }
        Ok(false) => {
            report.skipped += 1;
            report
                .details
                .push(format!("Skipped {file_name} (identical)"));
            debug!(file = %file_name, "Skipped identical recipe file");
        }
        Err(e) => {
            error!(error = ?e, file = %file_name, "Failed to import recipe file");
            report
                .details
                .push(format!("Error importing {file_name}: {e}"));
        }
    }
}
