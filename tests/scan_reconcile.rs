use recipe_deck::convert::MockConverter;
use recipe_deck::orchestrate::Orchestrator;
use recipe_deck::scan::{ReconcilePolicy, READ_ERROR_DESCRIPTION};
use recipe_deck::schedule::MockScheduleBackend;
use recipe_deck::settings::Settings;
use recipe_deck::store::ConfigStore;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn settings_for(root: &Path, policy: ReconcilePolicy) -> Settings {
    let settings = Settings {
        recipes_dir: root.join("recipes"),
        library_dir: root.join("library"),
        config_file: root.join("config.json"),
        cron_file: root.join("cron_recipes"),
        import_cache_dir: root.join("cache"),
        converter_command: "true".to_string(),
        artifact_ext: "epub".to_string(),
        convert_timeout_secs: 60,
        cron_command: "calibre /usr/local/bin/recipe-deck run-all".to_string(),
        cron_reload_command: vec!["true".to_string()],
        reconcile_policy: policy,
    };
    fs::create_dir_all(&settings.recipes_dir).unwrap();
    fs::create_dir_all(&settings.library_dir).unwrap();
    settings
}

fn engine_for(settings: &Settings) -> Orchestrator {
    Orchestrator::with_collaborators(
        settings,
        Box::new(MockConverter::new()),
        Box::new(MockScheduleBackend::new()),
    )
}

#[tokio::test]
async fn scan_registers_new_recipes_with_parsed_fields() {
    let root = tempdir().unwrap();
    let settings = settings_for(root.path(), ReconcilePolicy::PruneMissing);
    fs::write(
        settings.recipes_dir.join("daily_news.recipe"),
        "title = 'Daily News'\ndescription = 'Morning headlines'\n",
    )
    .unwrap();
    fs::write(settings.recipes_dir.join("bare.recipe"), "no fields").unwrap();
    fs::write(settings.recipes_dir.join("notes.txt"), "ignored").unwrap();

    let engine = engine_for(&settings);
    let config = engine.scan().await.unwrap();

    assert_eq!(config.recipes.len(), 2);
    let daily = &config.recipes["daily_news"];
    assert_eq!(daily.title, "Daily News");
    assert_eq!(daily.description, "Morning headlines");
    assert!(daily.enabled);
    assert_eq!(daily.last_run, None);

    let bare = &config.recipes["bare"];
    assert_eq!(bare.title, "bare");
    assert_eq!(bare.description, "");
}

#[tokio::test]
async fn rescan_carries_existing_entries_forward_unchanged() {
    let root = tempdir().unwrap();
    let settings = settings_for(root.path(), ReconcilePolicy::PruneMissing);
    fs::write(
        settings.recipes_dir.join("weekly.recipe"),
        "title = 'Weekly'",
    )
    .unwrap();

    let engine = engine_for(&settings);
    engine.scan().await.unwrap();
    engine.toggle("weekly").await.unwrap();

    // Changing the file on disk must not clobber stored user edits.
    fs::write(
        settings.recipes_dir.join("weekly.recipe"),
        "title = 'Weekly Renamed'",
    )
    .unwrap();

    let first = engine.scan().await.unwrap();
    let second = engine.scan().await.unwrap();
    assert_eq!(first.recipes, second.recipes);
    let weekly = &second.recipes["weekly"];
    assert!(!weekly.enabled);
    assert_eq!(weekly.title, "Weekly");
}

#[tokio::test]
async fn unreadable_definition_is_registered_with_sentinel_description() {
    let root = tempdir().unwrap();
    let settings = settings_for(root.path(), ReconcilePolicy::PruneMissing);
    // A directory with the recipe suffix is discovered but cannot be read.
    fs::create_dir(settings.recipes_dir.join("broken.recipe")).unwrap();

    let engine = engine_for(&settings);
    let config = engine.scan().await.unwrap();

    let broken = &config.recipes["broken"];
    assert_eq!(broken.title, "broken");
    assert_eq!(broken.description, READ_ERROR_DESCRIPTION);
    assert!(broken.enabled);
}

#[tokio::test]
async fn scanning_empty_directory_persists_empty_registry() {
    let root = tempdir().unwrap();
    let settings = settings_for(root.path(), ReconcilePolicy::PruneMissing);
    fs::write(settings.recipes_dir.join("old.recipe"), "title = 'Old'").unwrap();

    let engine = engine_for(&settings);
    engine.scan().await.unwrap();
    fs::remove_file(settings.recipes_dir.join("old.recipe")).unwrap();

    let config = engine.scan().await.unwrap();
    assert!(config.recipes.is_empty());

    // No stale entries linger when the document is reloaded from scratch.
    let store = ConfigStore::new(&settings.config_file);
    assert!(store.load().await.unwrap().recipes.is_empty());
}

#[tokio::test]
async fn keep_missing_policy_retains_entries_without_files() {
    let root = tempdir().unwrap();
    let settings = settings_for(root.path(), ReconcilePolicy::KeepMissing);
    fs::write(settings.recipes_dir.join("kept.recipe"), "title = 'Kept'").unwrap();

    let engine = engine_for(&settings);
    engine.scan().await.unwrap();
    fs::remove_file(settings.recipes_dir.join("kept.recipe")).unwrap();

    let config = engine.scan().await.unwrap();
    assert_eq!(config.recipes.len(), 1);
    assert_eq!(config.recipes["kept"].title, "Kept");
}
