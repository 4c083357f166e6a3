use recipe_deck::config::Recipe;
use recipe_deck::store::{ConfigStore, StoreError};
use std::sync::Arc;
use tempfile::tempdir;

#[tokio::test]
async fn first_load_synthesizes_and_persists_defaults() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.json");
    let store = ConfigStore::new(&path);

    let config = store.load().await.unwrap();
    assert!(config.recipes.is_empty());
    assert_eq!(config.schedule.hour, "*/6");
    assert_eq!(config.schedule.minute, "0");

    // The defaults were written through, not just returned.
    assert!(path.exists());
    let again = store.load().await.unwrap();
    assert_eq!(again, config);
}

#[tokio::test]
async fn update_persists_across_store_instances() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.json");

    let store = ConfigStore::new(&path);
    store
        .update(|config| {
            config.recipes.insert(
                "news".to_string(),
                Recipe {
                    title: "News".to_string(),
                    description: String::new(),
                    enabled: false,
                    last_run: None,
                },
            );
        })
        .await
        .unwrap();

    // A fresh store over the same path sees the mutation.
    let reopened = ConfigStore::new(&path);
    let config = reopened.load().await.unwrap();
    assert_eq!(config.recipes.len(), 1);
    assert!(!config.recipes["news"].enabled);
}

#[tokio::test]
async fn corrupt_document_surfaces_persistence_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(&path, "not json at all {").unwrap();

    let store = ConfigStore::new(&path);
    let err = store.load().await.unwrap_err();
    assert!(matches!(err, StoreError::Corrupt { .. }));
}

#[tokio::test]
async fn concurrent_updates_are_serialized_not_lost() {
    let dir = tempdir().unwrap();
    let store = Arc::new(ConfigStore::new(dir.path().join("config.json")));

    let recipe = |title: &str| Recipe {
        title: title.to_string(),
        description: String::new(),
        enabled: true,
        last_run: None,
    };

    let mut handles = Vec::new();
    for i in 0..8 {
        let store = Arc::clone(&store);
        let recipe = recipe(&format!("Recipe {i}"));
        handles.push(tokio::spawn(async move {
            store
                .update(move |config| {
                    config.recipes.insert(format!("recipe-{i}"), recipe);
                })
                .await
                .unwrap();
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    // Every writer's insert survived the full load-mutate-save cycles.
    let config = store.load().await.unwrap();
    assert_eq!(config.recipes.len(), 8);
}
