//! Durable persistence of the [`Config`] document.
//!
//! The store is the only writer of the document. Every mutation goes through
//! [`ConfigStore::update`], which serializes the whole load-mutate-save cycle
//! behind one mutex so concurrent mutators cannot lose each other's writes.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, error, info};

use crate::config::Config;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to access config document {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("config document {path} is not valid JSON: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// JSON-backed store for the persisted [`Config`] document.
pub struct ConfigStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        ConfigStore {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the persisted document, synthesizing and persisting the
    /// default document if none exists yet.
    pub async fn load(&self) -> Result<Config, StoreError> {
        let _guard = self.lock.lock().await;
        self.read_or_init()
    }

    /// Loads the document, applies `mutate` to it in memory, and saves the
    /// result. The whole cycle holds the store lock, so updates from
    /// concurrent callers are applied one after the other, never lost.
    ///
    /// Returns the closure's output alongside the saved document.
    pub async fn update<T>(
        &self,
        mutate: impl FnOnce(&mut Config) -> T,
    ) -> Result<(T, Config), StoreError> {
        let _guard = self.lock.lock().await;
        let mut config = self.read_or_init()?;
        let out = mutate(&mut config);
        self.write(&config)?;
        Ok((out, config))
    }

    fn read_or_init(&self) -> Result<Config, StoreError> {
        if !self.path.exists() {
            info!(path = %self.path.display(), "No config document found, writing defaults");
            let config = Config::default();
            self.write(&config)?;
            return Ok(config);
        }
        let content = fs::read_to_string(&self.path).map_err(|e| {
            error!(error = ?e, path = %self.path.display(), "Failed to read config document");
            StoreError::Io {
                path: self.path.clone(),
                source: e,
            }
        })?;
        let config: Config = serde_json::from_str(&content).map_err(|e| {
            error!(error = ?e, path = %self.path.display(), "Failed to parse config document");
            StoreError::Corrupt {
                path: self.path.clone(),
                source: e,
            }
        })?;
        debug!(path = %self.path.display(), recipes = config.recipes.len(), "Read config document");
        Ok(config)
    }

    /// Serializes the full document and atomically replaces the old one:
    /// write to a sibling temp file, then rename over the target.
    fn write(&self, config: &Config) -> Result<(), StoreError> {
        let io_err = |e: io::Error| StoreError::Io {
            path: self.path.clone(),
            source: e,
        };
        let json = serde_json::to_string_pretty(config).map_err(|e| StoreError::Corrupt {
            path: self.path.clone(),
            source: e,
        })?;
        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, json).map_err(io_err)?;
        fs::rename(&tmp_path, &self.path).map_err(io_err)?;
        debug!(path = %self.path.display(), "Wrote config document");
        Ok(())
    }
}
