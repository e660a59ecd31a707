//! File-backed preset persistence.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

use super::{settings, AppConfig};
use crate::core::{PresetMap, PresetStore};

pub const PRESETS_FILE: &str = "presets.json";

/// The presets a fresh installation starts with.
pub fn default_presets() -> PresetMap {
    let defaults: [(&str, &[&str]); 7] = [
        ("Git", &[".git", ".gitignore", ".github"]),
        (
            "Node.js",
            &["node_modules", "package-lock.json", "yarn.lock", "dist", "build"],
        ),
        (
            "Python",
            &["__pycache__", "venv", ".pytest_cache", "*.pyc", "*.pyo", ".coverage"],
        ),
        ("Rust", &["target", "Cargo.lock", "*.rs.bk"]),
        ("Java", &["*.class", "target", ".mvn", "*.jar", ".gradle"]),
        ("VS Code", &[".vscode", ".vs", "*.code-workspace"]),
        (
            "Docs & Temp",
            &["*.md", "README*", "LICENSE", "*.tmp", "*.temp", "*.log"],
        ),
    ];

    defaults
        .into_iter()
        .map(|(name, patterns)| {
            (
                name.to_string(),
                patterns.iter().map(|p| p.to_string()).collect(),
            )
        })
        .collect()
}

/// Stores all presets in one pretty-printed JSON object.
pub struct JsonPresetStore {
    path: PathBuf,
    seed_defaults: bool,
    /// Serializes read-modify-write cycles on the file.
    write_lock: Mutex<()>,
}

impl JsonPresetStore {
    pub fn new(path: impl Into<PathBuf>, seed_defaults: bool) -> Self {
        Self {
            path: path.into(),
            seed_defaults,
            write_lock: Mutex::new(()),
        }
    }

    /// Uses the configured presets file, or `presets.json` next to the config.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let path = match &config.presets_file {
            Some(path) => path.clone(),
            None => settings::get_config_directory()
                .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?
                .join(PRESETS_FILE),
        };
        Ok(Self::new(path, config.seed_default_presets))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read(&self) -> Result<PresetMap> {
        if !tokio::fs::try_exists(&self.path).await.unwrap_or(false) {
            if !self.seed_defaults {
                return Ok(PresetMap::new());
            }
            tracing::info!("Presets file not found, seeding defaults at {:?}", self.path);
            let defaults = default_presets();
            self.write(&defaults).await?;
            return Ok(defaults);
        }

        let content = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("reading {:?}", self.path))?;
        serde_json::from_str(&content).with_context(|| format!("parsing {:?}", self.path))
    }

    async fn write(&self, presets: &PresetMap) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_string_pretty(presets)?;
        tokio::fs::write(&self.path, json)
            .await
            .with_context(|| format!("writing {:?}", self.path))?;
        tracing::debug!("Wrote {} presets to {:?}", presets.len(), self.path);
        Ok(())
    }
}

#[async_trait]
impl PresetStore for JsonPresetStore {
    async fn list_presets(&self) -> Result<PresetMap> {
        let _guard = self.write_lock.lock().await;
        self.read().await
    }

    async fn save_preset(&self, name: &str, patterns: &[String]) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut presets = self.read().await?;
        presets.insert(name.to_string(), patterns.to_vec());
        self.write(&presets).await
    }

    async fn delete_preset(&self, name: &str) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut presets = self.read().await?;
        if presets.remove(name).is_some() {
            self.write(&presets).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_missing_file_is_seeded_with_defaults() {
        let dir = tempdir().unwrap();
        let store = JsonPresetStore::new(dir.path().join("nested").join(PRESETS_FILE), true);

        let presets = store.list_presets().await.unwrap();
        assert_eq!(presets, default_presets());
        assert!(store.path().exists());
    }

    #[tokio::test]
    async fn test_missing_file_without_seeding_is_empty() {
        let dir = tempdir().unwrap();
        let store = JsonPresetStore::new(dir.path().join(PRESETS_FILE), false);

        assert!(store.list_presets().await.unwrap().is_empty());
        assert!(!store.path().exists());
    }

    #[tokio::test]
    async fn test_saved_presets_survive_a_new_store_instance() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(PRESETS_FILE);

        let store = JsonPresetStore::new(&path, false);
        store
            .save_preset("Git", &[".git".to_string(), ".gitignore".to_string()])
            .await
            .unwrap();
        store.save_preset("Tmp", &["*.tmp".to_string()]).await.unwrap();
        store.delete_preset("Tmp").await.unwrap();

        let reopened = JsonPresetStore::new(&path, false);
        let presets = reopened.list_presets().await.unwrap();
        assert_eq!(presets.len(), 1);
        assert_eq!(presets["Git"], vec![".git", ".gitignore"]);
    }

    #[tokio::test]
    async fn test_corrupt_file_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(PRESETS_FILE);
        std::fs::write(&path, "[1, 2").unwrap();

        let store = JsonPresetStore::new(&path, true);
        assert!(store.list_presets().await.is_err());
    }

    #[test]
    fn test_default_presets_include_git() {
        let presets = default_presets();
        assert_eq!(presets.len(), 7);
        assert!(presets["Git"].contains(&".gitignore".to_string()));
    }
}
