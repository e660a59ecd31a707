//! Named ignore-pattern sets and the single active selection among them.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use super::error::CoreError;

/// Preset name to its ignore patterns, as persisted.
pub type PresetMap = BTreeMap<String, Vec<String>>;

/// The persistence boundary for presets.
///
/// Patterns are opaque to both the store and the registry; only the parsing
/// engine interprets them.
#[async_trait]
pub trait PresetStore: Send + Sync {
    async fn list_presets(&self) -> anyhow::Result<PresetMap>;
    async fn save_preset(&self, name: &str, patterns: &[String]) -> anyhow::Result<()>;
    async fn delete_preset(&self, name: &str) -> anyhow::Result<()>;
}

/// A store that only lives as long as the process.
#[derive(Debug, Default)]
pub struct MemoryPresetStore {
    presets: Mutex<PresetMap>,
}

impl MemoryPresetStore {
    pub fn with_presets(presets: PresetMap) -> Self {
        Self {
            presets: Mutex::new(presets),
        }
    }

    fn lock(&self) -> anyhow::Result<std::sync::MutexGuard<'_, PresetMap>> {
        self.presets
            .lock()
            .map_err(|_| anyhow::anyhow!("preset store lock poisoned"))
    }
}

#[async_trait]
impl PresetStore for MemoryPresetStore {
    async fn list_presets(&self) -> anyhow::Result<PresetMap> {
        Ok(self.lock()?.clone())
    }

    async fn save_preset(&self, name: &str, patterns: &[String]) -> anyhow::Result<()> {
        self.lock()?.insert(name.to_string(), patterns.to_vec());
        Ok(())
    }

    async fn delete_preset(&self, name: &str) -> anyhow::Result<()> {
        self.lock()?.remove(name);
        Ok(())
    }
}

/// Cached view of the persisted presets plus the session-local active pointer.
///
/// Writes go to the store first; the cache only changes once the store has
/// confirmed, so what is shown never drifts from what is stored.
pub struct PresetRegistry {
    store: Arc<dyn PresetStore>,
    presets: PresetMap,
    active: Option<String>,
}

impl PresetRegistry {
    pub fn new(store: Arc<dyn PresetStore>) -> Self {
        Self {
            store,
            presets: PresetMap::new(),
            active: None,
        }
    }

    /// Reloads presets from the store.
    pub async fn list(&mut self) -> Result<&PresetMap, CoreError> {
        let presets = self
            .store
            .list_presets()
            .await
            .map_err(|source| CoreError::Persistence {
                operation: "load",
                source,
            })?;

        if let Some(active) = &self.active {
            if !presets.contains_key(active) {
                tracing::info!("Active preset `{}` no longer exists, clearing it", active);
                self.active = None;
            }
        }
        self.presets = presets;
        tracing::debug!("Loaded {} presets", self.presets.len());
        Ok(&self.presets)
    }

    /// The presets as of the last successful store round-trip.
    pub fn presets(&self) -> &PresetMap {
        &self.presets
    }

    /// Creates or overwrites the preset `name`.
    pub async fn create(&mut self, name: &str, patterns: Vec<String>) -> Result<(), CoreError> {
        let name = preset_name(name)?;

        self.store
            .save_preset(name, &patterns)
            .await
            .map_err(|source| CoreError::Persistence {
                operation: "save",
                source,
            })?;

        tracing::info!("Saved preset `{}` with {} patterns", name, patterns.len());
        self.presets.insert(name.to_string(), patterns);
        Ok(())
    }

    /// Deletes `name`, clearing the active pointer if it pointed there.
    pub async fn remove(&mut self, name: &str) -> Result<(), CoreError> {
        let name = preset_name(name)?;
        self.store
            .delete_preset(name)
            .await
            .map_err(|source| CoreError::Persistence {
                operation: "delete",
                source,
            })?;

        self.presets.remove(name);
        if self.active.as_deref() == Some(name) {
            self.active = None;
        }
        tracing::info!("Deleted preset `{}`", name);
        Ok(())
    }

    /// Sets the active preset.
    ///
    /// `None` clears it. Selecting the preset that is already active
    /// deactivates it. Returns the resulting active preset.
    pub fn select(&mut self, name: Option<&str>) -> Result<Option<&str>, CoreError> {
        match name.map(preset_name).transpose()? {
            None => self.active = None,
            Some(name) if self.active.as_deref() == Some(name) => self.active = None,
            Some(name) => {
                if !self.presets.contains_key(name) {
                    return Err(CoreError::PresetNotFound(name.to_string()));
                }
                self.active = Some(name.to_string());
            }
        }
        Ok(self.active.as_deref())
    }

    pub fn active(&self) -> Option<&str> {
        self.active.as_deref()
    }

    /// Patterns of the active preset, or nothing when none is active.
    pub fn active_patterns(&self) -> Vec<String> {
        self.active
            .as_ref()
            .and_then(|name| self.presets.get(name))
            .cloned()
            .unwrap_or_default()
    }
}

/// Presets are stored under their trimmed name.
fn preset_name(name: &str) -> Result<&str, CoreError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(CoreError::InvalidPresetName);
    }
    Ok(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A store whose writes always fail.
    struct BrokenStore;

    #[async_trait]
    impl PresetStore for BrokenStore {
        async fn list_presets(&self) -> anyhow::Result<PresetMap> {
            Err(anyhow::anyhow!("store offline"))
        }
        async fn save_preset(&self, _name: &str, _patterns: &[String]) -> anyhow::Result<()> {
            Err(anyhow::anyhow!("store offline"))
        }
        async fn delete_preset(&self, _name: &str) -> anyhow::Result<()> {
            Err(anyhow::anyhow!("store offline"))
        }
    }

    fn patterns(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn registry() -> PresetRegistry {
        PresetRegistry::new(Arc::new(MemoryPresetStore::default()))
    }

    #[tokio::test]
    async fn test_create_then_list_returns_the_preset() {
        let mut registry = registry();
        registry
            .create("Git", patterns(&[".git", ".gitignore"]))
            .await
            .unwrap();

        let listed = registry.list().await.unwrap();
        assert_eq!(listed.get("Git"), Some(&patterns(&[".git", ".gitignore"])));
    }

    #[tokio::test]
    async fn test_create_overwrites_existing_name() {
        let mut registry = registry();
        registry.create("JS", patterns(&["dist"])).await.unwrap();
        registry
            .create("JS", patterns(&["node_modules", "build"]))
            .await
            .unwrap();

        let listed = registry.list().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed["JS"], patterns(&["node_modules", "build"]));
    }

    #[tokio::test]
    async fn test_deleting_the_active_preset_clears_it() {
        let mut registry = registry();
        registry
            .create("Git", patterns(&[".git", ".gitignore"]))
            .await
            .unwrap();
        registry.select(Some("Git")).unwrap();
        assert_eq!(registry.active_patterns(), patterns(&[".git", ".gitignore"]));

        registry.remove("Git").await.unwrap();
        assert_eq!(registry.active(), None);
        assert!(registry.active_patterns().is_empty());
    }

    #[tokio::test]
    async fn test_deleting_another_preset_keeps_the_active_one() {
        let mut registry = registry();
        registry.create("A", patterns(&["a"])).await.unwrap();
        registry.create("B", patterns(&["b"])).await.unwrap();
        registry.select(Some("A")).unwrap();

        registry.remove("B").await.unwrap();
        assert_eq!(registry.active(), Some("A"));
    }

    #[tokio::test]
    async fn test_select_is_radio_and_toggles_off() {
        let mut registry = registry();
        registry.create("A", patterns(&["a"])).await.unwrap();
        registry.create("B", patterns(&["b"])).await.unwrap();

        assert_eq!(registry.select(Some("A")).unwrap(), Some("A"));
        assert_eq!(registry.select(Some("B")).unwrap(), Some("B"));
        assert_eq!(registry.active_patterns(), patterns(&["b"]));

        assert_eq!(registry.select(Some("B")).unwrap(), None);
        assert!(registry.active_patterns().is_empty());

        registry.select(Some("A")).unwrap();
        assert_eq!(registry.select(None).unwrap(), None);
    }

    #[tokio::test]
    async fn test_select_unknown_preset_fails() {
        let mut registry = registry();
        let err = registry.select(Some("Nope")).unwrap_err();
        assert!(matches!(err, CoreError::PresetNotFound(_)));
        assert_eq!(registry.active(), None);
    }

    #[tokio::test]
    async fn test_failed_save_leaves_state_unchanged() {
        let mut registry = PresetRegistry::new(Arc::new(BrokenStore));
        let err = registry
            .create("Git", patterns(&[".git"]))
            .await
            .unwrap_err();

        assert!(matches!(err, CoreError::Persistence { operation: "save", .. }));
        assert!(registry.presets().is_empty());
    }

    #[tokio::test]
    async fn test_failed_delete_keeps_preset_and_active_pointer() {
        let mut seeded = PresetMap::new();
        seeded.insert("Git".into(), patterns(&[".git"]));
        let mut registry = PresetRegistry::new(Arc::new(MemoryPresetStore::with_presets(seeded)));
        registry.list().await.unwrap();
        registry.select(Some("Git")).unwrap();

        registry.store = Arc::new(BrokenStore);
        let err = registry.remove("Git").await.unwrap_err();
        assert!(matches!(err, CoreError::Persistence { .. }));
        assert_eq!(registry.active(), Some("Git"));
        assert!(registry.presets().contains_key("Git"));
    }

    #[tokio::test]
    async fn test_blank_name_is_rejected() {
        let mut registry = registry();
        let err = registry.create("   ", patterns(&["x"])).await.unwrap_err();
        assert!(matches!(err, CoreError::InvalidPresetName));
    }

    #[tokio::test]
    async fn test_names_are_matched_the_way_they_were_saved() {
        let mut registry = registry();
        registry.create(" Git ", patterns(&[".git"])).await.unwrap();
        registry.create("Rust", patterns(&["target"])).await.unwrap();

        assert_eq!(registry.select(Some("  Git")).unwrap(), Some("Git"));
        assert_eq!(registry.select(Some("Git ")).unwrap(), None);

        registry.select(Some("Git")).unwrap();
        registry.remove(" Git ").await.unwrap();
        assert_eq!(registry.active(), None);
        assert!(!registry.list().await.unwrap().contains_key("Git"));
        assert!(registry.presets().contains_key("Rust"));
    }

    #[tokio::test]
    async fn test_blank_name_is_rejected_everywhere() {
        let mut registry = registry();
        registry.create("Git", patterns(&[".git"])).await.unwrap();
        registry.select(Some("Git")).unwrap();

        let err = registry.remove("  ").await.unwrap_err();
        assert!(matches!(err, CoreError::InvalidPresetName));
        let err = registry.select(Some("")).unwrap_err();
        assert!(matches!(err, CoreError::InvalidPresetName));
        assert_eq!(registry.active(), Some("Git"));
    }

    #[tokio::test]
    async fn test_reload_drops_vanished_active_preset() {
        let store = Arc::new(MemoryPresetStore::default());
        let mut registry = PresetRegistry::new(store.clone());
        registry.create("Tmp", patterns(&["*.tmp"])).await.unwrap();
        registry.select(Some("Tmp")).unwrap();

        store.delete_preset("Tmp").await.unwrap();
        registry.list().await.unwrap();
        assert_eq!(registry.active(), None);
    }
}
