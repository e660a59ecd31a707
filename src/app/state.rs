//! Defines the central, mutable state of the application.

use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::config::presets::{default_presets, JsonPresetStore};
use crate::config::{self, AppConfig};
use crate::core::{
    CommandParseEngine, FsPreviewSource, MemoryPresetStore, ParseEngine, PresetRegistry,
    PresetStore, PreviewSource, SelectionEngine, SubmissionCoordinator,
};

/// The state shared between the IPC handlers and the tasks they spawn.
///
/// An async mutex, because preset operations hold the lock across store I/O.
pub type SharedState = Arc<Mutex<AppState>>;

/// Holds the complete, mutable state of the application.
pub struct AppState {
    /// The application's configuration settings.
    pub config: AppConfig,
    /// Where the config is persisted. `None` uses the platform directory.
    pub config_dir: Option<PathBuf>,
    /// The tree of the current session and its selection.
    pub selection: SelectionEngine,
    pub presets: PresetRegistry,
    /// Shared with submission tasks, which run without holding the state lock.
    pub coordinator: Arc<SubmissionCoordinator>,
    pub preview_source: Arc<dyn PreviewSource>,
    /// `true` while a preview tree is being fetched.
    pub is_loading: bool,
    pub status_message: String,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        preset_store: Arc<dyn PresetStore>,
        engine: Arc<dyn ParseEngine>,
        preview_source: Arc<dyn PreviewSource>,
    ) -> Self {
        Self {
            config,
            config_dir: None,
            selection: SelectionEngine::default(),
            presets: PresetRegistry::new(preset_store),
            coordinator: Arc::new(SubmissionCoordinator::new(engine)),
            preview_source,
            is_loading: false,
            status_message: "Ready.".to_string(),
        }
    }

    /// Wires up the production collaborators described by `config`.
    ///
    /// Without a usable presets location the built-in presets are kept in
    /// memory for this session.
    pub fn from_config(config: AppConfig) -> Self {
        let store: Arc<dyn PresetStore> = match JsonPresetStore::from_config(&config) {
            Ok(store) => Arc::new(store),
            Err(e) => {
                tracing::warn!("Presets will not be persisted: {}", e);
                Arc::new(MemoryPresetStore::with_presets(default_presets()))
            }
        };
        let engine = CommandParseEngine::from_config(&config);
        Self::new(config, store, Arc::new(engine), Arc::new(FsPreviewSource))
    }

    pub fn into_shared(self) -> SharedState {
        Arc::new(Mutex::new(self))
    }

    /// Snapshots the config so it can be written after the lock is released.
    pub fn pending_config_write(&self) -> PendingConfigWrite {
        PendingConfigWrite {
            config: self.config.clone(),
            config_dir: self.config_dir.clone(),
        }
    }

    /// Drops the current tree and any pending preview. Returns the ticket a
    /// new preview fetch has to present to install its tree.
    pub fn clear_selection(&mut self) -> u64 {
        self.is_loading = false;
        self.selection.clear()
    }
}

/// A config snapshot waiting to be written to disk.
pub struct PendingConfigWrite {
    config: AppConfig,
    config_dir: Option<PathBuf>,
}

impl PendingConfigWrite {
    /// Writes the snapshot on a blocking thread. Failures are logged, never fatal.
    pub async fn save(self) {
        let Self { config, config_dir } = self;
        let result = tokio::task::spawn_blocking(move || {
            config::settings::save_config(&config, config_dir.as_deref())
        })
        .await;
        match result {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::warn!("Failed to save config: {}", e),
            Err(e) => tracing::error!("Config writer task failed: {}", e),
        }
    }
}
