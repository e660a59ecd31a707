//! Contains all the command handlers that are callable from the frontend via IPC.
//!
//! Each function in this module corresponds to a specific `IpcMessage::command`.
//! These handlers are responsible for interacting with the `AppState` and the `core`
//! logic, and for sending `UserEvent`s back to the UI.

use serde::Deserialize;
use std::path::PathBuf;
use std::sync::Arc;

use super::file_dialog::DialogService;
use super::helpers::{notify_error, notify_state, with_state_and_notify};
use super::proxy::EventProxy;
use super::state::SharedState;
use super::tasks;
use crate::core::{CoreError, PickOptions};

#[derive(Deserialize, Debug)]
pub struct OpenPathsPayload {
    pub paths: Vec<PathBuf>,
}

#[derive(Deserialize, Debug)]
pub struct TogglePayload {
    pub path: String,
}

#[derive(Deserialize, Debug)]
pub struct SavePresetPayload {
    pub name: String,
    #[serde(default)]
    pub patterns: Vec<String>,
}

#[derive(Deserialize, Debug)]
pub struct PresetNamePayload {
    #[serde(default)]
    pub name: Option<String>,
}

/// Parses a command payload, logging and returning `None` when it does not fit.
pub fn parse_payload<T: serde::de::DeserializeOwned>(
    command: &str,
    payload: serde_json::Value,
) -> Option<T> {
    match serde_json::from_value(payload) {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            tracing::warn!("Ignoring `{}` with invalid payload: {}", command, e);
            None
        }
    }
}

/// Loads the presets and sends the first complete state to the UI.
pub async fn initialize<P: EventProxy>(proxy: P, state: SharedState) {
    load_presets(proxy, state).await;
}

/// Opens a multi-file picker and builds a tree from the chosen files.
pub async fn pick_files<P: EventProxy, D: DialogService + ?Sized + 'static>(
    dialog: Arc<D>,
    proxy: P,
    state: SharedState,
) {
    let options = PickOptions {
        multiple: true,
        directory: false,
    };
    if let Some(paths) = pick(dialog, options, &state).await {
        tasks::load_local_selection(paths, proxy, state).await;
    }
}

/// Opens a folder picker and previews the chosen folders.
pub async fn pick_folder<P: EventProxy, D: DialogService + ?Sized + 'static>(
    dialog: Arc<D>,
    proxy: P,
    state: SharedState,
) {
    let options = PickOptions {
        multiple: true,
        directory: true,
    };
    if let Some(paths) = pick(dialog, options, &state).await {
        tasks::open_paths(paths, proxy, state).await;
    }
}

/// Shows the picker on a blocking thread, so the runtime keeps serving
/// other commands and events while the dialog is open.
async fn pick<D: DialogService + ?Sized + 'static>(
    dialog: Arc<D>,
    options: PickOptions,
    state: &SharedState,
) -> Option<Vec<PathBuf>> {
    let start_dir = state.lock().await.config.last_directory.clone();
    let picked =
        tokio::task::spawn_blocking(move || dialog.pick_paths(options, start_dir.as_deref()))
            .await;
    match picked {
        Ok(Some(paths)) if !paths.is_empty() => Some(paths),
        Err(e) => {
            tracing::error!("Picker task failed: {}", e);
            None
        }
        _ => {
            tracing::info!("User cancelled the picker.");
            None
        }
    }
}

/// Previews paths that were dropped onto the window or passed on the command line.
pub async fn open_paths<P: EventProxy>(
    payload: serde_json::Value,
    proxy: P,
    state: SharedState,
) {
    let Some(payload) = parse_payload::<OpenPathsPayload>("openPaths", payload) else {
        return;
    };
    if payload.paths.is_empty() {
        tracing::debug!("openPaths without paths, nothing to do.");
        return;
    }
    tasks::open_paths(payload.paths, proxy, state).await;
}

/// Flips the selection of one node. Unknown paths are ignored.
pub async fn toggle_path<P: EventProxy>(
    payload: serde_json::Value,
    proxy: P,
    state: SharedState,
) {
    let Some(payload) = parse_payload::<TogglePayload>("togglePath", payload) else {
        return;
    };
    let mut state_guard = state.lock().await;
    let toggled = state_guard.selection.toggle(&payload.path).map(|_| ());
    match toggled {
        Ok(_) => notify_state(&state_guard, &proxy),
        Err(CoreError::NodeNotFound(path)) => {
            tracing::debug!("Toggle for `{}` ignored, not in the current tree.", path);
        }
        Err(e) => notify_error(&proxy, &e),
    }
}

pub async fn select_all<P: EventProxy>(proxy: P, state: SharedState) {
    with_state_and_notify(&state, &proxy, |s| {
        s.selection.set_all(true);
    })
    .await;
}

pub async fn deselect_all<P: EventProxy>(proxy: P, state: SharedState) {
    with_state_and_notify(&state, &proxy, |s| {
        s.selection.set_all(false);
    })
    .await;
}

/// Discards the current tree, including any preview still being fetched.
pub async fn clear_selection<P: EventProxy>(proxy: P, state: SharedState) {
    with_state_and_notify(&state, &proxy, |s| {
        s.clear_selection();
        s.status_message = "Ready.".to_string();
    })
    .await;
}

/// Re-reads the presets from the store.
pub async fn load_presets<P: EventProxy>(proxy: P, state: SharedState) {
    let mut state_guard = state.lock().await;
    if let Err(e) = state_guard.presets.list().await {
        notify_error(&proxy, &e);
    }
    notify_state(&state_guard, &proxy);
}

/// Creates or overwrites a preset.
pub async fn save_preset<P: EventProxy>(
    payload: serde_json::Value,
    proxy: P,
    state: SharedState,
) {
    let Some(payload) = parse_payload::<SavePresetPayload>("savePreset", payload) else {
        return;
    };
    let mut state_guard = state.lock().await;
    match state_guard
        .presets
        .create(&payload.name, payload.patterns)
        .await
    {
        Ok(()) => state_guard.status_message = format!("Saved preset `{}`.", payload.name.trim()),
        Err(e) => notify_error(&proxy, &e),
    }
    notify_state(&state_guard, &proxy);
}

pub async fn delete_preset<P: EventProxy>(
    payload: serde_json::Value,
    proxy: P,
    state: SharedState,
) {
    let Some(PresetNamePayload { name: Some(name) }) =
        parse_payload::<PresetNamePayload>("deletePreset", payload)
    else {
        return;
    };
    let mut state_guard = state.lock().await;
    match state_guard.presets.remove(&name).await {
        Ok(()) => state_guard.status_message = format!("Deleted preset `{}`.", name.trim()),
        Err(e) => notify_error(&proxy, &e),
    }
    notify_state(&state_guard, &proxy);
}

/// Activates a preset, or deactivates it when it is already active.
/// A `null` name clears the active preset.
pub async fn select_preset<P: EventProxy>(
    payload: serde_json::Value,
    proxy: P,
    state: SharedState,
) {
    let Some(payload) = parse_payload::<PresetNamePayload>("selectPreset", payload) else {
        return;
    };
    with_state_and_notify(&state, &proxy, |s| {
        if let Err(e) = s.presets.select(payload.name.as_deref()) {
            notify_error(&proxy, &e);
        }
    })
    .await;
}

pub async fn submit<P: EventProxy>(proxy: P, state: SharedState) {
    tasks::submit_selection(proxy, state).await;
}
