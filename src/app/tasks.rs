//! The asynchronous work behind opening paths and submitting a selection.
//!
//! None of these hold the state lock while waiting on a collaborator, so the
//! UI keeps responding to toggles and preset changes in the meantime.

use std::path::{Path, PathBuf};

use super::events::UserEvent;
use super::helpers::{notify_error, notify_state};
use super::proxy::EventProxy;
use super::state::{AppState, PendingConfigWrite, SharedState};
use crate::core::{adopt_with, build, normalize, ParseRequest, SelectionTree, TreeGenerator};

/// Builds a fresh tree from paths the user picked one by one.
///
/// Every picked file starts selected. An entry that cannot be normalized
/// leaves the session without a tree.
pub async fn load_local_selection<P: EventProxy>(
    paths: Vec<PathBuf>,
    proxy: P,
    state: SharedState,
) {
    let entries: Vec<String> = paths
        .iter()
        .map(|path| path.to_string_lossy().to_string())
        .collect();
    let directory = picker_directory(&paths).await;

    let mut state_guard = state.lock().await;
    let config_write = remember_directory(&mut state_guard, directory);

    match normalize(&entries) {
        Ok(set) => {
            let tree = build(&set);
            state_guard.clear_selection();
            state_guard.selection.reset(tree);
            state_guard.status_message =
                format!("{} files selected.", state_guard.selection.selected_count());
            tracing::info!("Loaded local selection of {} files", set.len());
        }
        Err(e) => {
            state_guard.clear_selection();
            state_guard.status_message = "Could not load the picked files.".to_string();
            notify_error(&proxy, &e);
        }
    }
    notify_state(&state_guard, &proxy);
    drop(state_guard);

    if let Some(config_write) = config_write {
        config_write.save().await;
    }
}

/// Replaces the tree with a preview of `paths` fetched from the preview source.
///
/// The current tree is dropped right away. If another open or a clear
/// happens while the fetch is running, its result is discarded.
pub async fn open_paths<P: EventProxy>(paths: Vec<PathBuf>, proxy: P, state: SharedState) {
    let directory = picker_directory(&paths).await;
    let (ticket, source, options, config_write) = {
        let mut state_guard = state.lock().await;
        let ticket = state_guard.clear_selection();
        state_guard.is_loading = true;
        state_guard.status_message = format!("Loading {} paths...", paths.len());
        let config_write = remember_directory(&mut state_guard, directory);
        notify_state(&state_guard, &proxy);
        (
            ticket,
            state_guard.preview_source.clone(),
            state_guard.config.adopt_options(),
            config_write,
        )
    };
    if let Some(config_write) = config_write {
        config_write.save().await;
    }

    tracing::info!("Fetching preview tree for {} paths", paths.len());
    let adopted = match source.fetch_preview_tree(&paths).await {
        Ok(nodes) => adopt_with(nodes, options),
        Err(e) => {
            tracing::warn!("Preview fetch failed, continuing with an empty tree: {:#}", e);
            Ok(SelectionTree::empty())
        }
    };

    let mut state_guard = state.lock().await;
    let tree = match adopted {
        Ok(tree) => tree,
        Err(e) => {
            if state_guard.selection.generation() != ticket {
                tracing::warn!("Ignoring malformed preview for superseded generation {}", ticket);
                return;
            }
            state_guard.is_loading = false;
            state_guard.status_message = "The preview could not be read.".to_string();
            notify_error(&proxy, &e);
            notify_state(&state_guard, &proxy);
            return;
        }
    };

    let files = tree.root.leaf_count();
    tracing::debug!("Preview tree:\n{}", TreeGenerator::generate_tree(&tree));
    if state_guard.selection.reset_if_current(ticket, tree).is_none() {
        return;
    }
    state_guard.is_loading = false;
    state_guard.status_message = format!("Opened {} files.", files);
    notify_state(&state_guard, &proxy);
}

/// Submits the selected files with the active preset's ignore patterns.
///
/// The tree is discarded once the engine accepts it, unless it was replaced
/// in the meantime. On failure it stays so the user can retry.
pub async fn submit_selection<P: EventProxy>(proxy: P, state: SharedState) {
    let (request, coordinator, ticket) = {
        let state_guard = state.lock().await;
        (
            ParseRequest::from_selection(&state_guard.selection, &state_guard.presets),
            state_guard.coordinator.clone(),
            state_guard.selection.generation(),
        )
    };
    let files = request.paths.len();

    let result = coordinator.submit(request).await;

    let mut state_guard = state.lock().await;
    match result {
        Ok(()) => {
            state_guard
                .selection
                .reset_if_current(ticket, SelectionTree::empty());
            state_guard.status_message = format!("Submitted {} files for parsing.", files);
            proxy.send_event(UserEvent::SubmissionComplete { files });
        }
        Err(e) => {
            state_guard.status_message = e.to_string();
            notify_error(&proxy, &e);
        }
    }
    notify_state(&state_guard, &proxy);
}

/// The directory the next picker should start in: the first opened path if
/// it is a directory, otherwise its parent.
async fn picker_directory(paths: &[PathBuf]) -> Option<PathBuf> {
    let first = paths.first()?;
    let is_dir = tokio::fs::metadata(first)
        .await
        .map(|metadata| metadata.is_dir())
        .unwrap_or(false);
    if is_dir {
        return Some(first.clone());
    }
    first
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .map(Path::to_path_buf)
}

/// Stores `directory` as the next picker start. Returns the config to write
/// once the state lock is released, or `None` when nothing changed.
fn remember_directory(
    state: &mut AppState,
    directory: Option<PathBuf>,
) -> Option<PendingConfigWrite> {
    let directory = directory?;
    if state.config.last_directory.as_ref() == Some(&directory) {
        return None;
    }
    state.config.last_directory = Some(directory);
    Some(state.pending_config_write())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_picker_directory_prefers_the_opened_directory() {
        let temp_dir = tempdir().unwrap();
        let file = temp_dir.path().join("notes.md");
        std::fs::write(&file, "notes").unwrap();

        let dir = temp_dir.path().to_path_buf();
        assert_eq!(picker_directory(&[dir.clone()]).await, Some(dir.clone()));
        assert_eq!(picker_directory(&[file]).await, Some(dir.clone()));
        assert_eq!(
            picker_directory(&[dir.join("gone/a.rs")]).await,
            Some(dir.join("gone"))
        );
        assert_eq!(picker_directory(&[PathBuf::from("a.rs")]).await, None);
        assert_eq!(picker_directory(&[]).await, None);
    }
}
