//! Responsible for transforming the `AppState` into a `UiState` view model.

use serde::Serialize;

use super::state::AppState;
use crate::core::{Node, PresetMap};

/// A serializable representation of the application state for the UI.
#[derive(Serialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct UiState {
    /// The full tree, selection states included. `None` when nothing is open.
    pub tree: Option<Node>,
    /// The directory the tree's relative paths hang off, if any.
    pub base_path: Option<String>,
    pub generation: u64,
    pub total_files: usize,
    pub selected_files_count: usize,
    pub presets: PresetMap,
    pub active_preset: Option<String>,
    pub active_ignore_patterns: Vec<String>,
    pub is_loading: bool,
    pub is_submitting: bool,
    pub status_message: String,
}

/// Creates the complete `UiState` from the current `AppState`.
pub fn generate_ui_state(state: &AppState) -> UiState {
    let tree = state.selection.tree();
    UiState {
        tree: (!tree.is_empty()).then(|| tree.root.clone()),
        base_path: tree.base.clone(),
        generation: state.selection.generation(),
        total_files: tree.root.leaf_count(),
        selected_files_count: state.selection.selected_count(),
        presets: state.presets.presets().clone(),
        active_preset: state.presets.active().map(str::to_string),
        active_ignore_patterns: state.presets.active_patterns(),
        is_loading: state.is_loading,
        is_submitting: state.coordinator.is_in_flight(),
        status_message: state.status_message.clone(),
    }
}
