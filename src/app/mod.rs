//! The command layer between the frontend and the selection core.

pub mod commands;
pub mod events;
pub mod file_dialog;
pub mod helpers;
pub mod proxy;
pub mod state;
pub mod tasks;
pub mod view_model;

use std::sync::Arc;
use tokio::task::JoinHandle;

use events::IpcMessage;
use file_dialog::DialogService;
use proxy::EventProxy;
use state::SharedState;

/// Parses one IPC message and runs the matching command on its own task.
///
/// Returns `None` when the message is not valid JSON or names an unknown
/// command.
pub fn handle_ipc_message<P, D>(
    message: &str,
    dialog: Arc<D>,
    proxy: P,
    state: SharedState,
) -> Option<JoinHandle<()>>
where
    P: EventProxy,
    D: DialogService + ?Sized + 'static,
{
    let msg: IpcMessage = match serde_json::from_str(message) {
        Ok(msg) => msg,
        Err(e) => {
            tracing::warn!("Failed to parse IPC message: {}", e);
            return None;
        }
    };
    tracing::debug!("IPC command `{}`", msg.command);

    let payload = msg.payload;
    let handle = match msg.command.as_str() {
        "initialize" => tokio::spawn(commands::initialize(proxy, state)),
        "pickFiles" => tokio::spawn(commands::pick_files(dialog, proxy, state)),
        "pickFolder" => tokio::spawn(commands::pick_folder(dialog, proxy, state)),
        "openPaths" => tokio::spawn(commands::open_paths(payload, proxy, state)),
        "togglePath" => tokio::spawn(commands::toggle_path(payload, proxy, state)),
        "selectAll" => tokio::spawn(commands::select_all(proxy, state)),
        "deselectAll" => tokio::spawn(commands::deselect_all(proxy, state)),
        "clearSelection" => tokio::spawn(commands::clear_selection(proxy, state)),
        "loadPresets" => tokio::spawn(commands::load_presets(proxy, state)),
        "savePreset" => tokio::spawn(commands::save_preset(payload, proxy, state)),
        "deletePreset" => tokio::spawn(commands::delete_preset(payload, proxy, state)),
        "selectPreset" => tokio::spawn(commands::select_preset(payload, proxy, state)),
        "submit" => tokio::spawn(commands::submit(proxy, state)),
        other => {
            tracing::warn!("Unknown IPC command: {}", other);
            return None;
        }
    };
    Some(handle)
}
