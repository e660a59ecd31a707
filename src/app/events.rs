//! Defines the event and message structures for communication between the
//! backend and the frontend.

use serde::{Deserialize, Serialize};

use super::view_model::UiState;
use crate::core::ErrorKind;

/// Events sent from the backend to the frontend.
#[derive(Debug, Serialize)]
#[serde(tag = "event", content = "payload", rename_all = "camelCase")]
pub enum UserEvent {
    /// A complete state update to re-render the UI.
    StateUpdate(Box<UiState>),
    /// An error the user has to act on. `kind` tells the frontend which action
    /// to offer.
    ShowError { kind: ErrorKind, message: String },
    /// The parsing engine accepted the submitted selection.
    SubmissionComplete { files: usize },
}

/// A message received from the frontend.
#[derive(Deserialize, Debug)]
pub struct IpcMessage {
    /// The name of the command to execute.
    pub command: String,
    /// The payload associated with the command, as a JSON value.
    #[serde(default)]
    pub payload: serde_json::Value,
}
