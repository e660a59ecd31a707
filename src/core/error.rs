//! Defines the custom error type for the `core` module.

use serde::Serialize;
use thiserror::Error;

/// The primary error type for the `core` module.
///
/// Every failure the selection tree, the preset registry and the submission
/// coordinator can produce is one variant here, so callers can tell the
/// outcomes apart and react to each one differently.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A raw path entry was empty or escaped the common selection root.
    #[error("Invalid path `{path}`: {reason}")]
    InvalidPath { path: String, reason: String },

    /// A tree handed over by the preview source violates the node contract.
    #[error("Malformed tree at `{path}`: {reason}")]
    MalformedTree { path: String, reason: String },

    /// A toggle addressed a path that is not part of the current tree.
    #[error("No node with path `{0}` in the current tree")]
    NodeNotFound(String),

    /// The preset store rejected a read or write.
    #[error("Failed to {operation} presets: {source}")]
    Persistence {
        operation: &'static str,
        #[source]
        source: anyhow::Error,
    },

    /// A preset was selected that the registry does not know about.
    #[error("Unknown preset `{0}`")]
    PresetNotFound(String),

    /// A preset name was blank.
    #[error("Preset names must not be empty")]
    InvalidPresetName,

    /// A submission was attempted without a single selected file.
    #[error("Nothing is selected")]
    EmptySelection,

    /// A submission is already outstanding.
    #[error("A submission is already in progress")]
    SubmissionInProgress,

    /// The parsing engine reported a failure.
    #[error("Submission failed: {source}")]
    Submission {
        #[source]
        source: anyhow::Error,
    },
}

/// A serializable, payload-free tag for a [`CoreError`], sent to the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorKind {
    InvalidPath,
    MalformedTree,
    NodeNotFound,
    Persistence,
    PresetNotFound,
    InvalidPresetName,
    EmptySelection,
    SubmissionInProgress,
    Submission,
}

impl CoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::InvalidPath { .. } => ErrorKind::InvalidPath,
            CoreError::MalformedTree { .. } => ErrorKind::MalformedTree,
            CoreError::NodeNotFound(_) => ErrorKind::NodeNotFound,
            CoreError::Persistence { .. } => ErrorKind::Persistence,
            CoreError::PresetNotFound(_) => ErrorKind::PresetNotFound,
            CoreError::InvalidPresetName => ErrorKind::InvalidPresetName,
            CoreError::EmptySelection => ErrorKind::EmptySelection,
            CoreError::SubmissionInProgress => ErrorKind::SubmissionInProgress,
            CoreError::Submission { .. } => ErrorKind::Submission,
        }
    }

    /// Whether the error signals a collaborator breaking its contract rather
    /// than a user-facing condition.
    pub fn is_contract_violation(&self) -> bool {
        matches!(
            self,
            CoreError::InvalidPath { .. } | CoreError::MalformedTree { .. }
        )
    }

    pub(crate) fn invalid_path(path: impl Into<String>, reason: impl Into<String>) -> Self {
        CoreError::InvalidPath {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn malformed(path: impl Into<String>, reason: impl Into<String>) -> Self {
        CoreError::MalformedTree {
            path: path.into(),
            reason: reason.into(),
        }
    }
}
