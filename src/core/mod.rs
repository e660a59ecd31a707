pub mod engine;
pub mod error;
pub mod pathset;
pub mod preset;
pub mod scanner;
pub mod selection;
pub mod submission;
pub mod tree;
pub mod tree_generator;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub use engine::CommandParseEngine;
pub use error::{CoreError, ErrorKind};
pub use pathset::{normalize, PathSet};
pub use preset::{MemoryPresetStore, PresetMap, PresetRegistry, PresetStore};
pub use scanner::FsPreviewSource;
pub use selection::SelectionEngine;
pub use submission::{ParseEngine, ParseRequest, SubmissionCoordinator};
pub use tree::{
    adopt, adopt_json, adopt_with, build, AdoptOptions, AdoptPolicy, Node, NodeKind,
    SelectionState, SelectionTree, SerializedNode, ROOT_PATH,
};
pub use tree_generator::TreeGenerator;

/// What the native picker should let the user choose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PickOptions {
    pub multiple: bool,
    pub directory: bool,
}

/// Materializes a tree for arbitrary opened or dropped paths.
///
/// File nodes come back with `selected` unset; the caller decides the
/// initial selection when adopting.
#[async_trait]
pub trait PreviewSource: Send + Sync {
    async fn fetch_preview_tree(&self, paths: &[PathBuf]) -> anyhow::Result<Vec<SerializedNode>>;
}
