pub mod presets;
pub mod settings;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::core::{AdoptOptions, AdoptPolicy};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// Overrides the location of `presets.json`.
    pub presets_file: Option<PathBuf>,
    /// Write the built-in presets when no presets file exists yet.
    pub seed_default_presets: bool,
    /// Initial selection for trees materialized from opened or dropped paths.
    pub open_policy: AdoptPolicy,
    pub remove_empty_directories: bool,
    /// The parsing engine executable.
    pub engine_program: String,
    /// Arguments passed to the engine before the ignore patterns and paths.
    pub engine_args: Vec<String>,
    pub last_directory: Option<PathBuf>,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        settings::load_config(None)
    }

    pub fn adopt_options(&self) -> AdoptOptions {
        AdoptOptions {
            policy: self.open_policy,
            remove_empty_directories: self.remove_empty_directories,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            presets_file: None,
            seed_default_presets: true,
            open_policy: AdoptPolicy::SelectAll,
            remove_empty_directories: false,
            engine_program: "parser-ai-engine".to_string(),
            engine_args: vec!["parse".to_string()],
            last_directory: None,
        }
    }
}
