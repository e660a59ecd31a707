use anyhow::Result;
use directories::ProjectDirs;
use std::fs;
use std::path::{Path, PathBuf};

use super::AppConfig;

const APP_NAME: &str = "ParserAI";
const CONFIG_FILE: &str = "config.json";

/// Returns the platform-specific configuration directory for the application.
pub fn get_config_directory() -> Option<PathBuf> {
    ProjectDirs::from("com", "parserai", APP_NAME)
        .map(|proj_dirs| proj_dirs.config_dir().to_path_buf())
}

fn resolve_config_directory(override_dir: Option<&Path>) -> Result<PathBuf> {
    match override_dir {
        Some(dir) => Ok(dir.to_path_buf()),
        None => get_config_directory()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory")),
    }
}

/// Loads the application configuration from the config file.
///
/// A missing file is created with the defaults. A file that cannot be parsed
/// is logged and replaced by the defaults in memory, so a bad edit never keeps
/// the application from starting.
pub fn load_config(config_dir: Option<&Path>) -> Result<AppConfig> {
    let config_path = resolve_config_directory(config_dir)?.join(CONFIG_FILE);

    if !config_path.exists() {
        tracing::info!(
            "Config file not found, creating default config at {:?}",
            config_path
        );
        let default_config = AppConfig::default();
        save_config(&default_config, config_dir)?;
        return Ok(default_config);
    }

    let config_content = fs::read_to_string(&config_path)?;

    match serde_json::from_str::<AppConfig>(&config_content) {
        Ok(config) => {
            tracing::info!("Loaded config from {:?}", config_path);
            Ok(config)
        }
        Err(e) => {
            tracing::warn!(
                "Failed to parse config file at {:?}: {}. Falling back to default config.",
                config_path,
                e
            );
            Ok(AppConfig::default())
        }
    }
}

/// Saves the provided configuration to the config file.
pub fn save_config(config: &AppConfig, config_dir: Option<&Path>) -> Result<()> {
    let config_dir = resolve_config_directory(config_dir)?;

    if !config_dir.exists() {
        fs::create_dir_all(&config_dir)?;
        tracing::info!("Created config directory: {:?}", config_dir);
    }

    let config_path = config_dir.join(CONFIG_FILE);
    let config_json = serde_json::to_string_pretty(config)?;

    fs::write(&config_path, config_json)?;
    tracing::info!("Saved config to {:?}", config_path);

    Ok(())
}

// Platform-specific configuration paths for reference:
// macOS:   ~/Library/Application Support/com.parserai.ParserAI/
// Linux:   ~/.config/parserai/
// Windows: %APPDATA%/parserai/ParserAI/config/

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::AdoptPolicy;
    use tempfile::tempdir;

    #[test]
    fn test_load_creates_default_config_when_missing() {
        let dir = tempdir().unwrap();
        let config = load_config(Some(dir.path())).unwrap();
        assert_eq!(config, AppConfig::default());
        assert!(dir.path().join(CONFIG_FILE).exists());
    }

    #[test]
    fn test_save_then_load_round_trips() {
        let dir = tempdir().unwrap();
        let config = AppConfig {
            open_policy: AdoptPolicy::SelectNone,
            engine_program: "/usr/local/bin/engine".to_string(),
            ..Default::default()
        };
        save_config(&config, Some(dir.path())).unwrap();
        assert_eq!(load_config(Some(dir.path())).unwrap(), config);
    }

    #[test]
    fn test_partial_config_fills_missing_fields() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join(CONFIG_FILE),
            r#"{"remove_empty_directories": true}"#,
        )
        .unwrap();

        let config = load_config(Some(dir.path())).unwrap();
        assert!(config.remove_empty_directories);
        assert_eq!(config.engine_program, AppConfig::default().engine_program);
    }

    #[test]
    fn test_corrupt_config_falls_back_to_defaults() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(CONFIG_FILE), "{ not json").unwrap();
        assert_eq!(load_config(Some(dir.path())).unwrap(), AppConfig::default());
    }
}
