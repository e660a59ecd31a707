//! An abstraction layer for native file dialogs to enable testing.

use std::path::{Path, PathBuf};

use crate::core::PickOptions;

/// Defines a common interface for file and folder selection dialogs.
/// This allows for a mock implementation during tests, avoiding the need
/// to interact with actual OS dialog windows.
pub trait DialogService: Send + Sync {
    /// Opens a picker described by `options`. `None` means the user cancelled.
    fn pick_paths(&self, options: PickOptions, start_dir: Option<&Path>) -> Option<Vec<PathBuf>>;
}

/// The production implementation that uses the `rfd` crate to show native OS dialogs.
pub struct NativeDialogService;

impl DialogService for NativeDialogService {
    fn pick_paths(&self, options: PickOptions, start_dir: Option<&Path>) -> Option<Vec<PathBuf>> {
        let mut dialog = rfd::FileDialog::new();
        if let Some(dir) = start_dir.map(Path::to_path_buf).or_else(dirs::home_dir) {
            dialog = dialog.set_directory(dir);
        }

        match (options.directory, options.multiple) {
            (true, true) => dialog.pick_folders(),
            (true, false) => dialog.pick_folder().map(|path| vec![path]),
            (false, true) => dialog.pick_files(),
            (false, false) => dialog.pick_file().map(|path| vec![path]),
        }
    }
}
