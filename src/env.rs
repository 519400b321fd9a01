//! Path and file-name constants for the assistant.
//!
//! Centralizes the hardcoded directory and file names so the settings
//! discovery hierarchy stays consistent across the CLI and the tests.

use std::path::{Path, PathBuf};

/// Main application directory name (hidden directory like .git, .vscode)
pub const DCA_DIR_NAME: &str = ".dca";

/// Settings file name. JSON, same shape the web editor keeps in local
/// storage, so the two stores are interchangeable.
pub const SETTINGS_FILE_NAME: &str = "settings.json";

/// Build the local settings file path from a working directory.
pub fn local_settings_file_path(dir: &Path) -> PathBuf {
    dir.join(DCA_DIR_NAME).join(SETTINGS_FILE_NAME)
}

/// Build the user settings directory path from a home directory.
pub fn user_settings_dir_path(home: &Path) -> PathBuf {
    home.join(DCA_DIR_NAME)
}

/// Build the user settings file path from a home directory.
pub fn user_settings_file_path(home: &Path) -> PathBuf {
    user_settings_dir_path(home).join(SETTINGS_FILE_NAME)
}
