// ABOUTME: XDG Base Directory paths for openab configuration
// ABOUTME: Falls back to the current directory when no home directory can be determined

use directories::ProjectDirs;
use std::path::PathBuf;

/// Application identifier for XDG directories
const QUALIFIER: &str = "com";
const ORGANIZATION: &str = "openab";
const APPLICATION: &str = "openab";

pub fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from(QUALIFIER, ORGANIZATION, APPLICATION)
}

/// Get the config directory path (e.g., ~/.config/openab/)
pub fn config_dir() -> PathBuf {
    project_dirs()
        .map(|p| p.config_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Get the default config file path
/// e.g., ~/.config/openab/config.toml
pub fn config_file() -> PathBuf {
    config_dir().join("config.toml")
}
