//! Configuration paths
//!
//! Uses the directories crate for platform-appropriate locations:
//! - Linux: `~/.config/ui-harness/`
//! - macOS: `~/Library/Application Support/ui-harness/`
//! - Windows: `%APPDATA%\ui-harness\`

use std::path::PathBuf;

/// Application name used for config and data directories
const APP_NAME: &str = "ui-harness";

/// Environment variable that points at an explicit config file
pub const CONFIG_ENV: &str = "UI_HARNESS_CONFIG";

/// Get the configuration directory path
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", APP_NAME).map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the configuration file
///
/// `UI_HARNESS_CONFIG` wins over the platform location when set.
pub fn config_path() -> Option<PathBuf> {
    if let Some(explicit) = std::env::var_os(CONFIG_ENV) {
        if !explicit.is_empty() {
            return Some(PathBuf::from(explicit));
        }
    }
    config_dir().map(|dir| dir.join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_dir_is_valid() {
        let dir = config_dir();
        assert!(dir.is_some());
    }

    #[test]
    fn test_config_path_ends_with_toml() {
        if std::env::var_os(CONFIG_ENV).is_none() {
            let path = config_path().unwrap();
            assert_eq!(path.file_name().unwrap(), "config.toml");
        }
    }
}
