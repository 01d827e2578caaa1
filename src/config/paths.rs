//! Where birdlens looks for `config.toml`.

use crate::constants::APP_NAME;
use crate::error::{Error, Result};
use directories::ProjectDirs;
use std::path::PathBuf;

const CONFIG_FILE_NAME: &str = "config.toml";

/// Default config file, used when neither `--config` nor `BIRDLENS_CONFIG` is set.
///
/// - Linux: `~/.config/birdlens/config.toml`
/// - macOS: `~/Library/Application Support/birdlens/config.toml`
/// - Windows: `%APPDATA%\birdlens\config\config.toml`
pub fn config_file_path() -> Result<PathBuf> {
    let dirs = ProjectDirs::from("", "", APP_NAME).ok_or(Error::ConfigDirNotFound)?;
    Ok(dirs.config_dir().join(CONFIG_FILE_NAME))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_config_file_path_ends_with_toml() {
        // Headless CI without a home directory has no config dir.
        if let Ok(path) = config_file_path() {
            assert!(path.to_string_lossy().ends_with("config.toml"));
            assert!(path.to_string_lossy().contains("birdlens"));
        }
    }
}
