//! Reading and writing `config.toml`.
//!
//! Every section (`[model]`, `[preprocess]`, `[inference]`, `[server]`) and
//! every key is optional. Anything left out keeps its built-in default.

use crate::config::{Config, config_file_path};
use crate::error::{Error, Result};
use std::io::ErrorKind;
use std::path::Path;
use tracing::debug;

/// Load configuration from a TOML file.
///
/// A missing file yields the defaults, which serve `bird_model.onnx` and
/// `labels.txt` from the working directory.
pub fn load_config_file(path: &Path) -> Result<Config> {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!("No config file at {}, using defaults", path.display());
            return Ok(Config::default());
        }
        Err(source) => {
            return Err(Error::ConfigRead {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    toml::from_str(&contents).map_err(|source| Error::ConfigParse {
        path: path.to_path_buf(),
        source,
    })
}

/// Load `config.toml` from the platform config directory.
///
/// Without a home directory there is nothing to load and the defaults apply.
pub fn load_default_config() -> Result<Config> {
    match config_file_path() {
        Ok(path) => load_config_file(&path),
        Err(e) => {
            debug!("{e}, using defaults");
            Ok(Config::default())
        }
    }
}

/// Write `config` as TOML, creating parent directories. Backs `config init`.
pub fn save_config(config: &Config, path: &Path) -> Result<()> {
    let write_error = |source| Error::ConfigWrite {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(write_error)?;
    }

    let contents =
        toml::to_string_pretty(config).map_err(|source| Error::ConfigSerialize { source })?;
    std::fs::write(path, contents).map_err(write_error)
}
