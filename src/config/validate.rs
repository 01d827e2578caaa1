//! Configuration validation.

use crate::config::{Config, ModelConfig};
use crate::error::{Error, Result};

/// Validate the entire configuration.
pub fn validate_config(config: &Config) -> Result<()> {
    validate_preprocess(config)?;
    validate_server(config)?;
    Ok(())
}

/// Validate image preprocessing settings.
fn validate_preprocess(config: &Config) -> Result<()> {
    let preprocess = &config.preprocess;

    for (name, value) in [("width", preprocess.width), ("height", preprocess.height)] {
        if value == Some(0) {
            return Err(Error::ConfigValidation {
                message: format!("preprocess.{name} must be at least 1"),
            });
        }
    }

    if let Some(std) = preprocess.std.iter().find(|s| !(s.is_finite() && **s > 0.0)) {
        return Err(Error::ConfigValidation {
            message: format!("preprocess.std entries must be positive, got {std}"),
        });
    }

    if preprocess.mean.iter().any(|m| !m.is_finite()) {
        return Err(Error::ConfigValidation {
            message: "preprocess.mean entries must be finite".to_string(),
        });
    }

    if config.inference.threads == Some(0) {
        return Err(Error::ConfigValidation {
            message: "inference.threads must be at least 1".to_string(),
        });
    }

    Ok(())
}

/// Validate web interface settings.
fn validate_server(config: &Config) -> Result<()> {
    let server = &config.server;

    if server.host.trim().is_empty() {
        return Err(Error::ConfigValidation {
            message: "server.host must not be empty".to_string(),
        });
    }

    if server.max_upload_bytes == 0 {
        return Err(Error::ConfigValidation {
            message: "server.max_upload_bytes must be at least 1".to_string(),
        });
    }

    Ok(())
}

/// Check that the model artifact files exist.
pub fn validate_model_config(model: &ModelConfig) -> Result<()> {
    if !model.path.exists() {
        return Err(Error::ModelFileNotFound {
            path: model.path.clone(),
        });
    }

    if !model.labels.exists() {
        return Err(Error::LabelsFileNotFound {
            path: model.labels.clone(),
        });
    }

    Ok(())
}
