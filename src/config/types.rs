//! Configuration type definitions.

use crate::constants::{
    DEFAULT_EXAMPLES_DIR, DEFAULT_LABELS_PATH, DEFAULT_MODEL_PATH,
    preprocess::{IMAGENET_MEAN, IMAGENET_STD},
    server::{
        DEFAULT_DESCRIPTION, DEFAULT_HOST, DEFAULT_MAX_UPLOAD_BYTES, DEFAULT_PORT, DEFAULT_TITLE,
    },
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Complete application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Model artifact settings.
    pub model: ModelConfig,

    /// Image preprocessing settings.
    pub preprocess: PreprocessConfig,

    /// Inference settings.
    pub inference: InferenceConfig,

    /// Web interface settings.
    pub server: ServerConfig,
}

/// Model artifact location and output handling.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Path to the ONNX model file.
    pub path: PathBuf,

    /// Path to the labels file (one label per line, in class index order).
    pub labels: PathBuf,

    /// How raw model output is turned into probabilities.
    pub activation: OutputActivation,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_MODEL_PATH),
            labels: PathBuf::from(DEFAULT_LABELS_PATH),
            activation: OutputActivation::default(),
        }
    }
}

/// Activation applied to the raw model output.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OutputActivation {
    /// Apply softmax unless the output already is a probability distribution.
    #[default]
    Auto,
    /// Always apply softmax.
    Softmax,
    /// Use the output unchanged.
    None,
}

/// Image preprocessing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessConfig {
    /// Input width. Ignored when the model declares a static width.
    pub width: Option<u32>,

    /// Input height. Ignored when the model declares a static height.
    pub height: Option<u32>,

    /// How the image is fitted to the input size.
    pub resize: ResizeMode,

    /// Per-channel mean, in RGB order, on the 0-1 scale.
    pub mean: [f32; 3],

    /// Per-channel standard deviation, in RGB order, on the 0-1 scale.
    pub std: [f32; 3],
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            width: None,
            height: None,
            resize: ResizeMode::default(),
            mean: IMAGENET_MEAN,
            std: IMAGENET_STD,
        }
    }
}

/// Strategy for fitting an image to the model input size.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ResizeMode {
    /// Resize to the exact input size, ignoring aspect ratio.
    Squish,
    /// Resize to cover the input size, then crop the center.
    ///
    /// Matches the validation transform of the exported classifiers.
    #[default]
    Crop,
}

/// Inference device configuration.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum InferenceDevice {
    /// Automatically select (GPU if available, else CPU).
    #[default]
    Auto,
    /// Force GPU (CUDA), fail if unavailable.
    Gpu,
    /// Force CPU inference.
    Cpu,
}

impl std::fmt::Display for InferenceDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Auto => write!(f, "auto"),
            Self::Gpu => write!(f, "gpu"),
            Self::Cpu => write!(f, "cpu"),
        }
    }
}

/// Inference settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InferenceConfig {
    /// Device to use for inference.
    pub device: InferenceDevice,

    /// Intra-op thread count. Uses the runtime default when unset.
    pub threads: Option<usize>,
}

/// Web interface settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind.
    pub host: String,

    /// Port to bind.
    pub port: u16,

    /// Maximum accepted upload size in bytes.
    pub max_upload_bytes: usize,

    /// Page title.
    pub title: String,

    /// Page description.
    pub description: String,

    /// Directory with demonstration images.
    pub examples_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            title: DEFAULT_TITLE.to_string(),
            description: DEFAULT_DESCRIPTION.to_string(),
            examples_dir: PathBuf::from(DEFAULT_EXAMPLES_DIR),
        }
    }
}

impl ServerConfig {
    /// Socket address string for binding.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_config_defaults_to_relative_paths() {
        let model = ModelConfig::default();
        assert_eq!(model.path, PathBuf::from("bird_model.onnx"));
        assert_eq!(model.labels, PathBuf::from("labels.txt"));
        assert_eq!(model.activation, OutputActivation::Auto);
    }

    #[test]
    fn test_server_config_bind_addr() {
        let server = ServerConfig::default();
        assert_eq!(server.bind_addr(), "127.0.0.1:7860");
    }

    #[test]
    fn test_inference_device_display() {
        assert_eq!(InferenceDevice::Auto.to_string(), "auto");
        assert_eq!(InferenceDevice::Gpu.to_string(), "gpu");
        assert_eq!(InferenceDevice::Cpu.to_string(), "cpu");
    }
}
