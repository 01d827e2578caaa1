//! Inference module for bird species image classification.

pub mod activation;
mod classifier;
mod labels;
mod onnx;
pub mod preprocess;

pub use classifier::{BirdClassifier, ClassificationOutput, LabelScore, Prediction};
pub use labels::LabelSet;
pub use onnx::OnnxBackend;

use crate::error::Result;
use image::DynamicImage;
use serde::Serialize;
use std::path::PathBuf;

/// A model that turns one image into one probability per class.
///
/// Implementations must be safe to share between concurrent requests.
pub trait InferenceBackend: Send + Sync {
    /// Run the model on one image.
    ///
    /// Returns probabilities in class index order.
    fn predict(&self, image: &DynamicImage) -> Result<Vec<f32>>;

    /// Number of classes the model declares, when known before inference.
    fn num_classes(&self) -> Option<usize> {
        None
    }

    /// Describe the loaded model.
    fn info(&self) -> ModelInfo;
}

/// Summary of a loaded model.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ModelInfo {
    /// Model artifact path.
    pub path: Option<PathBuf>,
    /// Content fingerprint of the artifact.
    pub fingerprint: Option<String>,
    /// Number of output classes.
    pub num_classes: usize,
    /// Model input width in pixels.
    pub input_width: u32,
    /// Model input height in pixels.
    pub input_height: u32,
    /// Requested inference device.
    pub device: String,
}
