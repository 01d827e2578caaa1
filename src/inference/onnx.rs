//! ONNX Runtime backend.

use crate::config::{InferenceDevice, ModelConfig, OutputActivation, PreprocessConfig};
use crate::error::{Error, Result};
use crate::inference::preprocess::Preprocessor;
use crate::inference::{InferenceBackend, ModelInfo, activation};
use image::DynamicImage;
use ort::execution_providers::CUDAExecutionProvider;
use ort::session::{Session, builder::GraphOptimizationLevel};
use ort::value::Tensor;
use sha2::{Digest, Sha256};
use std::fs::File;
use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, info};

/// Image classifier executed by ONNX Runtime.
///
/// The session is loaded once and never mutated by requests. `ort` needs
/// exclusive access for `run`, so calls are serialized through a mutex.
pub struct OnnxBackend {
    session: Mutex<Session>,
    input_name: String,
    output_name: String,
    num_classes: Option<usize>,
    preprocessor: Preprocessor,
    activation: OutputActivation,
    info: ModelInfo,
}

impl OnnxBackend {
    /// Load a model file and resolve its input/output layout.
    pub fn load(
        model: &ModelConfig,
        preprocess: &PreprocessConfig,
        device: InferenceDevice,
        threads: Option<usize>,
    ) -> Result<Self> {
        let path = model.path.as_path();
        let fingerprint = fingerprint(path)?;
        debug!("Model fingerprint: sha256:{fingerprint}");

        let mut builder = Session::builder()
            .map_err(|e| load_error(path, e))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| load_error(path, e))?;

        if let Some(threads) = threads {
            builder = builder
                .with_intra_threads(threads)
                .map_err(|e| load_error(path, e))?;
        }

        let (builder, device_msg) = match device {
            InferenceDevice::Cpu => {
                info!("Requested device: CPU");
                (builder, "CPU")
            }
            InferenceDevice::Auto => {
                // Registration failure silently falls back to CPU.
                info!("Auto mode: attempting CUDA with CPU fallback");
                let builder = builder
                    .with_execution_providers([CUDAExecutionProvider::default().build()])
                    .map_err(|e| load_error(path, e))?;
                (builder, "Auto")
            }
            InferenceDevice::Gpu => {
                info!("--gpu: requiring CUDA provider");
                let builder = builder
                    .with_execution_providers([CUDAExecutionProvider::default()
                        .build()
                        .error_on_failure()])
                    .map_err(|e| load_error(path, e))?;
                (builder, "CUDA")
            }
        };

        let session = builder
            .commit_from_file(path)
            .map_err(|e| load_error(path, e))?;

        let input = session.inputs.first().ok_or_else(|| Error::ModelLoad {
            path: path.to_path_buf(),
            reason: "model declares no inputs".to_string(),
        })?;
        let output = session.outputs.first().ok_or_else(|| Error::ModelLoad {
            path: path.to_path_buf(),
            reason: "model declares no outputs".to_string(),
        })?;

        let input_dims: Vec<i64> = input
            .input_type
            .tensor_shape()
            .map(|s| s.iter().copied().collect())
            .unwrap_or_default();
        let output_dims: Vec<i64> = output
            .output_type
            .tensor_shape()
            .map(|s| s.iter().copied().collect())
            .unwrap_or_default();
        debug!(
            "Model input '{}' {:?}, output '{}' {:?}",
            input.name, input_dims, output.name, output_dims
        );

        let input_name = input.name.clone();
        let output_name = output.name.clone();
        let preprocessor = Preprocessor::new(preprocess, declared_input_size(&input_dims));
        let num_classes = declared_class_count(&output_dims);
        let (width, height) = preprocessor.input_size();

        info!(
            "Loaded model: {}, input: {}x{}, classes: {}, device: {}",
            path.display(),
            width,
            height,
            num_classes.map_or_else(|| "dynamic".to_string(), |n| n.to_string()),
            device_msg
        );

        let info = ModelInfo {
            path: Some(path.to_path_buf()),
            fingerprint: Some(format!("sha256:{fingerprint}")),
            num_classes: num_classes.unwrap_or_default(),
            input_width: width,
            input_height: height,
            device: device.to_string(),
        };

        Ok(Self {
            session: Mutex::new(session),
            input_name,
            output_name,
            num_classes,
            preprocessor,
            activation: model.activation,
            info,
        })
    }
}

impl InferenceBackend for OnnxBackend {
    fn predict(&self, image: &DynamicImage) -> Result<Vec<f32>> {
        let input = self.preprocessor.to_tensor(image);
        let tensor = Tensor::from_array(input).map_err(inference_error)?;

        let mut session = self.session.lock().map_err(|_| Error::Inference {
            reason: "session lock poisoned".to_string(),
        })?;
        let outputs = session
            .run(ort::inputs![self.input_name.as_str() => tensor])
            .map_err(inference_error)?;
        let scores: Vec<f32> = outputs[self.output_name.as_str()]
            .try_extract_array::<f32>()
            .map_err(inference_error)?
            .iter()
            .copied()
            .collect();

        Ok(activation::apply(self.activation, scores))
    }

    fn num_classes(&self) -> Option<usize> {
        self.num_classes
    }

    fn info(&self) -> ModelInfo {
        self.info.clone()
    }
}

/// SHA-256 of the model artifact, hex encoded.
fn fingerprint(path: &Path) -> Result<String> {
    if !path.exists() {
        return Err(Error::ModelFileNotFound {
            path: path.to_path_buf(),
        });
    }
    let mut file = File::open(path).map_err(|e| load_error(path, e))?;
    let mut hasher = Sha256::new();
    std::io::copy(&mut file, &mut hasher).map_err(|e| load_error(path, e))?;
    Ok(format!("{:x}", hasher.finalize()))
}

/// Static `(width, height)` from an NCHW input shape; dynamic axes are `None`.
fn declared_input_size(dims: &[i64]) -> (Option<u32>, Option<u32>) {
    let static_dim = |d: i64| u32::try_from(d).ok().filter(|&d| d > 0);
    match *dims {
        [_, _, height, width] => (static_dim(width), static_dim(height)),
        _ => (None, None),
    }
}

/// Static class count from the last output axis.
fn declared_class_count(dims: &[i64]) -> Option<usize> {
    dims.last()
        .and_then(|&d| usize::try_from(d).ok())
        .filter(|&d| d > 0)
}

fn load_error(path: &Path, e: impl std::fmt::Display) -> Error {
    Error::ModelLoad {
        path: path.to_path_buf(),
        reason: e.to_string(),
    }
}

fn inference_error(e: impl std::fmt::Display) -> Error {
    Error::Inference {
        reason: e.to_string(),
    }
}
