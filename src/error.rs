//! Error types for birdlens.

/// Result type alias for birdlens operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type for birdlens.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration directory could not be determined.
    #[error("could not determine configuration directory for this platform")]
    ConfigDirNotFound,

    /// Failed to read configuration file.
    #[error("failed to read config file '{path}'")]
    ConfigRead {
        /// Path to the config file.
        path: std::path::PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse configuration file.
    #[error("failed to parse config file '{path}'")]
    ConfigParse {
        /// Path to the config file.
        path: std::path::PathBuf,
        /// Underlying parse error.
        #[source]
        source: toml::de::Error,
    },

    /// Configuration validation failed.
    #[error("configuration validation failed: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    /// Failed to write configuration file.
    #[error("failed to write config file '{path}'")]
    ConfigWrite {
        /// Path to the config file.
        path: std::path::PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to serialize configuration.
    #[error("failed to serialize config")]
    ConfigSerialize {
        /// Underlying serialization error.
        #[source]
        source: toml::ser::Error,
    },

    /// Model file does not exist.
    #[error("model file does not exist: {path}")]
    ModelFileNotFound {
        /// Path to the missing model file.
        path: std::path::PathBuf,
    },

    /// Labels file does not exist.
    #[error("labels file does not exist: {path}")]
    LabelsFileNotFound {
        /// Path to the missing labels file.
        path: std::path::PathBuf,
    },

    /// Failed to read labels file.
    #[error("failed to read labels file '{path}'")]
    LabelsRead {
        /// Path to the labels file.
        path: std::path::PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Labels file contained no labels.
    #[error("labels file contains no labels: {path}")]
    EmptyLabelSet {
        /// Path to the labels file.
        path: std::path::PathBuf,
    },

    /// Labels file is not in sorted, deduplicated order.
    #[error(
        "labels in '{path}' are not in sorted, deduplicated order (first mismatch at index {index}: expected '{expected}', found '{found}')"
    )]
    LabelOrderMismatch {
        /// Path to the labels file.
        path: std::path::PathBuf,
        /// Index of the first out-of-order label.
        index: usize,
        /// Label expected at that index.
        expected: String,
        /// Label found at that index.
        found: String,
    },

    /// Model class count disagrees with the label set.
    #[error("model declares {model_classes} output classes but label set has {labels} labels")]
    ClassCountMismatch {
        /// Number of classes declared by the model output.
        model_classes: usize,
        /// Number of labels loaded.
        labels: usize,
    },

    /// Failed to load the model.
    #[error("failed to load model '{path}': {reason}")]
    ModelLoad {
        /// Path to the model file.
        path: std::path::PathBuf,
        /// Description of the load failure.
        reason: String,
    },

    /// Failed to decode an input image.
    #[error("failed to decode image: {0}")]
    ImageDecode(#[from] image::ImageError),

    /// Inference failed.
    #[error("inference failed: {reason}")]
    Inference {
        /// Description of the inference failure.
        reason: String,
    },

    /// Model output does not line up with the label set.
    #[error("model produced {actual} scores, expected {expected}")]
    OutputShape {
        /// Number of labels in the label set.
        expected: usize,
        /// Number of scores returned by the model.
        actual: usize,
    },

    /// Failed to bind the HTTP listener.
    #[error("failed to bind server to '{addr}'")]
    ServerBind {
        /// Address that could not be bound.
        addr: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to read an example image.
    #[error("failed to read example image '{path}'")]
    ExampleRead {
        /// Path to the example image.
        path: std::path::PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Page template failed to compile or render.
    #[error("failed to render page: {0}")]
    Template(#[from] minijinja::Error),

    /// Failed to serialize a JSON response.
    #[error("failed to serialize JSON output")]
    JsonSerialize {
        /// Underlying serialization error.
        #[source]
        source: serde_json::Error,
    },

    /// Internal error (for unexpected failures).
    #[error("internal error: {message}")]
    Internal {
        /// Error message.
        message: String,
    },
}
