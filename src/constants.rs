//! Application-wide constants.
//!
//! All magic numbers and strings are defined here to ensure consistency
//! and make changes easy to track.

/// Application name used for config directories and user-facing messages.
pub const APP_NAME: &str = "birdlens";

/// Default model artifact path, relative to the working directory.
pub const DEFAULT_MODEL_PATH: &str = "bird_model.onnx";

/// Default vocabulary path, relative to the working directory.
pub const DEFAULT_LABELS_PATH: &str = "labels.txt";

/// Default directory holding demonstration images.
pub const DEFAULT_EXAMPLES_DIR: &str = "Birds Examples";

/// Default number of ranked labels shown by the `classify` command.
pub const DEFAULT_TOP_K: usize = 5;

/// Tolerance used when checking that probabilities sum to one.
pub const PROBABILITY_SUM_TOLERANCE: f32 = 1e-3;

/// Server defaults.
pub mod server {
    /// Default bind host.
    pub const DEFAULT_HOST: &str = "127.0.0.1";

    /// Default bind port.
    pub const DEFAULT_PORT: u16 = 7860;

    /// Default maximum upload size in bytes (10 MiB).
    pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

    /// Default page title.
    pub const DEFAULT_TITLE: &str = "Bird Species Classifier";

    /// Default page description.
    pub const DEFAULT_DESCRIPTION: &str = "Upload a bird image to classify its species. This model was trained on bird species from Ohio.";

    /// Multipart form field carrying the uploaded image.
    pub const IMAGE_FIELD: &str = "image";

    /// Number of ranked labels rendered on the HTML result page.
    pub const HTML_TOP_K: usize = 5;
}

/// Image preprocessing defaults.
pub mod preprocess {
    /// Default input width when the model does not declare one.
    pub const DEFAULT_WIDTH: u32 = 224;

    /// Default input height when the model does not declare one.
    pub const DEFAULT_HEIGHT: u32 = 224;

    /// `ImageNet` channel means.
    pub const IMAGENET_MEAN: [f32; 3] = [0.485, 0.456, 0.406];

    /// `ImageNet` channel standard deviations.
    pub const IMAGENET_STD: [f32; 3] = [0.229, 0.224, 0.225];
}

/// File extensions recognized as example images.
pub const EXAMPLE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "bmp", "gif"];

/// UTF-8 byte order mark, as decoded into a `char`.
pub const UTF8_BOM: char = '\u{feff}';
