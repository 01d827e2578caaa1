//! Image to tensor conversion.

use crate::config::{PreprocessConfig, ResizeMode};
use crate::constants::preprocess::{DEFAULT_HEIGHT, DEFAULT_WIDTH};
use image::{DynamicImage, GenericImageView, imageops::FilterType};
use ndarray::Array4;

/// Resolved preprocessing parameters for one model.
#[derive(Debug, Clone, PartialEq)]
pub struct Preprocessor {
    width: u32,
    height: u32,
    resize: ResizeMode,
    mean: [f32; 3],
    std: [f32; 3],
}

impl Preprocessor {
    /// Resolve preprocessing from configuration and the model's declared input size.
    ///
    /// A static size declared by the model wins over the configured one.
    pub fn new(config: &PreprocessConfig, model_size: (Option<u32>, Option<u32>)) -> Self {
        let (model_width, model_height) = model_size;
        Self {
            width: model_width.or(config.width).unwrap_or(DEFAULT_WIDTH),
            height: model_height.or(config.height).unwrap_or(DEFAULT_HEIGHT),
            resize: config.resize,
            mean: config.mean,
            std: config.std,
        }
    }

    /// Input size as `(width, height)`.
    pub fn input_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Convert a decoded image into a normalized `[1, 3, H, W]` tensor.
    pub fn to_tensor(&self, image: &DynamicImage) -> Array4<f32> {
        let rgb = self.fit(image).to_rgb8();
        let (width, height) = (self.width as usize, self.height as usize);

        let mut tensor = Array4::<f32>::zeros((1, 3, height, width));
        for (x, y, pixel) in rgb.enumerate_pixels() {
            for channel in 0..3 {
                let value = f32::from(pixel[channel]) / 255.0;
                tensor[[0, channel, y as usize, x as usize]] =
                    (value - self.mean[channel]) / self.std[channel];
            }
        }
        tensor
    }

    fn fit(&self, image: &DynamicImage) -> DynamicImage {
        if image.dimensions() == (self.width, self.height) {
            return image.clone();
        }
        match self.resize {
            ResizeMode::Squish => image.resize_exact(self.width, self.height, FilterType::Triangle),
            ResizeMode::Crop => image.resize_to_fill(self.width, self.height, FilterType::Triangle),
        }
    }
}
