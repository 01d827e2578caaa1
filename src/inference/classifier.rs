//! Classification adapter: image in, label probabilities out.

use crate::config::Config;
use crate::error::{Error, Result};
use crate::inference::{InferenceBackend, LabelSet, ModelInfo, OnnxBackend};
use image::DynamicImage;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Probability assigned to one label.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabelScore {
    /// Species name.
    pub label: String,
    /// Probability in `[0, 1]`.
    pub confidence: f32,
}

/// Probabilities for every label of the model, in class index order.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    scores: Vec<LabelScore>,
}

impl Prediction {
    /// Scores in label-set order.
    pub fn scores(&self) -> &[LabelScore] {
        &self.scores
    }

    /// Probability of `label`, if it is part of the label set.
    pub fn get(&self, label: &str) -> Option<f32> {
        self.scores
            .iter()
            .find(|s| s.label == label)
            .map(|s| s.confidence)
    }

    /// Label to probability mapping.
    pub fn to_map(&self) -> BTreeMap<String, f32> {
        self.scores
            .iter()
            .map(|s| (s.label.clone(), s.confidence))
            .collect()
    }

    /// Scores sorted by descending probability.
    ///
    /// Ties keep label-set order.
    pub fn ranked(&self) -> Vec<LabelScore> {
        let mut ranked = self.scores.clone();
        ranked.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
        ranked
    }

    /// Highest scoring label.
    pub fn top(&self) -> Option<&LabelScore> {
        self.scores
            .iter()
            .reduce(|best, s| if s.confidence > best.confidence { s } else { best })
    }

    /// Sum of all probabilities.
    pub fn total(&self) -> f32 {
        self.scores.iter().map(|s| s.confidence).sum()
    }

    /// Ranked output, optionally truncated to the `top_k` best labels.
    pub fn to_output(&self, top_k: Option<usize>) -> ClassificationOutput {
        let mut confidences = self.ranked();
        if let Some(k) = top_k {
            confidences.truncate(k);
        }
        ClassificationOutput {
            label: self.top().map(|s| s.label.clone()),
            confidences,
        }
    }
}

/// Serializable ranked classification result.
#[derive(Debug, Clone, Serialize)]
pub struct ClassificationOutput {
    /// Highest scoring label.
    pub label: Option<String>,
    /// Labels sorted by descending probability.
    pub confidences: Vec<LabelScore>,
}

/// Maps backend output onto the model's label set.
pub struct BirdClassifier {
    backend: Box<dyn InferenceBackend>,
    labels: LabelSet,
}

impl BirdClassifier {
    /// Pair a backend with its label set.
    ///
    /// Fails if the backend declares a class count different from the label count.
    pub fn new(backend: Box<dyn InferenceBackend>, labels: LabelSet) -> Result<Self> {
        if let Some(model_classes) = backend.num_classes()
            && model_classes != labels.len()
        {
            return Err(Error::ClassCountMismatch {
                model_classes,
                labels: labels.len(),
            });
        }
        Ok(Self { backend, labels })
    }

    /// Load the ONNX model and labels named by the configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        crate::config::validate_model_config(&config.model)?;

        let labels = LabelSet::load(&config.model.labels)?;
        info!(
            "Loaded {} labels from {}",
            labels.len(),
            config.model.labels.display()
        );

        let backend = OnnxBackend::load(
            &config.model,
            &config.preprocess,
            config.inference.device,
            config.inference.threads,
        )?;

        Self::new(Box::new(backend), labels)
    }

    /// The label set, in class index order.
    pub fn labels(&self) -> &LabelSet {
        &self.labels
    }

    /// Describe the loaded model.
    pub fn info(&self) -> ModelInfo {
        let mut info = self.backend.info();
        info.num_classes = self.labels.len();
        info
    }

    /// Classify a decoded image.
    ///
    /// Returns a probability for every label. Backend errors propagate unchanged.
    pub fn classify(&self, image: &DynamicImage) -> Result<Prediction> {
        let probabilities = self.backend.predict(image)?;
        if probabilities.len() != self.labels.len() {
            return Err(Error::OutputShape {
                expected: self.labels.len(),
                actual: probabilities.len(),
            });
        }

        let scores: Vec<LabelScore> = self
            .labels
            .iter()
            .zip(probabilities)
            .map(|(label, confidence)| LabelScore {
                label: label.clone(),
                confidence,
            })
            .collect();

        let prediction = Prediction { scores };
        if let Some(top) = prediction.top() {
            debug!("Top prediction: {} ({:.4})", top.label, top.confidence);
        }
        Ok(prediction)
    }

    /// Decode encoded image bytes and classify them.
    pub fn classify_bytes(&self, bytes: &[u8]) -> Result<Prediction> {
        let image = image::load_from_memory(bytes)?;
        self.classify(&image)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::constants::PROBABILITY_SUM_TOLERANCE;
    use image::{Rgb, RgbImage};

    struct FixedBackend {
        probabilities: Vec<f32>,
        declared_classes: Option<usize>,
    }

    impl InferenceBackend for FixedBackend {
        fn predict(&self, _image: &DynamicImage) -> Result<Vec<f32>> {
            Ok(self.probabilities.clone())
        }

        fn num_classes(&self) -> Option<usize> {
            self.declared_classes
        }

        fn info(&self) -> ModelInfo {
            ModelInfo::default()
        }
    }

    struct FailingBackend;

    impl InferenceBackend for FailingBackend {
        fn predict(&self, _image: &DynamicImage) -> Result<Vec<f32>> {
            Err(Error::Inference {
                reason: "session closed".to_string(),
            })
        }

        fn info(&self) -> ModelInfo {
            ModelInfo::default()
        }
    }

    fn labels() -> LabelSet {
        LabelSet::from_vocabulary(["Blue Jay", "Killdeer", "Mourning Dove", "Osprey"])
    }

    fn classifier(probabilities: Vec<f32>) -> BirdClassifier {
        let backend = FixedBackend {
            probabilities,
            declared_classes: Some(4),
        };
        BirdClassifier::new(Box::new(backend), labels()).unwrap()
    }

    fn image() -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(4, 4, Rgb([120, 110, 90])))
    }

    #[test]
    fn test_output_keys_equal_label_set() {
        let prediction = classifier(vec![0.1, 0.2, 0.6, 0.1])
            .classify(&image())
            .unwrap();
        let keys: Vec<String> = prediction.to_map().into_keys().collect();
        assert_eq!(keys, labels().as_slice());
    }

    #[test]
    fn test_probabilities_sum_to_one() {
        let prediction = classifier(vec![0.05, 0.15, 0.7, 0.1])
            .classify(&image())
            .unwrap();
        assert!((prediction.total() - 1.0).abs() <= PROBABILITY_SUM_TOLERANCE);
    }

    #[test]
    fn test_repeated_classification_is_deterministic() {
        let classifier = classifier(vec![0.05, 0.15, 0.7, 0.1]);
        let first = classifier.classify(&image()).unwrap();
        let second = classifier.classify(&image()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_mourning_dove_probability_in_range() {
        let prediction = classifier(vec![0.05, 0.15, 0.7, 0.1])
            .classify(&image())
            .unwrap();
        let dove = prediction.get("Mourning Dove").unwrap();
        assert!((0.0..=1.0).contains(&dove));
        assert_eq!(prediction.top().unwrap().label, "Mourning Dove");
    }

    #[test]
    fn test_near_zero_scores_are_kept() {
        let prediction = classifier(vec![0.0, 1e-9, 1.0 - 1e-9, 0.0])
            .classify(&image())
            .unwrap();
        assert_eq!(prediction.scores().len(), 4);
        assert_eq!(prediction.get("Blue Jay"), Some(0.0));
    }

    #[test]
    fn test_ranked_is_descending_with_stable_ties() {
        let prediction = classifier(vec![0.3, 0.1, 0.3, 0.3])
            .classify(&image())
            .unwrap();
        let ranked: Vec<String> = prediction.ranked().into_iter().map(|s| s.label).collect();
        assert_eq!(ranked, ["Blue Jay", "Mourning Dove", "Osprey", "Killdeer"]);
    }

    #[test]
    fn test_to_output_truncates() {
        let output = classifier(vec![0.1, 0.2, 0.6, 0.1])
            .classify(&image())
            .unwrap()
            .to_output(Some(2));
        assert_eq!(output.label.as_deref(), Some("Mourning Dove"));
        assert_eq!(output.confidences.len(), 2);
        assert_eq!(output.confidences[1].label, "Killdeer");
    }

    #[test]
    fn test_output_length_mismatch_is_error() {
        let backend = FixedBackend {
            probabilities: vec![0.5, 0.5],
            declared_classes: None,
        };
        let classifier = BirdClassifier::new(Box::new(backend), labels()).unwrap();
        assert!(matches!(
            classifier.classify(&image()),
            Err(Error::OutputShape {
                expected: 4,
                actual: 2
            })
        ));
    }

    #[test]
    fn test_declared_class_count_mismatch_fails_at_construction() {
        let backend = FixedBackend {
            probabilities: vec![],
            declared_classes: Some(64),
        };
        assert!(matches!(
            BirdClassifier::new(Box::new(backend), labels()),
            Err(Error::ClassCountMismatch {
                model_classes: 64,
                labels: 4
            })
        ));
    }

    #[test]
    fn test_backend_error_propagates_unchanged() {
        let classifier = BirdClassifier::new(Box::new(FailingBackend), labels()).unwrap();
        match classifier.classify(&image()) {
            Err(Error::Inference { reason }) => assert_eq!(reason, "session closed"),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_classify_bytes_rejects_garbage() {
        let result = classifier(vec![0.25; 4]).classify_bytes(b"not an image");
        assert!(matches!(result, Err(Error::ImageDecode(_))));
    }

    #[test]
    fn test_info_reports_label_count() {
        assert_eq!(classifier(vec![0.25; 4]).info().num_classes, 4);
    }

    #[test]
    fn test_missing_model_file_is_fatal() {
        let mut config = Config::default();
        config.model.path = "/nonexistent/bird_model.onnx".into();
        assert!(matches!(
            BirdClassifier::from_config(&config),
            Err(Error::ModelFileNotFound { .. })
        ));
    }
}
