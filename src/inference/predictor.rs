//! Inference Predictor Module
//!
//! Loads the trained classifier from a checkpoint and turns images into
//! typed prediction results: no subprocess, no output scraping, just a
//! forward pass and an argmax.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use burn::{
    module::Module,
    record::CompactRecorder,
    tensor::{backend::Backend, Tensor},
};
use image::DynamicImage;
use serde::{Deserialize, Serialize};

use crate::classes::class_name;
use crate::inference::preprocess;
use crate::model::cnn::{LeafClassifier, LeafClassifierConfig};
use crate::utils::error::{LeafscanError, Result};

/// A single class prediction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassPrediction {
    pub class_id: usize,
    pub class_name: String,
    pub probability: f32,
}

/// Result of a single prediction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionResult {
    /// Path to the input image (if applicable)
    pub image_path: Option<PathBuf>,

    /// Predicted class index
    pub predicted_class: usize,

    /// Predicted class name
    pub class_name: String,

    /// Softmax probability for the predicted class, in [0, 1]
    pub confidence: f32,

    /// Full probability distribution over all classes
    pub probabilities: Vec<f32>,

    /// Top-5 predictions
    pub top_5: Vec<ClassPrediction>,

    /// Inference time in milliseconds
    pub inference_time_ms: f64,
}

impl PredictionResult {
    /// Build a result from a probability distribution
    pub fn from_probabilities(probabilities: Vec<f32>, inference_time: Duration) -> Self {
        // Find predicted class (argmax)
        let (predicted_class, &confidence) = probabilities
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap())
            .unwrap_or((0, &0.0));

        let name = class_name(predicted_class).unwrap_or("Unknown").to_string();

        let mut indexed: Vec<(usize, f32)> = probabilities.iter().copied().enumerate().collect();
        indexed.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap());

        let top_5: Vec<ClassPrediction> = indexed
            .iter()
            .take(5)
            .map(|&(idx, prob)| ClassPrediction {
                class_id: idx,
                class_name: class_name(idx).unwrap_or("Unknown").to_string(),
                probability: prob,
            })
            .collect();

        Self {
            image_path: None,
            predicted_class,
            class_name: name,
            confidence,
            probabilities,
            top_5,
            inference_time_ms: inference_time.as_secs_f64() * 1000.0,
        }
    }

    /// Confidence as a percentage rounded to two decimals
    pub fn confidence_percent(&self) -> f64 {
        (self.confidence as f64 * 10000.0).round() / 100.0
    }

    /// Pretty print the prediction result
    pub fn display(&self) -> String {
        let mut output = String::new();

        if let Some(path) = &self.image_path {
            output.push_str(&format!("Image: {:?}\n", path));
        }

        output.push_str(&format!(
            "Prediction: {} (class {})\n",
            self.class_name, self.predicted_class
        ));
        output.push_str(&format!("Confidence: {:.2}%\n", self.confidence * 100.0));
        output.push_str(&format!("Inference time: {:.2} ms\n", self.inference_time_ms));

        output.push_str("\nTop-5 predictions:\n");
        for (i, p) in self.top_5.iter().enumerate() {
            output.push_str(&format!(
                "  {}. {} (class {}) - {:.2}%\n",
                i + 1,
                p.class_name,
                p.class_id,
                p.probability * 100.0
            ));
        }

        output
    }
}

/// Predictor holding the loaded model and preprocessing parameters
pub struct Predictor<B: Backend> {
    model: LeafClassifier<B>,
    device: B::Device,
    image_size: u32,
}

impl<B: Backend> Predictor<B> {
    /// Load the classifier from a checkpoint file
    pub fn load(model_path: &Path, device: &B::Device) -> Result<Self> {
        if !model_path.exists() {
            return Err(LeafscanError::PathNotFound(model_path.to_path_buf()));
        }

        let config = LeafClassifierConfig::new();
        let recorder = CompactRecorder::new();
        let model = LeafClassifier::new(&config, device)
            .load_file(model_path, &recorder, device)
            .map_err(|e| LeafscanError::Model(format!("Failed to load checkpoint: {:?}", e)))?;

        Ok(Self {
            model,
            device: device.clone(),
            image_size: config.input_size as u32,
        })
    }

    /// Wrap an already-constructed model
    pub fn from_model(model: LeafClassifier<B>, device: &B::Device) -> Self {
        let image_size = LeafClassifierConfig::new().input_size as u32;
        Self {
            model,
            device: device.clone(),
            image_size,
        }
    }

    /// Configure the preprocessing image size
    pub fn with_image_size(mut self, size: u32) -> Self {
        self.image_size = size;
        self
    }

    /// Run the forward pass on a prepared CHW float buffer
    fn predict_floats(&self, floats: Vec<f32>) -> Result<PredictionResult> {
        let size = self.image_size as usize;
        let tensor = Tensor::<B, 1>::from_floats(floats.as_slice(), &self.device)
            .reshape([1, 3, size, size]);

        let start = Instant::now();
        let output = self.model.forward_softmax(tensor);
        let elapsed = start.elapsed();

        let probabilities: Vec<f32> = output
            .into_data()
            .to_vec()
            .map_err(|e| LeafscanError::Inference(format!("Failed to read output: {:?}", e)))?;

        Ok(PredictionResult::from_probabilities(probabilities, elapsed))
    }

    /// Predict on an already-decoded image
    pub fn predict_image(&self, image: &DynamicImage) -> Result<PredictionResult> {
        let floats = preprocess::prepare_image(image, self.image_size);
        self.predict_floats(floats)
    }

    /// Predict on an image file
    pub fn predict_file(&self, path: &Path) -> Result<PredictionResult> {
        let floats = preprocess::prepare_file(path, self.image_size)?;
        let mut result = self.predict_floats(floats)?;
        result.image_path = Some(path.to_path_buf());
        Ok(result)
    }

    /// Predict on raw image bytes
    pub fn predict_bytes(&self, bytes: &[u8]) -> Result<PredictionResult> {
        let floats = preprocess::prepare_bytes(bytes, self.image_size)?;
        self.predict_floats(floats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{default_device, DefaultBackend};

    #[test]
    fn test_prediction_result_from_probabilities() {
        let mut probs = vec![0.0; 38];
        probs[5] = 0.8;
        probs[10] = 0.15;
        probs[3] = 0.05;

        let result = PredictionResult::from_probabilities(probs, Duration::from_millis(50));

        assert_eq!(result.predicted_class, 5);
        assert_eq!(result.class_name, "Cherry_(including_sour)___Powdery_mildew");
        assert_eq!(result.confidence, 0.8);
        assert_eq!(result.top_5.len(), 5);
        assert_eq!(result.top_5[0].class_id, 5);
        assert_eq!(result.top_5[1].class_id, 10);
    }

    #[test]
    fn test_confidence_percent_rounding() {
        let mut probs = vec![0.0; 38];
        probs[0] = 0.95324;

        let result = PredictionResult::from_probabilities(probs, Duration::from_millis(1));
        assert_eq!(result.confidence_percent(), 95.32);
    }

    #[test]
    fn test_display_contains_class() {
        let mut probs = vec![0.0; 38];
        probs[37] = 0.99;

        let result = PredictionResult::from_probabilities(probs, Duration::from_millis(1));
        let text = result.display();
        assert!(text.contains("Tomato___healthy"));
        assert!(text.contains("Top-5"));
    }

    #[test]
    fn test_predict_image_with_random_weights() {
        let device = default_device();
        let config = LeafClassifierConfig::new();
        let model = LeafClassifier::<DefaultBackend>::new(&config, &device);
        let predictor = Predictor::from_model(model, &device).with_image_size(64);

        let img = DynamicImage::new_rgb8(32, 32);
        let result = predictor.predict_image(&img).unwrap();

        assert_eq!(result.probabilities.len(), 38);
        assert!(result.predicted_class < 38);
        let sum: f32 = result.probabilities.iter().sum();
        assert!((sum - 1.0).abs() < 1e-3);
    }

    #[test]
    fn test_load_missing_checkpoint() {
        let device = default_device();
        let err = Predictor::<DefaultBackend>::load(Path::new("/no/such/model.mpk"), &device);
        assert!(matches!(err, Err(LeafscanError::PathNotFound(_))));
    }
}
