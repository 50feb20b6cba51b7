//! Inference module
//!
//! Preprocessing and prediction: an uploaded image goes through
//! decode/resize/scale and a single forward pass, and comes out as a
//! typed [`PredictionResult`].

pub mod predictor;
pub mod preprocess;

pub use predictor::{ClassPrediction, PredictionResult, Predictor};
