//! # Leafscan
//!
//! A Rust library for plant leaf disease classification with
//! LLM-generated care advice, built on the Burn framework.
//!
//! ## Modules
//!
//! - `classes`: The 38 PlantVillage disease/healthy categories
//! - `model`: CNN architecture (frozen backbone + classification head)
//! - `inference`: Image preprocessing and typed prediction
//! - `advice`: Gemini-backed agronomic advice generation
//! - `utils`: Logging and error types
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use leafscan::backend::{default_device, DefaultBackend};
//! use leafscan::inference::Predictor;
//!
//! let device = default_device();
//! let predictor = Predictor::<DefaultBackend>::load("models/leafscan_cnn.mpk".as_ref(), &device)?;
//! let result = predictor.predict_file("leaf.jpg".as_ref())?;
//! println!("{}", result.display());
//! ```

pub mod advice;
pub mod backend;
pub mod classes;
pub mod inference;
pub mod model;
pub mod utils;

// Re-export commonly used items for convenience
pub use advice::{AdviceReply, AdviceReport, GeminiClient, GeminiConfig};
pub use classes::{class_index, class_name, is_healthy_class, plant_name, CLASS_NAMES, NUM_CLASSES};
pub use inference::{ClassPrediction, PredictionResult, Predictor};
pub use model::cnn::{LeafClassifier, LeafClassifierConfig};
pub use utils::error::{LeafscanError, Result};

/// Model input size (square, pixels)
pub const IMAGE_SIZE: usize = 224;

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
