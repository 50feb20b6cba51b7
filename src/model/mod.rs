//! Model module
//!
//! The CNN architecture used for leaf disease classification.

pub mod cnn;

pub use cnn::{LeafClassifier, LeafClassifierConfig};
