//! Error Handling Module
//!
//! Defines custom error types for the leafscan library.
//! Uses thiserror for ergonomic error definitions.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for leafscan operations
#[derive(Error, Debug)]
pub enum LeafscanError {
    /// Error loading or decoding an image file
    #[error("Failed to load image at '{0}': {1}")]
    ImageLoad(PathBuf, String),

    /// Error decoding an in-memory image
    #[error("Failed to decode image: {0}")]
    ImageDecode(String),

    /// Error with model operations (loading weights, checkpoint format)
    #[error("Model error: {0}")]
    Model(String),

    /// Error during inference
    #[error("Inference error: {0}")]
    Inference(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Path not found
    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),
}

/// Convenience Result type for leafscan operations
pub type Result<T> = std::result::Result<T, LeafscanError>;
