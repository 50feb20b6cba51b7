//! Application state for the leafscan server
//!
//! Holds the loaded classifier, the advice client, and server
//! configuration behind an `Arc` shared with every handler.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};

use leafscan::advice::GeminiClient;
use leafscan::backend::DefaultBackend;
use leafscan::inference::Predictor;

/// Server configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Path to the model checkpoint
    pub model_path: PathBuf,
    /// Directory where uploads are temporarily persisted
    pub uploads_dir: PathBuf,
    /// Maximum accepted upload size in bytes
    pub max_upload_bytes: usize,
    /// Generative model used for advice
    pub gemini_model: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("models/leafscan_cnn.mpk"),
            uploads_dir: PathBuf::from("temp_uploads"),
            max_upload_bytes: 10 * 1024 * 1024,
            gemini_model: leafscan::advice::DEFAULT_MODEL.to_string(),
        }
    }
}

/// Shared application state
pub struct AppState {
    /// Server configuration
    pub config: ServerConfig,
    /// The loaded classifier
    pub predictor: Predictor<DefaultBackend>,
    /// Advice client; None when no API key is configured
    pub advisor: Option<GeminiClient>,
    /// Server start time
    started_at: Instant,
}

impl AppState {
    pub fn new(
        config: ServerConfig,
        predictor: Predictor<DefaultBackend>,
        advisor: Option<GeminiClient>,
    ) -> Self {
        Self {
            config,
            predictor,
            advisor,
            started_at: Instant::now(),
        }
    }

    /// Get uptime in seconds
    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}

pub type SharedState = Arc<AppState>;

#[cfg(test)]
pub mod test_support {
    use super::*;
    use leafscan::backend::default_device;
    use leafscan::model::cnn::{LeafClassifier, LeafClassifierConfig};

    /// Build a state with a randomly initialized model and no advisor.
    /// A small input size keeps forward passes cheap in tests.
    pub fn test_state(uploads_dir: PathBuf, advisor: Option<GeminiClient>) -> SharedState {
        let device = default_device();
        let model = LeafClassifier::new(&LeafClassifierConfig::new(), &device);
        let predictor = Predictor::from_model(model, &device).with_image_size(64);

        let config = ServerConfig {
            uploads_dir,
            ..ServerConfig::default()
        };

        Arc::new(AppState::new(config, predictor, advisor))
    }
}
