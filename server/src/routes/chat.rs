//! Chat endpoint
//!
//! Follow-up advice for an already-detected disease: the caller sends
//! the disease label and a free-text question/symptom description and
//! gets the structured advice JSON back.

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::warn;

use leafscan::advice::{AdviceReply, AdviceReport};

use crate::error::ApiError;
use crate::state::SharedState;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    /// Disease label from a previous prediction
    pub disease: String,
    /// Free-text symptoms or question
    #[serde(default)]
    pub symptoms: Option<String>,
}

/// Structured advice, or the raw model text when it was not valid JSON
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum ChatResponse {
    Structured(AdviceReport),
    Unstructured { message: String },
}

/// POST /chat - Generate advice for a disease and symptom description
pub async fn chat(
    State(state): State<SharedState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    let advisor = state
        .advisor
        .as_ref()
        .ok_or_else(|| ApiError::service_unavailable("Advice generator is not configured"))?;

    let reply = advisor
        .advise(&request.disease, request.symptoms.as_deref())
        .await
        .map_err(|e| {
            warn!("Advice generation failed: {}", e);
            ApiError::internal(e.to_string())
        })?;

    let response = match reply {
        AdviceReply::Structured(report) => ChatResponse::Structured(report),
        AdviceReply::Unstructured(text) => ChatResponse::Unstructured { message: text },
    };

    Ok(Json(response))
}
