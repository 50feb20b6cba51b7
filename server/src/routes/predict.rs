//! Prediction endpoint
//!
//! Accepts a multipart image upload, persists it under the uploads
//! directory with a unique name, runs the classifier on a blocking
//! worker, optionally enriches the result with generated advice, and
//! removes the temp file on every path.

use std::path::{Path, PathBuf};

use axum::extract::{Multipart, State};
use axum::Json;
use serde::Serialize;
use tracing::{error, warn};
use uuid::Uuid;

use leafscan::advice::{AdviceReply, AdviceReport};
use leafscan::inference::ClassPrediction;

use crate::error::ApiError;
use crate::state::SharedState;

/// Response for a successful prediction. Advice keys, when present,
/// are flattened into the top-level object.
#[derive(Debug, Serialize)]
pub struct PredictResponse {
    /// Predicted class label
    pub class: String,
    /// Confidence as a percentage (0-100, two decimals)
    pub confidence: f64,
    /// Top-5 predictions
    pub top_5: Vec<ClassPrediction>,
    /// Symptoms echoed back when the caller provided them
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symptoms: Option<String>,
    /// Structured advice, when the generator returned valid JSON
    #[serde(flatten)]
    pub advice: Option<AdviceReport>,
    /// Raw advice text, when the generator reply was not valid JSON
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// POST /predict - Classify an uploaded leaf image
pub async fn predict(
    State(state): State<SharedState>,
    mut multipart: Multipart,
) -> Result<Json<PredictResponse>, ApiError> {
    let mut file_bytes: Option<Vec<u8>> = None;
    let mut file_name: Option<String> = None;
    let mut symptoms: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Invalid multipart body: {}", e)))?
    {
        let name = field.name().map(|s| s.to_string());
        match name.as_deref() {
            Some("file") => {
                file_name = field.file_name().map(|s| s.to_string());
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("Failed to read upload: {}", e)))?;
                file_bytes = Some(bytes.to_vec());
            }
            Some("symptoms") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("Failed to read field: {}", e)))?;
                if !text.trim().is_empty() {
                    symptoms = Some(text);
                }
            }
            _ => continue,
        }
    }

    let file_bytes = file_bytes.ok_or_else(|| ApiError::bad_request("Missing 'file' field"))?;
    if file_bytes.is_empty() {
        return Err(ApiError::bad_request("Uploaded file is empty"));
    }

    // Persist under a unique name so concurrent uploads never collide
    let ext = extension_of(file_name.as_deref());
    let file_path = state
        .config
        .uploads_dir
        .join(format!("{}.{}", Uuid::new_v4(), ext));

    tokio::fs::create_dir_all(&state.config.uploads_dir)
        .await
        .map_err(|e| {
            error!("Failed to create uploads directory: {}", e);
            ApiError::internal("Failed to store upload")
        })?;

    tokio::fs::write(&file_path, &file_bytes).await.map_err(|e| {
        error!("Failed to write upload: {}", e);
        ApiError::internal("Failed to store upload")
    })?;

    // The forward pass is CPU-bound; keep it off the async executor
    let result = {
        let state = state.clone();
        let path = file_path.clone();
        tokio::task::spawn_blocking(move || state.predictor.predict_file(&path))
            .await
            .map_err(|e| {
                error!("Inference task panicked: {}", e);
                ApiError::internal("Inference failed")
            })
    };

    let result = match result {
        Ok(Ok(result)) => {
            remove_quietly(&file_path).await;
            result
        }
        Ok(Err(e)) => {
            remove_quietly(&file_path).await;
            warn!("Prediction failed: {}", e);
            return Err(match e {
                leafscan::LeafscanError::ImageLoad(..) | leafscan::LeafscanError::ImageDecode(_) => {
                    ApiError::bad_request("Uploaded file is not a valid image")
                }
                other => ApiError::internal(other.to_string()),
            });
        }
        Err(api_err) => {
            remove_quietly(&file_path).await;
            return Err(api_err);
        }
    };

    // Advice is enrichment: failures degrade to prediction-only
    let mut advice = None;
    let mut message = None;
    if let Some(advisor) = &state.advisor {
        match advisor.advise(&result.class_name, symptoms.as_deref()).await {
            Ok(AdviceReply::Structured(report)) => advice = Some(report),
            Ok(AdviceReply::Unstructured(text)) => message = Some(text),
            Err(e) => warn!("Advice generation failed: {}", e),
        }
    }

    Ok(Json(PredictResponse {
        class: result.class_name.clone(),
        confidence: result.confidence_percent(),
        top_5: result.top_5,
        symptoms,
        advice,
        message,
    }))
}

/// File extension of the uploaded name, defaulting to "jpg"
fn extension_of(file_name: Option<&str>) -> String {
    file_name
        .and_then(|n| Path::new(n).extension())
        .and_then(|e| e.to_str())
        .filter(|e| e.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_else(|| "jpg".to_string())
}

async fn remove_quietly(path: &PathBuf) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        warn!("Failed to remove temp upload {:?}: {}", path, e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::test_support::test_state;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use axum::routing::post;
    use axum::Router;
    use std::io::Cursor;
    use tower::ServiceExt;

    const BOUNDARY: &str = "leafscan-test-boundary";

    fn png_bytes() -> Vec<u8> {
        let img = image::DynamicImage::new_rgb8(8, 8);
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
            .unwrap();
        buf
    }

    fn multipart_body(file: Option<&[u8]>, symptoms: Option<&str>) -> Vec<u8> {
        let mut body = Vec::new();
        if let Some(bytes) = file {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; \
                     filename=\"leaf.png\"\r\nContent-Type: image/png\r\n\r\n"
                )
                .as_bytes(),
            );
            body.extend_from_slice(bytes);
            body.extend_from_slice(b"\r\n");
        }
        if let Some(text) = symptoms {
            body.extend_from_slice(
                format!("--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"symptoms\"\r\n\r\n")
                    .as_bytes(),
            );
            body.extend_from_slice(text.as_bytes());
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        body
    }

    fn request_with(body: Vec<u8>) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/predict")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    fn app(uploads_dir: std::path::PathBuf) -> Router {
        Router::new()
            .route("/predict", post(predict))
            .with_state(test_state(uploads_dir, None))
    }

    #[tokio::test]
    async fn test_predict_returns_class_and_confidence() {
        let uploads = tempfile::tempdir().unwrap();
        let app = app(uploads.path().to_path_buf());

        let body = multipart_body(Some(&png_bytes()), Some("yellowing edges"));
        let response = app.oneshot(request_with(body)).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

        assert!(json["class"].is_string());
        assert!(json["confidence"].is_number());
        assert_eq!(json["top_5"].as_array().unwrap().len(), 5);
        assert_eq!(json["symptoms"], "yellowing edges");

        // Temp file must be gone
        let leftover = std::fs::read_dir(uploads.path()).unwrap().count();
        assert_eq!(leftover, 0);
    }

    #[tokio::test]
    async fn test_predict_without_file_field() {
        let uploads = tempfile::tempdir().unwrap();
        let app = app(uploads.path().to_path_buf());

        let body = multipart_body(None, Some("wilting"));
        let response = app.oneshot(request_with(body)).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert!(json["error"].as_str().unwrap().contains("file"));
    }

    #[tokio::test]
    async fn test_predict_with_non_image_upload() {
        let uploads = tempfile::tempdir().unwrap();
        let app = app(uploads.path().to_path_buf());

        let body = multipart_body(Some(b"this is not an image"), None);
        let response = app.oneshot(request_with(body)).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        // Cleanup also happens on the error path
        let leftover = std::fs::read_dir(uploads.path()).unwrap().count();
        assert_eq!(leftover, 0);
    }

    #[test]
    fn test_extension_of() {
        assert_eq!(extension_of(Some("leaf.PNG")), "png");
        assert_eq!(extension_of(Some("leaf")), "jpg");
        assert_eq!(extension_of(Some("../../etc/passwd")), "jpg");
        assert_eq!(extension_of(None), "jpg");
    }
}
