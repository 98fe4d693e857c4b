use crate::bounding_box::Prediction;
use crate::config::InferenceConfig;
use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use reqwest::{header, StatusCode};
use serde::Deserialize;
use thiserror::Error;
use tracing::instrument;

#[derive(Error, Debug)]
pub enum InferenceError {
    #[error("inference request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("inference endpoint returned {status}: {body}")]
    Endpoint { status: StatusCode, body: String },
}

#[derive(Debug, Deserialize)]
struct InferenceResponse {
    predictions: Vec<Prediction>,
}

#[async_trait]
pub trait DetectionService: Send + Sync + 'static {
    async fn detect(&self, image_data: &[u8]) -> Result<Vec<Prediction>, InferenceError>;
}

/// Client for the hosted detection model. One blocking (awaited) call per
/// upload; failures propagate to the route untouched.
pub struct RemoteDetectionService {
    client: reqwest::Client,
    model_url: String,
    api_key: String,
}

impl RemoteDetectionService {
    pub fn new(config: &InferenceConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            model_url: config.get_model_url(),
            api_key: config.api_key.clone(),
        }
    }
}

#[async_trait]
impl DetectionService for RemoteDetectionService {
    #[instrument(skip(self, image_data))]
    async fn detect(&self, image_data: &[u8]) -> Result<Vec<Prediction>, InferenceError> {
        // The endpoint takes the image as a base64 form body.
        let body = general_purpose::STANDARD.encode(image_data);

        let response = self
            .client
            .post(&self.model_url)
            .query(&[("api_key", self.api_key.as_str())])
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(InferenceError::Endpoint { status, body });
        }

        let parsed = response.json::<InferenceResponse>().await?;
        tracing::debug!("model returned {} predictions", parsed.predictions.len());

        Ok(parsed.predictions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_prediction_payload() {
        let raw = r#"{
            "time": 0.07,
            "image": {"width": 640, "height": 480},
            "predictions": [
                {"x": 100.0, "y": 100.0, "width": 50.0, "height": 80.0,
                 "confidence": 0.92, "class": "sleeve", "class_id": 0},
                {"x": 320.0, "y": 60.0, "width": 120.0, "height": 40.0,
                 "confidence": 0.81, "class": "neckline", "class_id": 1}
            ]
        }"#;

        let parsed: InferenceResponse = serde_json::from_str(raw).unwrap();

        assert_eq!(parsed.predictions.len(), 2);
        assert_eq!(parsed.predictions[0].class_label, "sleeve");
        assert_eq!(parsed.predictions[1].class_label, "neckline");
    }

    #[test]
    fn parses_empty_prediction_list() {
        let raw = r#"{"time": 0.05, "predictions": []}"#;

        let parsed: InferenceResponse = serde_json::from_str(raw).unwrap();

        assert!(parsed.predictions.is_empty());
    }
}
