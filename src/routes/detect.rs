use crate::bounding_box::Prediction;
use crate::prediction::InferenceError;
use crate::server::SharedState;
use crate::store::{self, StoreError};
use axum::{
    extract::{multipart::MultipartError, Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use serde::Serialize;
use std::time::Instant;
use thiserror::Error;
use tracing::instrument;

#[derive(Error, Debug)]
pub enum DetectImageError {
    #[error("multipart upload failed: {0}")]
    Multipart(#[from] MultipartError),
    #[error("no image field in upload")]
    MissingImage,
    #[error("uploaded file is not a decodable image: {0}")]
    ImageDecode(#[from] image::ImageError),
    #[error("inference failed: {0}")]
    Inference(#[from] InferenceError),
    #[error("failed to encode annotated image: {0}")]
    AnnotatedEncode(#[from] StoreError),
}

impl IntoResponse for DetectImageError {
    fn into_response(self) -> Response {
        let status = match self {
            DetectImageError::Multipart(_)
            | DetectImageError::MissingImage
            | DetectImageError::ImageDecode(_) => StatusCode::BAD_REQUEST,
            DetectImageError::Inference(_) | DetectImageError::AnnotatedEncode(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (status, self.to_string()).into_response()
    }
}

#[derive(Debug, Serialize)]
pub struct DetectResponse {
    pub annotated_image: String,
    pub predictions: Vec<Prediction>,
}

#[instrument(skip(state, multipart))]
pub async fn detect_image(
    State(state): State<SharedState>,
    mut multipart: Multipart,
) -> Result<Json<DetectResponse>, DetectImageError> {
    state.metrics.record_request("detect");

    let mut image_data: Option<Bytes> = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some("image") {
            image_data = Some(field.bytes().await?);
        }
    }
    let image_data = image_data.ok_or(DetectImageError::MissingImage)?;

    let image = image::load_from_memory(&image_data)?;

    // The model sees the exact bytes the user uploaded.
    let started = Instant::now();
    let predictions = state.detection_service.detect(&image_data).await?;
    state
        .metrics
        .record_inference_duration(started.elapsed().as_millis() as u64, "detect");

    let annotated = state.annotator.annotate(&image, &predictions);
    let annotated_image = store::encode_image(&annotated)?;

    Ok(Json(DetectResponse {
        annotated_image,
        predictions,
    }))
}
