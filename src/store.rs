use crate::bounding_box::Prediction;
use crate::config::DatabaseConfig;
use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use image::{DynamicImage, ImageFormat, RgbImage};
use reqwest::{header, StatusCode};
use serde::{Deserialize, Serialize};
use std::io::Cursor;
use thiserror::Error;
use tracing::instrument;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("database returned {status}: {body}")]
    Endpoint { status: StatusCode, body: String },
    #[error("image codec failure: {0}")]
    Image(#[from] image::ImageError),
    #[error("stored image is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),
}

/// One persisted unit: the annotated image (base64 JPEG text), the raw
/// prediction list, and a user description. The original unannotated image
/// is never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredRecord {
    pub image: String,
    pub predictions: Vec<Prediction>,
    pub description: String,
}

#[async_trait]
pub trait RecordStore: Send + Sync + 'static {
    async fn insert(&self, record: &StoredRecord) -> Result<(), StoreError>;
    async fn fetch(&self, filter: Option<&str>) -> Result<Vec<StoredRecord>, StoreError>;
}

/// PostgREST-over-HTTP store against a single fixed table.
pub struct SupabaseStore {
    client: reqwest::Client,
    table_url: String,
    api_key: String,
}

impl SupabaseStore {
    pub fn new(config: &DatabaseConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            table_url: config.get_table_url(),
            api_key: config.api_key.clone(),
        }
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .header("apikey", &self.api_key)
            .header(header::AUTHORIZATION, format!("Bearer {}", self.api_key))
    }
}

#[async_trait]
impl RecordStore for SupabaseStore {
    #[instrument(skip(self, record))]
    async fn insert(&self, record: &StoredRecord) -> Result<(), StoreError> {
        let response = self
            .authorized(self.client.post(&self.table_url))
            .header("Prefer", "return=minimal")
            .json(record)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Endpoint { status, body });
        }

        Ok(())
    }

    #[instrument(skip(self))]
    async fn fetch(&self, filter: Option<&str>) -> Result<Vec<StoredRecord>, StoreError> {
        let mut request = self
            .authorized(self.client.get(&self.table_url))
            .query(&[("select", "*")]);

        if let Some(filter) = filter {
            let (column, value) = split_filter(filter);
            request = request.query(&[(column, value)]);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Endpoint { status, body });
        }

        Ok(response.json::<Vec<StoredRecord>>().await?)
    }
}

/// Splits a `field=value` expression on the first `=`. Both halves go to the
/// remote query engine verbatim; filter semantics are entirely its problem.
fn split_filter(filter: &str) -> (&str, &str) {
    match filter.split_once('=') {
        Some((column, value)) => (column, value),
        None => (filter, ""),
    }
}

pub fn encode_image(image: &RgbImage) -> Result<String, StoreError> {
    let mut jpeg = Vec::new();
    image.write_to(&mut Cursor::new(&mut jpeg), ImageFormat::Jpeg)?;
    Ok(general_purpose::STANDARD.encode(&jpeg))
}

pub fn decode_image(encoded: &str) -> Result<DynamicImage, StoreError> {
    let bytes = general_purpose::STANDARD.decode(encoded)?;
    Ok(image::load_from_memory(&bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn filter_splits_on_first_equals_only() {
        assert_eq!(
            split_filter("description=eq.red sleeve"),
            ("description", "eq.red sleeve")
        );
        assert_eq!(split_filter("class=neckline"), ("class", "neckline"));
        assert_eq!(split_filter("a=b=c"), ("a", "b=c"));
        assert_eq!(split_filter("garbage"), ("garbage", ""));
    }

    #[test]
    fn stored_representation_round_trips() {
        let image = RgbImage::from_fn(16, 16, |x, y| Rgb([(x * 16) as u8, (y * 16) as u8, 128]));

        let encoded = encode_image(&image).unwrap();

        // The base64 layer is lossless over the stored JPEG bytes.
        let jpeg = general_purpose::STANDARD.decode(&encoded).unwrap();
        assert_eq!(general_purpose::STANDARD.encode(&jpeg), encoded);

        let decoded = decode_image(&encoded).unwrap();
        assert_eq!(decoded.to_rgb8().dimensions(), (16, 16));
    }

    #[test]
    fn decode_rejects_non_base64_text() {
        assert!(matches!(
            decode_image("not base64!!!"),
            Err(StoreError::Base64(_))
        ));
    }

    #[test]
    fn record_round_trips_through_json() {
        let record = StoredRecord {
            image: "aGVsbG8=".to_string(),
            predictions: vec![Prediction {
                x: 100.0,
                y: 100.0,
                width: 50.0,
                height: 80.0,
                class_label: "sleeve".to_string(),
                confidence: 0.92,
            }],
            description: "red sleeve test".to_string(),
        };

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["description"], "red sleeve test");
        assert_eq!(value["predictions"][0]["class"], "sleeve");

        let back: StoredRecord = serde_json::from_value(value).unwrap();
        assert_eq!(back, record);
    }
}
