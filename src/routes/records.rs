use crate::bounding_box::Prediction;
use crate::server::SharedState;
use crate::store::{self, RecordStore, StoredRecord};
use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

#[derive(Debug, Deserialize)]
pub struct SaveRequest {
    pub image: String,
    pub predictions: Vec<Prediction>,
    pub description: String,
}

#[derive(Debug, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SaveStatus {
    Saved,
    Rejected,
    Error,
}

#[derive(Debug, Serialize)]
pub struct SaveResponse {
    pub status: SaveStatus,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub records: Vec<StoredRecord>,
    pub error: Option<String>,
}

#[instrument(skip(state, request))]
pub async fn save_record(
    State(state): State<SharedState>,
    Json(request): Json<SaveRequest>,
) -> Json<SaveResponse> {
    state.metrics.record_request("save_record");

    let response = handle_save(state.record_store.as_ref(), request).await;
    if response.status == SaveStatus::Saved {
        state.metrics.record_record_saved();
    }

    Json(response)
}

// Store and encoding failures stay in here: they are logged, turned into an
// inline message, and never propagate to the framework.
async fn handle_save(record_store: &dyn RecordStore, request: SaveRequest) -> SaveResponse {
    if request.description.trim().is_empty() {
        return SaveResponse {
            status: SaveStatus::Rejected,
            message: "Please provide a description to save the data.".to_string(),
        };
    }

    // What goes into the table must come back out as a displayable image.
    if let Err(e) = store::decode_image(&request.image) {
        tracing::error!("rejecting save with undecodable image: {e}");
        return SaveResponse {
            status: SaveStatus::Error,
            message: format!("Error saving data: {e}"),
        };
    }

    let record = StoredRecord {
        image: request.image,
        predictions: request.predictions,
        description: request.description,
    };

    match record_store.insert(&record).await {
        Ok(()) => SaveResponse {
            status: SaveStatus::Saved,
            message: "Data saved successfully.".to_string(),
        },
        Err(e) => {
            tracing::error!("failed to save record: {e}");
            SaveResponse {
                status: SaveStatus::Error,
                message: format!("Error saving data: {e}"),
            }
        }
    }
}

#[instrument(skip(state))]
pub async fn search_records(
    State(state): State<SharedState>,
    Query(params): Query<SearchParams>,
) -> Json<SearchResponse> {
    state.metrics.record_request("search_records");
    state.metrics.record_search(params.q.is_some());

    Json(handle_search(state.record_store.as_ref(), params.q.as_deref()).await)
}

async fn handle_search(record_store: &dyn RecordStore, query: Option<&str>) -> SearchResponse {
    let filter = query.map(str::trim).filter(|q| !q.is_empty());

    match record_store.fetch(filter).await {
        Ok(records) => SearchResponse {
            records,
            error: None,
        },
        Err(e) => {
            tracing::error!("failed to search records: {e}");
            SearchResponse {
                records: Vec::new(),
                error: Some(format!("Error retrieving data: {e}")),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::StoreError;
    use async_trait::async_trait;
    use image::{Rgb, RgbImage};
    use reqwest::StatusCode;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingStore {
        inserts: AtomicUsize,
        fetched_filters: Mutex<Vec<Option<String>>>,
        fail: bool,
    }

    impl RecordingStore {
        fn failing() -> Self {
            Self {
                fail: true,
                ..Self::default()
            }
        }

        fn remote_error() -> StoreError {
            StoreError::Endpoint {
                status: StatusCode::BAD_REQUEST,
                body: "unexpected token".to_string(),
            }
        }
    }

    #[async_trait]
    impl RecordStore for RecordingStore {
        async fn insert(&self, _record: &StoredRecord) -> Result<(), StoreError> {
            self.inserts.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(Self::remote_error());
            }
            Ok(())
        }

        async fn fetch(&self, filter: Option<&str>) -> Result<Vec<StoredRecord>, StoreError> {
            self.fetched_filters
                .lock()
                .unwrap()
                .push(filter.map(str::to_string));
            if self.fail {
                return Err(Self::remote_error());
            }
            Ok(vec![StoredRecord {
                image: "aGVsbG8=".to_string(),
                predictions: Vec::new(),
                description: "red sleeve test".to_string(),
            }])
        }
    }

    fn save_request(description: &str) -> SaveRequest {
        let image = RgbImage::from_pixel(4, 4, Rgb([200, 30, 30]));
        SaveRequest {
            image: store::encode_image(&image).unwrap(),
            predictions: Vec::new(),
            description: description.to_string(),
        }
    }

    #[tokio::test]
    async fn empty_description_is_rejected_before_any_write() {
        let record_store = RecordingStore::default();

        let response = handle_save(&record_store, save_request("   ")).await;

        assert_eq!(response.status, SaveStatus::Rejected);
        assert_eq!(record_store.inserts.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn undecodable_image_is_caught_before_any_write() {
        let record_store = RecordingStore::default();
        let mut request = save_request("red sleeve test");
        request.image = "not an image".to_string();

        let response = handle_save(&record_store, request).await;

        assert_eq!(response.status, SaveStatus::Error);
        assert_eq!(record_store.inserts.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn save_with_description_inserts_one_record() {
        let record_store = RecordingStore::default();

        let response = handle_save(&record_store, save_request("red sleeve test")).await;

        assert_eq!(response.status, SaveStatus::Saved);
        assert_eq!(record_store.inserts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn save_failure_is_caught_and_reported() {
        let record_store = RecordingStore::failing();

        let response = handle_save(&record_store, save_request("red sleeve test")).await;

        assert_eq!(response.status, SaveStatus::Error);
        assert!(response.message.contains("Error saving data"));
    }

    #[tokio::test]
    async fn blank_query_fetches_everything() {
        let record_store = RecordingStore::default();

        let response = handle_search(&record_store, Some("   ")).await;

        assert_eq!(response.records.len(), 1);
        assert!(response.error.is_none());
        assert_eq!(*record_store.fetched_filters.lock().unwrap(), vec![None]);
    }

    #[tokio::test]
    async fn query_is_passed_through_to_the_store() {
        let record_store = RecordingStore::default();

        handle_search(&record_store, Some("description=eq.red sleeve test")).await;

        assert_eq!(
            *record_store.fetched_filters.lock().unwrap(),
            vec![Some("description=eq.red sleeve test".to_string())]
        );
    }

    #[tokio::test]
    async fn search_failure_returns_empty_list_with_message() {
        let record_store = RecordingStore::failing();

        let response = handle_search(&record_store, Some("class=neckline")).await;

        assert!(response.records.is_empty());
        assert!(response
            .error
            .as_deref()
            .unwrap()
            .contains("Error retrieving data"));
    }
}
