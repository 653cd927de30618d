//! Inference service clients.
//!
//! The remote service classifies uploads (`POST /predict`) and keeps the
//! prediction history (`GET /history`, `DELETE /history[/{id}]`). Every call
//! is a single attempt; failures are reported to the caller, never retried.

mod http;
mod mock;

pub use http::HttpInferenceClient;
pub use mock::MockInferenceService;

use std::time::Duration;

use async_trait::async_trait;

use crate::capture::NormalizedImage;
use crate::error::Result;
use crate::history::{Prediction, PredictionRecord, RecordId};

/// Remote inference and history store.
///
/// Implementations must be thread-safe (`Send + Sync`).
#[async_trait]
pub trait InferenceService: Send + Sync {
    /// Upload an image for classification.
    async fn predict(&self, image: &NormalizedImage) -> Result<Prediction>;

    /// Fetch stored history, newest first.
    async fn fetch_history(&self) -> Result<Vec<PredictionRecord>>;

    /// Delete one stored record.
    async fn delete_record(&self, id: &RecordId) -> Result<()>;

    /// Delete every stored record.
    async fn clear_history(&self) -> Result<()>;
}

/// Upload `image`, resolving no sooner than `min_duration` after the call.
///
/// The wait runs concurrently with the request; failures are also held back
/// until the minimum has elapsed.
pub async fn predict_paced<S>(
    service: &S,
    image: &NormalizedImage,
    min_duration: Duration,
) -> Result<Prediction>
where
    S: InferenceService + ?Sized,
{
    let (_, outcome) = tokio::join!(tokio::time::sleep(min_duration), service.predict(image));
    outcome
}
