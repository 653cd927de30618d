//! HTTP client for the inference service.

use std::time::Instant;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};
use url::Url;

use super::InferenceService;
use crate::capture::NormalizedImage;
use crate::config::ClientConfig;
use crate::error::{
    FreshxError, Result, HISTORY_CONNECT_MESSAGE, PREDICT_CONNECT_MESSAGE,
    PREDICT_FALLBACK_MESSAGE,
};
use crate::history::{Prediction, PredictionRecord, RecordId};

/// Body of a failed `/predict` call.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
}

/// reqwest-backed [`InferenceService`].
pub struct HttpInferenceClient {
    client: Client,
    config: ClientConfig,
}

impl HttpInferenceClient {
    /// Create a client for the configured base URL.
    #[instrument(level = "debug", skip_all, fields(api_url = %config.api_url))]
    pub fn new(config: ClientConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| FreshxError::ConfigError(format!("Failed to create HTTP client: {e}")))?;

        debug!("Inference client created");
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn record_url(&self, id: &RecordId) -> Result<Url> {
        let mut url = self.config.endpoint("history")?;
        url.path_segments_mut()
            .map_err(|_| FreshxError::ConfigError("API URL cannot be a base".into()))?
            .push(id.as_str());
        Ok(url)
    }

    async fn send_delete(&self, url: Url) -> Result<()> {
        let start = Instant::now();
        let response = self.client.delete(url).send().await.map_err(|e| {
            warn!(error = %e, "Delete request failed");
            FreshxError::transport(HISTORY_CONNECT_MESSAGE)
        })?;

        let status = response.status();
        let latency_ms = start.elapsed().as_millis() as u64;
        if !status.is_success() {
            warn!(status = %status, latency_ms, "Delete rejected");
            return Err(FreshxError::Rejected {
                status: status.as_u16(),
            });
        }

        debug!(status = %status, latency_ms, "Delete accepted");
        Ok(())
    }
}

#[async_trait]
impl InferenceService for HttpInferenceClient {
    #[instrument(
        level = "info",
        skip(self, image),
        fields(filename = %image.filename, bytes = image.bytes.len())
    )]
    async fn predict(&self, image: &NormalizedImage) -> Result<Prediction> {
        let url = self.config.endpoint("predict")?;
        let start = Instant::now();

        let part = Part::bytes(image.bytes.clone())
            .file_name(image.filename.clone())
            .mime_str(image.upload_mime())
            .map_err(|e| FreshxError::ValidationFailure(format!("Invalid MIME type: {e}")))?;
        let form = Form::new().part("file", part);

        let response = self
            .client
            .post(url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "Predict request failed");
                FreshxError::transport(PREDICT_CONNECT_MESSAGE)
            })?;

        let status = response.status();
        let body = response.bytes().await.map_err(|e| {
            warn!(error = %e, "Failed to read predict response");
            FreshxError::transport(PREDICT_CONNECT_MESSAGE)
        })?;
        let latency_ms = start.elapsed().as_millis() as u64;

        if !status.is_success() {
            let message = serde_json::from_slice::<ErrorBody>(&body)
                .ok()
                .and_then(|b| b.error)
                .unwrap_or_else(|| PREDICT_FALLBACK_MESSAGE.to_string());
            warn!(status = %status, latency_ms, error = %message, "Prediction rejected");
            return Err(FreshxError::ValidationFailure(message));
        }

        let prediction: Prediction = serde_json::from_slice(&body).map_err(|e| {
            warn!(error = %e, "Malformed prediction response");
            FreshxError::ValidationFailure(format!("Malformed prediction response: {e}"))
        })?;

        validate_prediction(&prediction)?;

        info!(
            label = %prediction.label,
            confidence = prediction.confidence,
            is_fresh = prediction.is_fresh,
            latency_ms,
            "Prediction received"
        );
        Ok(prediction)
    }

    #[instrument(level = "info", skip(self))]
    async fn fetch_history(&self) -> Result<Vec<PredictionRecord>> {
        let url = self.config.endpoint("history")?;
        let start = Instant::now();

        let response = self.client.get(url).send().await.map_err(|e| {
            warn!(error = %e, "History request failed");
            FreshxError::transport(HISTORY_CONNECT_MESSAGE)
        })?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = %status, "History unavailable");
            return Err(FreshxError::ServiceUnavailable {
                status: status.as_u16(),
            });
        }

        let records: Vec<PredictionRecord> = response.json().await.map_err(|e| {
            warn!(error = %e, "Failed to parse history response");
            FreshxError::transport(HISTORY_CONNECT_MESSAGE)
        })?;

        debug!(
            records = records.len(),
            latency_ms = start.elapsed().as_millis() as u64,
            "History fetched"
        );
        Ok(records)
    }

    #[instrument(level = "info", skip(self), fields(id = %id))]
    async fn delete_record(&self, id: &RecordId) -> Result<()> {
        let url = self.record_url(id)?;
        self.send_delete(url).await
    }

    #[instrument(level = "info", skip(self))]
    async fn clear_history(&self) -> Result<()> {
        let url = self.config.endpoint("history")?;
        self.send_delete(url).await
    }
}

/// Reject payloads outside the documented ranges.
fn validate_prediction(prediction: &Prediction) -> Result<()> {
    if !prediction.confidence.is_finite() || !(0.0..=100.0).contains(&prediction.confidence) {
        return Err(FreshxError::ValidationFailure(format!(
            "Confidence {} is outside 0..=100",
            prediction.confidence
        )));
    }
    Ok(())
}
