//! In-memory inference service for testing.
//!
//! Behaves like the hosted service: a successful prediction is stored
//! server-side (unless persistence is switched off) with a durable id, and
//! history is returned newest first.

use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;

use super::InferenceService;
use crate::capture::NormalizedImage;
use crate::config::DEFAULT_MODEL;
use crate::error::{
    FreshxError, Result, HISTORY_CONNECT_MESSAGE, PREDICT_CONNECT_MESSAGE,
    PREDICT_FALLBACK_MESSAGE,
};
use crate::history::{Prediction, PredictionRecord, RecordId};

#[derive(Debug)]
struct MockState {
    prediction: Prediction,
    predict_error: Option<Option<String>>,
    history_status: Option<u16>,
    offline: bool,
    persist: bool,
    reject_deletes: bool,
    records: Vec<PredictionRecord>,
    next_id: u64,
    uploads: Vec<NormalizedImage>,
}

/// Scriptable fake of the remote service.
#[derive(Debug)]
pub struct MockInferenceService {
    state: Mutex<MockState>,
}

impl Default for MockInferenceService {
    fn default() -> Self {
        Self::new(Prediction {
            label: "Fresh Banana".into(),
            confidence: 92.3,
            is_fresh: true,
            model_used: Some(DEFAULT_MODEL.into()),
        })
    }
}

impl MockInferenceService {
    /// Service answering every upload with `prediction`.
    pub fn new(prediction: Prediction) -> Self {
        Self {
            state: Mutex::new(MockState {
                prediction,
                predict_error: None,
                history_status: None,
                offline: false,
                persist: true,
                reject_deletes: false,
                records: Vec::new(),
                next_id: 1,
                uploads: Vec::new(),
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        // A panicking test thread must not hide the state from the others.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn set_prediction(&self, prediction: Prediction) {
        self.state().prediction = prediction;
    }

    /// Make `/predict` fail with an `{error}` body (`None` omits the field).
    pub fn fail_predictions(&self, error: Option<&str>) {
        self.state().predict_error = Some(error.map(str::to_string));
    }

    /// Make `GET /history` answer with a non-success status.
    pub fn fail_history(&self, status: u16) {
        self.state().history_status = Some(status);
    }

    /// Simulate an unreachable service.
    pub fn set_offline(&self, offline: bool) {
        self.state().offline = offline;
    }

    /// Whether successful predictions are written to the store.
    pub fn set_persist(&self, persist: bool) {
        self.state().persist = persist;
    }

    pub fn reject_deletes(&self, reject: bool) {
        self.state().reject_deletes = reject;
    }

    /// Seed the server-side store (newest first).
    pub fn seed(&self, records: Vec<PredictionRecord>) {
        self.state().records = records;
    }

    pub fn stored(&self) -> Vec<PredictionRecord> {
        self.state().records.clone()
    }

    /// Images received by `/predict`, oldest first.
    pub fn uploads(&self) -> Vec<NormalizedImage> {
        self.state().uploads.clone()
    }
}

#[async_trait]
impl InferenceService for MockInferenceService {
    async fn predict(&self, image: &NormalizedImage) -> Result<Prediction> {
        let mut state = self.state();
        if state.offline {
            return Err(FreshxError::transport(PREDICT_CONNECT_MESSAGE));
        }

        state.uploads.push(image.clone());

        if let Some(error) = &state.predict_error {
            return Err(FreshxError::ValidationFailure(
                error
                    .clone()
                    .unwrap_or_else(|| PREDICT_FALLBACK_MESSAGE.to_string()),
            ));
        }

        let prediction = state.prediction.clone();
        if state.persist {
            let id = RecordId::new(format!("{:024x}", state.next_id));
            state.next_id += 1;
            let record = PredictionRecord {
                id,
                filename: image.filename.clone(),
                label: prediction.label.clone(),
                confidence: prediction.confidence,
                is_fresh: prediction.is_fresh,
                timestamp: Utc::now().naive_utc().format("%Y-%m-%dT%H:%M:%S%.6f").to_string(),
                model_used: prediction.model_or(DEFAULT_MODEL).to_string(),
            };
            state.records.insert(0, record);
        }

        Ok(prediction)
    }

    async fn fetch_history(&self) -> Result<Vec<PredictionRecord>> {
        let state = self.state();
        if state.offline {
            return Err(FreshxError::transport(HISTORY_CONNECT_MESSAGE));
        }
        if let Some(status) = state.history_status {
            return Err(FreshxError::ServiceUnavailable { status });
        }
        Ok(state.records.clone())
    }

    async fn delete_record(&self, id: &RecordId) -> Result<()> {
        let mut state = self.state();
        if state.offline {
            return Err(FreshxError::transport(HISTORY_CONNECT_MESSAGE));
        }
        if state.reject_deletes {
            return Err(FreshxError::Rejected { status: 500 });
        }

        let index = state
            .records
            .iter()
            .position(|r| &r.id == id)
            .ok_or(FreshxError::Rejected { status: 404 })?;
        state.records.remove(index);
        Ok(())
    }

    async fn clear_history(&self) -> Result<()> {
        let mut state = self.state();
        if state.offline {
            return Err(FreshxError::transport(HISTORY_CONNECT_MESSAGE));
        }
        if state.reject_deletes {
            return Err(FreshxError::Rejected { status: 500 });
        }
        state.records.clear();
        Ok(())
    }
}
