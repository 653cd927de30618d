//! FreshX Core - client library for the FreshX fruit-freshness classifier
//!
//! This crate turns a camera frame or an image file into a freshness verdict
//! from the remote inference service, and keeps a local, optimistically
//! updated view of the prediction history.
//!
//! # Features
//!
//! - Capture from files or live cameras, with scoped camera sessions that
//!   always release the device
//! - Aspect-preserving normalization to at most 400x400 before upload
//! - Multipart upload to `/predict` and history management over `/history`
//! - Optimistic history with reconciliation against the server copy
//! - Search, status filtering, analytics and CSV export of the history
//! - A scanner state machine whose stale async responses are discarded
//!
//! # Example
//!
//! ```no_run
//! use freshx_core::{
//!     normalize, CaptureSource, ClientConfig, HttpInferenceClient, InferenceService,
//! };
//!
//! # async fn example() -> freshx_core::Result<()> {
//! let config = ClientConfig::from_env()?;
//! let client = HttpInferenceClient::new(config.clone())?;
//!
//! let source = CaptureSource::from_path("banana.jpg")?;
//! let image = normalize(source, &config.normalize)?;
//! let prediction = client.predict(&image).await?;
//! println!("{} ({:.1}%)", prediction.label, prediction.confidence);
//! # Ok(())
//! # }
//! ```

pub mod capture;
pub mod client;
pub mod config;
pub mod error;
pub mod history;
pub mod session;

// Re-export main types for convenience
pub use capture::{
    normalize, CameraDevice, CaptureKind, CaptureSession, CaptureSource, MockCamera,
    NormalizeOptions, NormalizedImage, Resolution, SnapshotCamera,
};
pub use client::{predict_paced, HttpInferenceClient, InferenceService, MockInferenceService};
pub use config::ClientConfig;
pub use error::{FreshxError, Result};
pub use history::{
    to_csv, HistoryAnalytics, HistoryCollection, HistoryFilter, Prediction, PredictionRecord,
    RecordId, ReconcilePolicy, StatusFilter,
};
pub use session::{Action, Controller, Session, UploadSummary};

#[cfg(test)]
mod tests {
    use super::*;

    /// Integration test: capture, normalize, predict, then reconcile the
    /// optimistic record with the stored history.
    #[tokio::test]
    async fn test_full_scan_workflow() {
        let service = MockInferenceService::default();

        let frame = image::RgbImage::from_pixel(1280, 720, image::Rgb([90, 160, 30]));
        let source = CaptureSource::from_frame(frame).expect("Failed to encode frame");
        let image = normalize(source, &NormalizeOptions::default()).expect("Failed to normalize");
        assert_eq!(image.dimensions, Some(Resolution::new(400, 225)));

        let prediction = service.predict(&image).await.expect("Prediction failed");

        let mut history = HistoryCollection::default();
        history.record_optimistic(PredictionRecord::optimistic(
            RecordId::temporary(chrono::Utc::now().timestamp_millis()),
            image.filename.clone(),
            &prediction,
            chrono::Utc::now(),
            config::DEFAULT_MODEL,
        ));

        let stored = service.fetch_history().await.expect("History fetch failed");
        history.reconcile(stored, ReconcilePolicy::MergeOptimistic);

        assert_eq!(history.len(), 1, "Optimistic record should be confirmed");
        assert!(!history.first().unwrap().id.is_temporary());
    }
}
