//! Runs session effects against a camera and an inference service.

use std::collections::VecDeque;

use chrono::Utc;
use tracing::{debug, instrument};

use super::{Action, Effect, PredictInput, Session};
use crate::capture::{normalize, CameraDevice, CaptureSession, NormalizedImage, Resolution};
use crate::client::{predict_paced, InferenceService};
use crate::config::ClientConfig;
use crate::error::{FreshxError, Result};
use crate::history::Prediction;

/// What was sent with the most recent prediction request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadSummary {
    pub filename: String,
    pub mime: String,
    /// `None` when the original bytes were passed through
    pub dimensions: Option<Resolution>,
}

impl From<&NormalizedImage> for UploadSummary {
    fn from(image: &NormalizedImage) -> Self {
        Self {
            filename: image.filename.clone(),
            mime: image.upload_mime().to_string(),
            dimensions: image.dimensions,
        }
    }
}

/// Drives a [`Session`].
///
/// Owns the open camera session, if any. Dropping the controller releases
/// the camera.
pub struct Controller<S, C> {
    session: Session,
    service: S,
    camera: C,
    config: ClientConfig,
    capture: Option<CaptureSession>,
    last_upload: Option<UploadSummary>,
}

impl<S: InferenceService, C: CameraDevice> Controller<S, C> {
    pub fn new(service: S, camera: C, config: ClientConfig) -> Self {
        let session = Session::new(config.default_model.clone(), Default::default());
        Self {
            session,
            service,
            camera,
            config,
            capture: None,
            last_upload: None,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    pub fn camera(&self) -> &C {
        &self.camera
    }

    /// Take the error behind the current scanner notice.
    pub fn take_error(&mut self) -> Option<FreshxError> {
        self.session.take_error()
    }

    pub fn last_upload(&self) -> Option<&UploadSummary> {
        self.last_upload.as_ref()
    }

    /// Whether a camera stream is currently held.
    pub fn camera_active(&self) -> bool {
        self.capture.as_ref().is_some_and(CaptureSession::is_active)
    }

    /// Apply `action` and run every effect it triggers until the session
    /// settles.
    pub async fn dispatch(&mut self, action: Action) {
        let mut queue = VecDeque::from([action]);
        while let Some(action) = queue.pop_front() {
            for effect in self.session.apply(action) {
                if let Some(next) = self.run(effect).await {
                    queue.push_back(next);
                }
            }
        }
    }

    async fn run(&mut self, effect: Effect) -> Option<Action> {
        match effect {
            Effect::StartCamera { token } => {
                self.stop_camera();
                let resolution = self.config.camera_resolution;
                match CaptureSession::start(&self.camera, resolution).await {
                    Ok(capture) => {
                        self.capture = Some(capture);
                        Some(Action::CameraStarted { token })
                    }
                    Err(error) => Some(Action::CameraFailed { token, error }),
                }
            }
            Effect::StopCamera => {
                self.stop_camera();
                None
            }
            Effect::Predict { token, input } => {
                let outcome = self.predict(input).await;
                Some(Action::PredictResolved {
                    token,
                    outcome,
                    at: Utc::now(),
                })
            }
            Effect::FetchHistory { token } => Some(Action::HistoryResolved {
                token,
                outcome: self.service.fetch_history().await,
            }),
            Effect::Delete { id } => {
                let outcome = self.service.delete_record(&id).await;
                Some(Action::DeleteResolved { id, outcome })
            }
            Effect::Clear => Some(Action::ClearResolved {
                outcome: self.service.clear_history().await,
            }),
        }
    }

    fn stop_camera(&mut self) {
        if let Some(mut capture) = self.capture.take() {
            capture.stop();
        }
    }

    /// Normalize and upload, taking at least the configured minimum time.
    #[instrument(level = "debug", skip_all)]
    async fn predict(&mut self, input: PredictInput) -> Result<Prediction> {
        let source = match input {
            PredictInput::File(source) => source,
            PredictInput::CameraShutter => {
                let mut capture = self.capture.take().ok_or_else(|| {
                    FreshxError::DeviceUnavailable("Camera stream is not active".into())
                })?;
                let still = capture.shutter();
                capture.stop();
                still?
            }
        };

        let image = normalize(source, &self.config.normalize)?;
        debug!(
            filename = %image.filename,
            bytes = image.bytes.len(),
            passthrough = image.is_passthrough(),
            "Uploading image"
        );
        self.last_upload = Some(UploadSummary::from(&image));

        predict_paced(&self.service, &image, self.config.min_predict_duration).await
    }
}

impl<S, C> std::fmt::Debug for Controller<S, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Controller")
            .field("session", &self.session)
            .field("capture", &self.capture)
            .field("last_upload", &self.last_upload)
            .finish_non_exhaustive()
    }
}
