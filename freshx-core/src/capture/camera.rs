//! Camera devices and scoped capture sessions.
//!
//! A [`CaptureSession`] owns the open video stream. Every exit path (explicit
//! stop, shutter, error, drop) stops all tracks so the device handle is never
//! leaked.

use std::io::ErrorKind;
use std::path::PathBuf;

use async_trait::async_trait;
use image::RgbImage;
use tracing::{debug, info, instrument, warn};

use super::{CaptureSource, Resolution};
use crate::error::{FreshxError, Result};

/// Message shown when the camera cannot be opened.
pub const CAMERA_ACCESS_MESSAGE: &str = "Could not access camera. Please check permissions.";

/// A source of live video frames.
#[async_trait]
pub trait CameraDevice: Send + Sync {
    /// Open a stream, asking for `requested` as the ideal resolution.
    ///
    /// Fails with [`FreshxError::PermissionDenied`] or
    /// [`FreshxError::DeviceUnavailable`].
    async fn open(&self, requested: Resolution) -> Result<Box<dyn VideoStream>>;

    /// Human-readable device identifier for logs.
    fn device_id(&self) -> String;
}

/// An open video stream.
pub trait VideoStream: Send {
    /// Grab the frame currently shown by the stream.
    fn grab_frame(&mut self) -> Result<RgbImage>;

    /// Stop every track of the stream. Must be idempotent.
    fn stop_tracks(&mut self);

    fn is_live(&self) -> bool;
}

/// Scoped ownership of an open camera stream.
pub struct CaptureSession {
    device_id: String,
    stream: Box<dyn VideoStream>,
}

impl CaptureSession {
    /// Open `device` and take ownership of its stream.
    #[instrument(level = "debug", skip(device), fields(device = %device.device_id()))]
    pub async fn start(device: &dyn CameraDevice, requested: Resolution) -> Result<Self> {
        let stream = device.open(requested).await.map_err(|e| {
            warn!(error = %e, "Camera start failed");
            e
        })?;

        info!(requested = %requested, "Camera stream started");
        Ok(Self {
            device_id: device.device_id(),
            stream,
        })
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    pub fn is_active(&self) -> bool {
        self.stream.is_live()
    }

    /// Draw the current frame and encode it as a still.
    pub fn shutter(&mut self) -> Result<CaptureSource> {
        if !self.is_active() {
            return Err(FreshxError::DeviceUnavailable(
                "Camera stream is not active".into(),
            ));
        }

        let frame = self.stream.grab_frame()?;
        debug!(
            width = frame.width(),
            height = frame.height(),
            "Captured camera frame"
        );
        CaptureSource::from_frame(frame)
    }

    /// Stop all tracks.
    pub fn stop(&mut self) {
        if self.stream.is_live() {
            self.stream.stop_tracks();
            info!(device = %self.device_id, "Camera stream stopped");
        }
    }
}

impl Drop for CaptureSession {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for CaptureSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureSession")
            .field("device_id", &self.device_id)
            .field("active", &self.is_active())
            .finish()
    }
}

/// Camera backed by a still image that an external grabber keeps refreshing
/// (e.g. `fswebcam --loop`). Each shutter reads the file anew.
#[derive(Debug, Clone)]
pub struct SnapshotCamera {
    path: PathBuf,
}

impl SnapshotCamera {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl CameraDevice for SnapshotCamera {
    async fn open(&self, requested: Resolution) -> Result<Box<dyn VideoStream>> {
        let metadata = tokio::fs::metadata(&self.path)
            .await
            .map_err(|e| map_device_error(&self.path, e))?;

        if !metadata.is_file() {
            return Err(FreshxError::DeviceUnavailable(format!(
                "{} is not a frame file",
                self.path.display()
            )));
        }

        // Open once up front so permission problems surface at start time.
        std::fs::File::open(&self.path).map_err(|e| map_device_error(&self.path, e))?;

        debug!(path = %self.path.display(), requested = %requested, "Snapshot camera opened");
        Ok(Box::new(SnapshotStream {
            path: self.path.clone(),
            live: true,
        }))
    }

    fn device_id(&self) -> String {
        format!("snapshot:{}", self.path.display())
    }
}

fn map_device_error(path: &std::path::Path, error: std::io::Error) -> FreshxError {
    match error.kind() {
        ErrorKind::PermissionDenied => {
            FreshxError::PermissionDenied(format!("{}: {error}", path.display()))
        }
        _ => FreshxError::DeviceUnavailable(format!("{}: {error}", path.display())),
    }
}

struct SnapshotStream {
    path: PathBuf,
    live: bool,
}

impl VideoStream for SnapshotStream {
    fn grab_frame(&mut self) -> Result<RgbImage> {
        let frame = image::open(&self.path).map_err(|e| {
            FreshxError::DeviceUnavailable(format!(
                "Failed to read frame from {}: {e}",
                self.path.display()
            ))
        })?;
        Ok(frame.to_rgb8())
    }

    fn stop_tracks(&mut self) {
        self.live = false;
    }

    fn is_live(&self) -> bool {
        self.live
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::{CaptureKind, MockCamera, MockCameraFailure};

    #[tokio::test]
    async fn test_session_shutter_produces_jpeg() {
        let camera = MockCamera::default();
        let mut session = CaptureSession::start(&camera, Resolution::CAMERA_DEFAULT)
            .await
            .unwrap();

        let source = session.shutter().unwrap();
        assert_eq!(source.kind, CaptureKind::LiveCameraFrame);
        assert_eq!(source.mime, "image/jpeg");

        let decoded = image::load_from_memory(&source.bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (400, 300));
    }

    #[tokio::test]
    async fn test_session_drop_releases_device() {
        let camera = MockCamera::default();
        {
            let session = CaptureSession::start(&camera, Resolution::CAMERA_DEFAULT)
                .await
                .unwrap();
            assert!(session.is_active());
            assert_eq!(camera.live_streams(), 1);
        }
        assert_eq!(camera.live_streams(), 0);
    }

    #[tokio::test]
    async fn test_session_stop_is_idempotent() {
        let camera = MockCamera::default();
        let mut session = CaptureSession::start(&camera, Resolution::CAMERA_DEFAULT)
            .await
            .unwrap();

        session.stop();
        session.stop();
        assert!(!session.is_active());
        assert_eq!(camera.live_streams(), 0);
        assert!(matches!(
            session.shutter(),
            Err(FreshxError::DeviceUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_permission_denied_leaves_nothing_open() {
        let camera = MockCamera::failing(MockCameraFailure::PermissionDenied);
        let result = CaptureSession::start(&camera, Resolution::CAMERA_DEFAULT).await;
        assert!(matches!(result, Err(FreshxError::PermissionDenied(_))));
        assert_eq!(camera.live_streams(), 0);
    }

    #[tokio::test]
    async fn test_snapshot_camera_missing_file() {
        let camera = SnapshotCamera::new("/no/such/frame.jpg");
        let result = camera.open(Resolution::CAMERA_DEFAULT).await;
        assert!(matches!(result, Err(FreshxError::DeviceUnavailable(_))));
    }

    #[tokio::test]
    async fn test_snapshot_camera_reads_frame() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame.png");
        RgbImage::from_pixel(64, 48, image::Rgb([90, 160, 30]))
            .save(&path)
            .unwrap();

        let camera = SnapshotCamera::new(&path);
        let mut session = CaptureSession::start(&camera, Resolution::CAMERA_DEFAULT)
            .await
            .unwrap();
        let source = session.shutter().unwrap();
        let decoded = image::load_from_memory(&source.bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (64, 48));
        assert!(session.device_id().starts_with("snapshot:"));
    }
}
