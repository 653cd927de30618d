//! Image capture pipeline.
//!
//! Acquires a still image from a file selection or a live camera, normalizes
//! it to bounded dimensions and packages it for upload.
//!
//! ```no_run
//! use freshx_core::capture::{normalize, CaptureSource, NormalizeOptions};
//!
//! # fn example() -> freshx_core::Result<()> {
//! let source = CaptureSource::from_path("banana.jpg")?;
//! let image = normalize(source, &NormalizeOptions::default())?;
//! assert!(image.bytes.len() > 0);
//! # Ok(())
//! # }
//! ```

mod camera;
mod mock;
mod normalize;

pub use camera::{CameraDevice, CaptureSession, SnapshotCamera, VideoStream, CAMERA_ACCESS_MESSAGE};
pub use mock::{MockCamera, MockCameraFailure};
pub use normalize::{normalize, target_dimensions, NormalizeOptions, NormalizedImage};

use std::path::Path;

use image::{DynamicImage, RgbImage};
use tracing::debug;

use crate::error::{FreshxError, Result};

/// Filename given to stills taken from the camera.
pub const CAMERA_FILENAME: &str = "live_capture.jpg";

/// JPEG quality used when encoding a camera still before normalization.
const CAMERA_STILL_QUALITY: u8 = 92;

/// Width and height in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    /// Resolution requested from camera devices.
    pub const CAMERA_DEFAULT: Resolution = Resolution {
        width: 400,
        height: 300,
    };

    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl std::fmt::Display for Resolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Where a capture came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureKind {
    /// File picker selection or drag-and-drop
    StaticFile,
    /// Shutter capture from a live camera stream
    LiveCameraFrame,
}

/// A freshly acquired image, consumed once by [`normalize`].
#[derive(Clone, PartialEq, Eq)]
pub struct CaptureSource {
    pub kind: CaptureKind,
    pub bytes: Vec<u8>,
    /// Declared MIME type; empty when unknown
    pub mime: String,
    pub filename: String,
}

impl std::fmt::Debug for CaptureSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureSource")
            .field("kind", &self.kind)
            .field("bytes", &self.bytes.len())
            .field("mime", &self.mime)
            .field("filename", &self.filename)
            .finish()
    }
}

impl CaptureSource {
    /// Wrap bytes handed over by a file selection.
    pub fn from_file_bytes(
        filename: impl Into<String>,
        mime: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        Self {
            kind: CaptureKind::StaticFile,
            bytes,
            mime: mime.into(),
            filename: filename.into(),
        }
    }

    /// Read a file from disk. The MIME type is derived from the extension.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("upload")
            .to_string();

        debug!(path = %path.display(), bytes = bytes.len(), "Read capture file");
        Ok(Self::from_file_bytes(filename, mime_for_path(path), bytes))
    }

    /// Accept the first file of a selection or drop.
    ///
    /// Returns `Ok(None)` for an empty selection.
    pub fn first_of<I, P>(paths: I) -> Result<Option<Self>>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        paths.into_iter().next().map(Self::from_path).transpose()
    }

    /// Encode a camera frame as a JPEG still.
    pub fn from_frame(frame: RgbImage) -> Result<Self> {
        let mut bytes = Vec::new();
        let encoder =
            image::codecs::jpeg::JpegEncoder::new_with_quality(&mut bytes, CAMERA_STILL_QUALITY);
        DynamicImage::ImageRgb8(frame)
            .write_with_encoder(encoder)
            .map_err(|e| FreshxError::ImageError(format!("Failed to encode camera frame: {e}")))?;

        Ok(Self {
            kind: CaptureKind::LiveCameraFrame,
            bytes,
            mime: "image/jpeg".to_string(),
            filename: CAMERA_FILENAME.to_string(),
        })
    }
}

/// MIME type guessed from a file extension, empty when unknown.
pub fn mime_for_path(path: &Path) -> String {
    image::ImageFormat::from_path(path)
        .map(|format| format.to_mime_type().to_string())
        .unwrap_or_default()
}
