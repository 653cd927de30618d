//! Bounded-resolution re-encoding of captured images.
//!
//! The larger side is clamped to the configured maximum while preserving the
//! aspect ratio; images already within bounds keep their size. Undecodable
//! payloads pass through untouched so an upload can still be attempted.

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::imageops::FilterType;
use image::DynamicImage;
use tracing::{debug, warn};

use super::{CaptureKind, CaptureSource, Resolution};
use crate::error::{FreshxError, Result};

/// Bounds and quality for normalization.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizeOptions {
    pub max_width: u32,
    pub max_height: u32,
    /// Compression quality in 0.0..=1.0
    pub quality: f32,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            max_width: 400,
            max_height: 400,
            quality: 0.9,
        }
    }
}

impl NormalizeOptions {
    fn jpeg_quality(&self) -> u8 {
        (self.quality.clamp(0.01, 1.0) * 100.0).round() as u8
    }
}

/// Upload-ready image derived from a [`CaptureSource`].
#[derive(Clone, PartialEq, Eq)]
pub struct NormalizedImage {
    pub origin: CaptureKind,
    pub filename: String,
    pub mime: String,
    pub bytes: Vec<u8>,
    /// Output size; `None` when the original payload was passed through
    pub dimensions: Option<Resolution>,
}

impl std::fmt::Debug for NormalizedImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NormalizedImage")
            .field("origin", &self.origin)
            .field("filename", &self.filename)
            .field("mime", &self.mime)
            .field("bytes", &self.bytes.len())
            .field("dimensions", &self.dimensions)
            .finish()
    }
}

impl NormalizedImage {
    fn passthrough(source: CaptureSource) -> Self {
        Self {
            origin: source.kind,
            filename: source.filename,
            mime: source.mime,
            bytes: source.bytes,
            dimensions: None,
        }
    }

    /// Whether decoding failed and the original bytes are being uploaded.
    pub fn is_passthrough(&self) -> bool {
        self.dimensions.is_none()
    }

    /// MIME type to declare on upload.
    pub fn upload_mime(&self) -> &str {
        if self.mime.is_empty() {
            "application/octet-stream"
        } else {
            &self.mime
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    Jpeg,
    Png,
}

impl OutputFormat {
    fn for_mime(mime: &str) -> Self {
        match mime.to_ascii_lowercase().as_str() {
            "image/png" => Self::Png,
            _ => Self::Jpeg,
        }
    }

    fn mime(self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
        }
    }
}

/// Compute output dimensions that fit within `max_width` x `max_height`.
///
/// The axis that needs the stronger reduction is clamped to its maximum and
/// the other is scaled by the same ratio and rounded (never below 1).
pub fn target_dimensions(width: u32, height: u32, max_width: u32, max_height: u32) -> (u32, u32) {
    if width == 0 || height == 0 || max_width == 0 || max_height == 0 {
        return (width, height);
    }

    let width_ratio = f64::from(max_width) / f64::from(width);
    let height_ratio = f64::from(max_height) / f64::from(height);

    if width_ratio >= 1.0 && height_ratio >= 1.0 {
        return (width, height);
    }

    let scale = |value: u32, ratio: f64| ((f64::from(value) * ratio).round() as u32).max(1);

    if width_ratio <= height_ratio {
        (max_width, scale(height, width_ratio))
    } else {
        (scale(width, height_ratio), max_height)
    }
}

/// Resize and re-encode a capture for upload.
///
/// Consumes the source. Decoding failures degrade to a passthrough of the
/// original bytes; encoding failures are reported as
/// [`FreshxError::ImageError`].
pub fn normalize(source: CaptureSource, options: &NormalizeOptions) -> Result<NormalizedImage> {
    let decoded = match image::load_from_memory(&source.bytes) {
        Ok(image) => image,
        Err(e) => {
            warn!(
                filename = %source.filename,
                error = %e,
                "Could not decode image, uploading original bytes"
            );
            return Ok(NormalizedImage::passthrough(source));
        }
    };

    let (width, height) = target_dimensions(
        decoded.width(),
        decoded.height(),
        options.max_width,
        options.max_height,
    );

    let resized = if (width, height) == (decoded.width(), decoded.height()) {
        decoded
    } else {
        decoded.resize_exact(width, height, FilterType::Triangle)
    };

    let format = OutputFormat::for_mime(&source.mime);
    let bytes = encode(&resized, format, options)?;

    debug!(
        filename = %source.filename,
        input_bytes = source.bytes.len(),
        output_bytes = bytes.len(),
        width,
        height,
        format = format.mime(),
        "Normalized capture"
    );

    Ok(NormalizedImage {
        origin: source.kind,
        filename: source.filename,
        mime: format.mime().to_string(),
        bytes,
        dimensions: Some(Resolution::new(width, height)),
    })
}

fn encode(image: &DynamicImage, format: OutputFormat, options: &NormalizeOptions) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    let result = match format {
        OutputFormat::Jpeg => {
            let encoder = JpegEncoder::new_with_quality(&mut bytes, options.jpeg_quality());
            DynamicImage::ImageRgb8(image.to_rgb8()).write_with_encoder(encoder)
        }
        OutputFormat::Png => {
            let encoder = PngEncoder::new(&mut bytes);
            DynamicImage::ImageRgba8(image.to_rgba8()).write_with_encoder(encoder)
        }
    };

    result.map_err(|e| FreshxError::ImageError(format!("Failed to encode {}: {e}", format.mime())))?;
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
    use std::io::Cursor;

    fn encoded(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
        let image = RgbImage::from_fn(width, height, |x, y| {
            Rgb([(x % 255) as u8, (y % 255) as u8, 128])
        });
        let mut bytes = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(image)
            .write_to(&mut bytes, format)
            .unwrap();
        bytes.into_inner()
    }

    fn assert_within_bounds(width: u32, height: u32) {
        let (w, h) = target_dimensions(width, height, 400, 400);
        assert!(w.max(h) <= 400, "{width}x{height} -> {w}x{h}");

        let original = f64::from(width) / f64::from(height);
        let output = f64::from(w) / f64::from(h);
        // Half a pixel of rounding on the short side
        let tolerance = 0.5 / f64::from(w.min(h)) + 1e-9;
        assert!(
            ((output - original) / original).abs() <= tolerance,
            "{width}x{height} -> {w}x{h}"
        );
    }

    #[test]
    fn test_landscape_clamped_to_width() {
        assert_eq!(target_dimensions(1600, 1200, 400, 400), (400, 300));
    }

    #[test]
    fn test_portrait_clamped_to_height() {
        assert_eq!(target_dimensions(1080, 1920, 400, 400), (225, 400));
    }

    #[test]
    fn test_square_clamped() {
        assert_eq!(target_dimensions(1000, 1000, 400, 400), (400, 400));
    }

    #[test]
    fn test_small_image_unchanged() {
        assert_eq!(target_dimensions(320, 240, 400, 400), (320, 240));
        assert_eq!(target_dimensions(400, 400, 400, 400), (400, 400));
    }

    #[test]
    fn test_rounding_matches_browser() {
        // 333 * 400 / 1000 = 133.2
        assert_eq!(target_dimensions(1000, 333, 400, 400), (400, 133));
        // 1001 * 400 / 1002 = 399.6
        assert_eq!(target_dimensions(1001, 1002, 400, 400), (400, 400));
    }

    #[test]
    fn test_extreme_aspect_never_zero() {
        assert_eq!(target_dimensions(10_000, 2, 400, 400), (400, 1));
    }

    #[test]
    fn test_non_square_bounds_respected() {
        let (w, h) = target_dimensions(800, 700, 400, 200);
        assert!(w <= 400 && h <= 200);
        assert_eq!(h, 200);
    }

    #[test]
    fn test_bounds_hold_across_shapes() {
        for (w, h) in [
            (4032, 3024),
            (3024, 4032),
            (401, 400),
            (400, 401),
            (1920, 1080),
            (777, 5000),
            (5000, 777),
        ] {
            assert_within_bounds(w, h);
        }
    }

    #[test]
    fn test_normalize_downscales_jpeg() {
        let source = CaptureSource::from_file_bytes(
            "apple.jpg",
            "image/jpeg",
            encoded(800, 600, ImageFormat::Jpeg),
        );

        let image = normalize(source, &NormalizeOptions::default()).unwrap();
        assert_eq!(image.dimensions, Some(Resolution::new(400, 300)));
        assert_eq!(image.mime, "image/jpeg");
        assert_eq!(image.filename, "apple.jpg");

        let decoded = image::load_from_memory(&image.bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (400, 300));
    }

    #[test]
    fn test_normalize_keeps_png() {
        let source = CaptureSource::from_file_bytes(
            "pear.png",
            "image/png",
            encoded(200, 500, ImageFormat::Png),
        );

        let image = normalize(source, &NormalizeOptions::default()).unwrap();
        assert_eq!(image.mime, "image/png");
        assert_eq!(image.dimensions, Some(Resolution::new(160, 400)));
        assert_eq!(
            image::guess_format(&image.bytes).unwrap(),
            ImageFormat::Png
        );
    }

    #[test]
    fn test_normalize_transparent_png_to_jpeg_fallback() {
        let rgba = RgbaImage::from_pixel(50, 50, Rgba([10, 200, 10, 0]));
        let mut bytes = Cursor::new(Vec::new());
        DynamicImage::ImageRgba8(rgba)
            .write_to(&mut bytes, ImageFormat::Png)
            .unwrap();

        // Declared type is missing, so the JPEG fallback applies
        let source = CaptureSource::from_file_bytes("drop", "", bytes.into_inner());
        let image = normalize(source, &NormalizeOptions::default()).unwrap();
        assert_eq!(image.mime, "image/jpeg");
        assert_eq!(image.dimensions, Some(Resolution::new(50, 50)));
    }

    #[test]
    fn test_normalize_undecodable_passthrough() {
        let payload = b"definitely not an image".to_vec();
        let source = CaptureSource::from_file_bytes("mystery.jpg", "image/jpeg", payload.clone());

        let image = normalize(source, &NormalizeOptions::default()).unwrap();
        assert!(image.is_passthrough());
        assert_eq!(image.bytes, payload);
        assert_eq!(image.mime, "image/jpeg");
        assert_eq!(image.filename, "mystery.jpg");
    }

    #[test]
    fn test_upload_mime_fallback() {
        let source = CaptureSource::from_file_bytes("blob", "", b"raw".to_vec());
        let image = normalize(source, &NormalizeOptions::default()).unwrap();
        assert_eq!(image.upload_mime(), "application/octet-stream");
    }

    #[test]
    fn test_jpeg_quality_from_options() {
        assert_eq!(NormalizeOptions::default().jpeg_quality(), 90);
    }
}
