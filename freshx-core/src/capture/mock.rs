//! Mock camera for testing.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use image::{Rgb, RgbImage};

use super::{CameraDevice, Resolution, VideoStream};
use crate::error::{FreshxError, Result};

/// How a [`MockCamera`] should fail on open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockCameraFailure {
    PermissionDenied,
    DeviceUnavailable,
}

/// Mock camera producing deterministic gradient frames.
///
/// Counts open streams so tests can check that every stream is released.
#[derive(Debug, Clone, Default)]
pub struct MockCamera {
    seed: u8,
    failure: Option<MockCameraFailure>,
    live: Arc<AtomicUsize>,
}

impl MockCamera {
    pub fn new(seed: u8) -> Self {
        Self {
            seed,
            ..Default::default()
        }
    }

    /// A camera whose `open` always fails.
    pub fn failing(failure: MockCameraFailure) -> Self {
        Self {
            failure: Some(failure),
            ..Default::default()
        }
    }

    /// Number of streams opened and not yet stopped.
    pub fn live_streams(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CameraDevice for MockCamera {
    async fn open(&self, requested: Resolution) -> Result<Box<dyn VideoStream>> {
        match self.failure {
            Some(MockCameraFailure::PermissionDenied) => Err(FreshxError::PermissionDenied(
                "Permission dismissed by user".into(),
            )),
            Some(MockCameraFailure::DeviceUnavailable) => Err(FreshxError::DeviceUnavailable(
                "No camera connected".into(),
            )),
            None => {
                self.live.fetch_add(1, Ordering::SeqCst);
                Ok(Box::new(MockStream {
                    resolution: requested,
                    seed: self.seed,
                    live: Arc::clone(&self.live),
                    stopped: false,
                }))
            }
        }
    }

    fn device_id(&self) -> String {
        format!("mock:{}", self.seed)
    }
}

struct MockStream {
    resolution: Resolution,
    seed: u8,
    live: Arc<AtomicUsize>,
    stopped: bool,
}

impl VideoStream for MockStream {
    fn grab_frame(&mut self) -> Result<RgbImage> {
        if self.stopped {
            return Err(FreshxError::DeviceUnavailable("Stream stopped".into()));
        }

        let seed = self.seed;
        Ok(RgbImage::from_fn(
            self.resolution.width,
            self.resolution.height,
            |x, y| Rgb([(x as u8).wrapping_add(seed), (y as u8).wrapping_add(seed), 64]),
        ))
    }

    fn stop_tracks(&mut self) {
        if !self.stopped {
            self.stopped = true;
            self.live.fetch_sub(1, Ordering::SeqCst);
        }
    }

    fn is_live(&self) -> bool {
        !self.stopped
    }
}

impl Drop for MockStream {
    fn drop(&mut self) {
        self.stop_tracks();
    }
}
