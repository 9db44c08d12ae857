//! Camera abstraction for frame capture.
//!
//! This module provides a trait-based abstraction over camera hardware,
//! allowing for both real camera input and mock implementations for testing.

use super::{frame::RGBA_CHANNELS, CaptureConfig, Frame};
use std::cell::Cell;
use thiserror::Error;

/// Errors that can occur during camera operations.
#[derive(Debug, Error)]
pub enum CameraError {
    /// No matching capture device.
    #[error("camera device not found: {0}")]
    DeviceNotFound(String),
    /// The platform or the user refused access.
    #[error("camera permission denied: {0}")]
    PermissionDenied(String),
    /// The device exists but its stream could not start.
    #[error("failed to open camera: {0}")]
    OpenFailed(String),
    /// Requested format rejected.
    #[error("failed to configure camera: {0}")]
    ConfigFailed(String),
    /// A single frame could not be read.
    #[error("failed to capture frame: {0}")]
    CaptureFailed(String),
    /// Used before `open` succeeded.
    #[error("camera not initialized")]
    NotInitialized,
}

/// Trait for camera implementations.
///
/// This abstraction allows swapping between real camera hardware
/// and mock implementations for testing.
pub trait Camera {
    /// Opens the camera and starts the live stream.
    fn open(&mut self, config: &CaptureConfig) -> Result<(), CameraError>;

    /// Whether the stream has produced enough data to sample a frame.
    fn frame_ready(&self) -> bool;

    /// Native dimensions of the current stream, once known.
    fn dimensions(&self) -> Option<(u32, u32)>;

    /// Captures the current frame as RGBA.
    fn capture(&mut self) -> Result<Frame, CameraError>;

    /// Checks if the camera is currently open.
    fn is_open(&self) -> bool;

    /// Closes the camera and releases resources.
    fn close(&mut self);
}

/// Mock camera for testing that generates synthetic frames.
#[derive(Debug, Default)]
pub struct MockCamera {
    config: Option<CaptureConfig>,
    sequence: u64,
    /// Number of readiness polls answered with "not ready" after opening.
    warmup_polls: u64,
    polls: Cell<u64>,
    /// When set, `open` fails with this error message.
    open_failure: Option<String>,
}

impl MockCamera {
    /// A camera that opens and streams immediately.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reports "not ready" for the first `polls` readiness checks.
    pub fn with_warmup(polls: u64) -> Self {
        Self {
            warmup_polls: polls,
            ..Self::default()
        }
    }

    /// A camera whose `open` is refused, as when permission is denied.
    pub fn denied(reason: impl Into<String>) -> Self {
        Self {
            open_failure: Some(reason.into()),
            ..Self::default()
        }
    }
}

impl Camera for MockCamera {
    fn open(&mut self, config: &CaptureConfig) -> Result<(), CameraError> {
        if let Some(reason) = &self.open_failure {
            return Err(CameraError::PermissionDenied(reason.clone()));
        }
        config
            .validate()
            .map_err(|e| CameraError::ConfigFailed(e.to_string()))?;
        self.config = Some(config.clone());
        self.sequence = 0;
        self.polls.set(0);
        tracing::info!("MockCamera opened with config: {:?}", config);
        Ok(())
    }

    fn frame_ready(&self) -> bool {
        if self.config.is_none() {
            return false;
        }
        let polls = self.polls.get();
        self.polls.set(polls + 1);
        polls >= self.warmup_polls
    }

    fn dimensions(&self) -> Option<(u32, u32)> {
        self.config.as_ref().map(|c| (c.width, c.height))
    }

    fn capture(&mut self) -> Result<Frame, CameraError> {
        let config = self.config.as_ref().ok_or(CameraError::NotInitialized)?;

        // Deterministic pattern mixed with sequence; contains no QR code
        let byte_count = (config.width * config.height) as usize * RGBA_CHANNELS;
        let pixels: Vec<u8> = (0..byte_count)
            .map(|i| ((i as u64 ^ self.sequence) % 256) as u8)
            .collect();

        self.sequence += 1;
        Ok(Frame::new(pixels, config.width, config.height, self.sequence))
    }

    fn is_open(&self) -> bool {
        self.config.is_some()
    }

    fn close(&mut self) {
        self.config = None;
        tracing::info!("MockCamera closed");
    }
}

/// Stand-in used when no camera backend is compiled in.
///
/// Every `open` fails, which drives the widget down its
/// camera-unavailable path.
#[derive(Debug, Default)]
pub struct UnavailableCamera;

impl Camera for UnavailableCamera {
    fn open(&mut self, _config: &CaptureConfig) -> Result<(), CameraError> {
        Err(CameraError::DeviceNotFound(
            "built without camera support (enable the `camera` feature)".to_string(),
        ))
    }

    fn frame_ready(&self) -> bool {
        false
    }

    fn dimensions(&self) -> Option<(u32, u32)> {
        None
    }

    fn capture(&mut self) -> Result<Frame, CameraError> {
        Err(CameraError::NotInitialized)
    }

    fn is_open(&self) -> bool {
        false
    }

    fn close(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_camera_lifecycle() {
        let mut camera = MockCamera::new();
        let config = CaptureConfig::with_dimensions(64, 48);

        assert!(!camera.is_open());
        assert!(!camera.frame_ready());

        camera.open(&config).unwrap();
        assert!(camera.is_open());
        assert!(camera.frame_ready());
        assert_eq!(camera.dimensions(), Some((64, 48)));

        let frame = camera.capture().unwrap();
        assert!(frame.is_valid());
        assert_eq!(frame.sequence(), 1);

        let frame2 = camera.capture().unwrap();
        assert_eq!(frame2.sequence(), 2);

        camera.close();
        assert!(!camera.is_open());
        assert_eq!(camera.dimensions(), None);
    }

    #[test]
    fn test_capture_without_open() {
        let mut camera = MockCamera::new();
        assert!(matches!(
            camera.capture(),
            Err(CameraError::NotInitialized)
        ));
    }

    #[test]
    fn test_warmup_polls_not_ready() {
        let mut camera = MockCamera::with_warmup(2);
        camera.open(&CaptureConfig::default()).unwrap();

        assert!(!camera.frame_ready());
        assert!(!camera.frame_ready());
        assert!(camera.frame_ready());
    }

    #[test]
    fn test_denied_camera_fails_open() {
        let mut camera = MockCamera::denied("user dismissed prompt");
        let err = camera.open(&CaptureConfig::default()).unwrap_err();

        assert!(matches!(err, CameraError::PermissionDenied(_)));
        assert!(!camera.is_open());
    }

    #[test]
    fn test_unavailable_camera() {
        let mut camera = UnavailableCamera;
        assert!(camera.open(&CaptureConfig::default()).is_err());
        assert!(!camera.frame_ready());
    }
}
