//! Native camera backed by `nokhwa`.

use super::{Camera, CameraError, CaptureConfig, Facing, Frame};
use nokhwa::pixel_format::RgbFormat;
use nokhwa::utils::{
    ApiBackend, CameraFormat, CameraIndex, FrameFormat, RequestedFormat, RequestedFormatType,
    Resolution,
};

/// Live camera stream from a local capture device.
///
/// The underlying device handle is created in [`Camera::open`], so the
/// wrapper can be built on one thread and opened on the capture thread.
#[derive(Default)]
pub struct NokhwaCamera {
    inner: Option<nokhwa::Camera>,
    sequence: u64,
}

impl NokhwaCamera {
    /// Creates an unopened camera.
    pub fn new() -> Self {
        Self::default()
    }

    fn select_index(config: &CaptureConfig) -> CameraIndex {
        if let Some(id) = config.device_id {
            return CameraIndex::Index(id);
        }

        let devices = match nokhwa::query(ApiBackend::Auto) {
            Ok(devices) => devices,
            Err(e) => {
                tracing::debug!(error = %e, "Camera query failed, using device 0");
                return CameraIndex::Index(0);
            }
        };

        let hints = config.facing.name_hints();
        devices
            .iter()
            .find(|info| {
                let name = info.human_name().to_lowercase();
                hints.iter().any(|hint| name.contains(hint))
            })
            .map(|info| {
                tracing::info!(device = %info.human_name(), facing = ?config.facing, "Selected camera by facing");
                info.index().clone()
            })
            .unwrap_or_else(|| {
                if config.facing == Facing::Environment {
                    tracing::debug!("No rear-facing camera found, using device 0");
                }
                CameraIndex::Index(0)
            })
    }
}

impl Camera for NokhwaCamera {
    fn open(&mut self, config: &CaptureConfig) -> Result<(), CameraError> {
        config
            .validate()
            .map_err(|e| CameraError::ConfigFailed(e.to_string()))?;

        let format = CameraFormat::new(
            Resolution::new(config.width, config.height),
            FrameFormat::MJPEG,
            config.fps,
        );
        let requested = RequestedFormat::new::<RgbFormat>(RequestedFormatType::Closest(format));
        let index = Self::select_index(config);

        let mut camera = nokhwa::Camera::new(index.clone(), requested)
            .map_err(|e| CameraError::OpenFailed(format!("{index:?}: {e}")))?;
        camera
            .open_stream()
            .map_err(|e| CameraError::OpenFailed(format!("failed to start stream: {e}")))?;

        tracing::info!(
            device = %camera.info().human_name(),
            resolution = ?camera.resolution(),
            "Camera opened"
        );

        self.inner = Some(camera);
        self.sequence = 0;
        Ok(())
    }

    fn frame_ready(&self) -> bool {
        self.inner
            .as_ref()
            .map(|camera| camera.is_stream_open())
            .unwrap_or(false)
    }

    fn dimensions(&self) -> Option<(u32, u32)> {
        self.inner.as_ref().map(|camera| {
            let res = camera.resolution();
            (res.width(), res.height())
        })
    }

    fn capture(&mut self) -> Result<Frame, CameraError> {
        let camera = self.inner.as_mut().ok_or(CameraError::NotInitialized)?;

        let buffer = camera
            .frame()
            .map_err(|e| CameraError::CaptureFailed(e.to_string()))?;
        let decoded = buffer
            .decode_image::<RgbFormat>()
            .map_err(|e| CameraError::CaptureFailed(e.to_string()))?;

        let (width, height) = (decoded.width(), decoded.height());
        self.sequence += 1;
        Ok(Frame::from_rgb(decoded.as_raw(), width, height, self.sequence))
    }

    fn is_open(&self) -> bool {
        self.inner.is_some()
    }

    fn close(&mut self) {
        if let Some(mut camera) = self.inner.take() {
            if let Err(e) = camera.stop_stream() {
                tracing::warn!(error = %e, "Failed to stop camera stream");
            }
            tracing::info!("Camera closed");
        }
    }
}
