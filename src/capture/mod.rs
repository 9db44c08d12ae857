//! Camera input and frame handling.
//!
//! This module provides abstractions for capturing frames from a camera
//! and managing camera configuration. Frames are always handed out as
//! tightly packed RGBA.

mod camera;
mod config;
#[cfg(feature = "camera")]
mod device;
mod frame;

pub use camera::{Camera, CameraError, MockCamera, UnavailableCamera};
pub use config::{CaptureConfig, Facing};
#[cfg(feature = "camera")]
pub use device::NokhwaCamera;
pub use frame::{Frame, RGBA_CHANNELS};
