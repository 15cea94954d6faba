//! Camera pipeline: sensor mode state machine, frame-buffer pool, and the
//! raw-Bayer conversion pipeline (demosaic, resize, rotate, white balance).
//!
//! The sensor is owned by a single actor; every operation (power, mode,
//! test pattern, frame acquisition) is a request against its mailbox. Raw
//! captures land in fixed pool slots and are converted into each
//! caller-requested [`FrameFormat`] before the response returns buffer
//! ownership to the caller.

pub mod bayer;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod pool;
pub mod traits;
pub mod transform;
pub mod types;

pub use config::CameraConfig;
pub use error::CameraError;
pub use pipeline::{Camera, CameraRequest, CameraResponse};
pub use pool::{FrameHandle, FramePool};
pub use traits::CaptureDriver;
pub use types::{CameraMode, FilterMethod, FrameFormat, PixelFormat, Rotation, TestPattern};
