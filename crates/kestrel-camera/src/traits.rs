use crate::{CameraError, CameraMode, TestPattern};
use std::time::Duration;

/// Capture hardware seam. Implementations own the register-level sensor
/// and capture-bus programming, which is outside this crate.
///
/// All methods are called from the camera actor's worker thread only, so
/// implementations need no internal locking.
pub trait CaptureDriver: Send {
    /// Assert or drop sensor power.
    fn set_power(&mut self, enable: bool) -> Result<(), CameraError>;

    /// Program the sensor mode. `Streaming`/`Trigger` start capture into
    /// the hardware queue; `StandBy` stops it.
    fn set_mode(&mut self, mode: CameraMode) -> Result<(), CameraError>;

    /// Select a sensor test pattern in place of scene data.
    fn set_test_pattern(&mut self, pattern: TestPattern) -> Result<(), CameraError>;

    /// Fire one capture while in `Trigger` mode.
    fn trigger(&mut self) -> Result<(), CameraError>;

    /// Block until a completed raw Bayer capture is available and copy it
    /// into `frame` (one byte per pixel, sensor resolution). Fails with
    /// `CaptureTimeout` if nothing completes within `timeout`.
    fn wait_frame(&mut self, frame: &mut [u8], timeout: Duration) -> Result<(), CameraError>;
}
