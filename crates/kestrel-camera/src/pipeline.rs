use crate::{
    CameraConfig, CameraError, CameraMode, CaptureDriver, FrameFormat, FramePool, PixelFormat,
    Rotation, TestPattern, bayer, transform,
};
use kestrel_actor::{Actor, ActorConfig, Handler, Overflow};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Requests serviced by the camera actor.
#[derive(Debug)]
pub enum CameraRequest {
    Enable(CameraMode),
    Disable,
    SetPower(bool),
    SetTestPattern(TestPattern),
    Trigger,
    Discard(usize),
    GetFrame(Vec<FrameFormat>),
}

/// Responses mirroring [`CameraRequest`] kinds.
#[derive(Debug)]
pub enum CameraResponse {
    Enable { success: bool },
    Disable,
    Power { success: bool },
    TestPattern,
    Trigger,
    Discard { drained: usize },
    Frame(Result<Vec<FrameFormat>, CameraError>),
}

/// Monotonic diagnostic counters; reset only at reinitialization.
#[derive(Default)]
struct FrameCounters {
    /// Captures dropped because no free pool buffer was available.
    overflow: AtomicU64,
    /// Frame waits that ran past the expected capture interval.
    underflow: AtomicU64,
}

struct CameraHandler {
    driver: Box<dyn CaptureDriver>,
    pool: FramePool,
    config: CameraConfig,
    mode: CameraMode,
    pattern: TestPattern,
    counters: Arc<FrameCounters>,
}

impl Handler<CameraRequest, CameraResponse> for CameraHandler {
    fn init(&mut self) {
        log::info!(
            "camera pipeline up: {}x{}, {} pool slots",
            self.config.width(),
            self.config.height(),
            self.pool.slot_count()
        );
    }

    fn handle(&mut self, request: CameraRequest) -> CameraResponse {
        match request {
            CameraRequest::Enable(mode) => self.handle_enable(mode),
            CameraRequest::Disable => self.handle_disable(),
            CameraRequest::SetPower(enable) => self.handle_power(enable),
            CameraRequest::SetTestPattern(pattern) => self.handle_test_pattern(pattern),
            CameraRequest::Trigger => self.handle_trigger(),
            CameraRequest::Discard(count) => self.handle_discard(count),
            CameraRequest::GetFrame(formats) => CameraResponse::Frame(self.handle_frame(formats)),
        }
    }
}

impl CameraHandler {
    fn handle_enable(&mut self, mode: CameraMode) -> CameraResponse {
        if mode == CameraMode::StandBy {
            log::warn!("Enable(StandBy) rejected; use Disable");
            return CameraResponse::Enable { success: false };
        }
        match self.driver.set_mode(mode) {
            Ok(()) => {
                self.mode = mode;
                // Mode changes can reset the pattern selection on the sensor.
                if self.pattern != TestPattern::None {
                    if let Err(e) = self.driver.set_test_pattern(self.pattern) {
                        log::warn!("test pattern reapply failed: {e}");
                    }
                }
                log::info!("camera enabled: {mode:?}");
                CameraResponse::Enable { success: true }
            }
            Err(e) => {
                log::error!("camera enable failed: {e}");
                CameraResponse::Enable { success: false }
            }
        }
    }

    fn handle_disable(&mut self) -> CameraResponse {
        if let Err(e) = self.driver.set_mode(CameraMode::StandBy) {
            log::error!("camera disable failed: {e}");
        }
        self.mode = CameraMode::StandBy;
        CameraResponse::Disable
    }

    fn handle_power(&mut self, enable: bool) -> CameraResponse {
        match self.driver.set_power(enable) {
            Ok(()) => CameraResponse::Power { success: true },
            Err(e) => {
                log::error!("camera power request failed: {e}");
                CameraResponse::Power { success: false }
            }
        }
    }

    fn handle_test_pattern(&mut self, pattern: TestPattern) -> CameraResponse {
        if let Err(e) = self.driver.set_test_pattern(pattern) {
            log::error!("test pattern select failed: {e}");
        } else {
            self.pattern = pattern;
        }
        CameraResponse::TestPattern
    }

    fn handle_trigger(&mut self) -> CameraResponse {
        if self.mode != CameraMode::Trigger {
            log::warn!("trigger ignored in mode {:?}", self.mode);
        } else if let Err(e) = self.driver.trigger() {
            log::error!("trigger failed: {e}");
        }
        CameraResponse::Trigger
    }

    /// Drain completed captures without conversion. Used to flush stale
    /// frames after power-up or a mode change.
    fn handle_discard(&mut self, count: usize) -> CameraResponse {
        let mut drained = 0;
        for _ in 0..count {
            match self.capture_raw() {
                Ok(handle) => {
                    drained += 1;
                    if let Err(e) = self.pool.release(handle) {
                        log::error!("discard release failed: {e}");
                        break;
                    }
                }
                Err(e) => {
                    log::warn!("discard stopped after {drained} frames: {e}");
                    break;
                }
            }
        }
        CameraResponse::Discard { drained }
    }

    fn handle_frame(&mut self, mut formats: Vec<FrameFormat>) -> Result<Vec<FrameFormat>, CameraError> {
        // Validate everything up front; configuration errors must not
        // consume a capture or change state.
        if self.mode == CameraMode::StandBy {
            return Err(CameraError::Config("camera not enabled".to_string()));
        }
        if formats.is_empty() {
            return Err(CameraError::Config("no formats requested".to_string()));
        }
        for format in &formats {
            if format.width == 0 || format.height == 0 {
                return Err(CameraError::Config("zero output dimension".to_string()));
            }
            if format.buffer.len() != format.required_len() {
                return Err(CameraError::Config(format!(
                    "destination buffer is {} bytes, format needs {}",
                    format.buffer.len(),
                    format.required_len()
                )));
            }
        }

        let handle = self.capture_raw()?;
        let width = self.config.width();
        let height = self.config.height();

        let result = (|| {
            let raw = self.pool.bytes(&handle)?.to_vec();
            for format in &mut formats {
                render(&raw, width, height, format);
            }
            Ok(())
        })();

        // The slot goes back to the pool before the caller sees the
        // response; buffer ownership moves with the response instead.
        if let Err(e) = self.pool.release(handle) {
            log::error!("frame release failed: {e}");
        }
        result.map(|()| formats)
    }

    /// Check out a pool slot and wait for a completed capture to land in it.
    fn capture_raw(&mut self) -> Result<crate::FrameHandle, CameraError> {
        let Some(handle) = self.pool.checkout() else {
            self.counters.overflow.fetch_add(1, Ordering::Relaxed);
            return Err(CameraError::Exhausted);
        };

        let timeout = self.config.capture_timeout();
        let frame = self.pool.bytes_mut(&handle)?;
        match self.driver.wait_frame(frame, timeout) {
            Ok(()) => Ok(handle),
            Err(e) => {
                if matches!(e, CameraError::CaptureTimeout) {
                    self.counters.underflow.fetch_add(1, Ordering::Relaxed);
                }
                if let Err(release_err) = self.pool.release(handle) {
                    log::error!("release after failed capture: {release_err}");
                }
                Err(e)
            }
        }
    }
}

/// Run the fixed conversion pipeline for one requested format:
/// demosaic -> color space -> resize -> rotate -> white balance.
fn render(raw: &[u8], src_w: usize, src_h: usize, format: &mut FrameFormat) {
    let channels = format.format.bytes_per_pixel();

    let staged = match format.format {
        PixelFormat::Raw => raw.to_vec(),
        PixelFormat::Gray => bayer::rgb_to_gray(&bayer::demosaic_rgb(raw, src_w, src_h)),
        PixelFormat::Rgb => bayer::demosaic_rgb(raw, src_w, src_h),
        PixelFormat::Rgba => bayer::demosaic_rgba(raw, src_w, src_h),
    };

    let (resized, w, h) = if format.width != src_w || format.height != src_h {
        let out = match format.filter {
            crate::FilterMethod::Nearest => transform::resize_nearest(
                &staged,
                src_w,
                src_h,
                format.width,
                format.height,
                channels,
                format.preserve_aspect,
            ),
            crate::FilterMethod::Bilinear => transform::resize_bilinear(
                &staged,
                src_w,
                src_h,
                format.width,
                format.height,
                channels,
                format.preserve_aspect,
            ),
        };
        (out, format.width, format.height)
    } else {
        (staged, src_w, src_h)
    };

    let mut out = if format.rotation != Rotation::R0 {
        transform::rotate(&resized, w, h, channels, format.rotation).0
    } else {
        resized
    };

    if format.white_balance
        && matches!(format.format, PixelFormat::Rgb | PixelFormat::Rgba)
    {
        transform::auto_white_balance(&mut out, channels);
    }

    format.buffer.copy_from_slice(&out);
}

/// Handle to the camera pipeline actor.
///
/// One instance owns the sensor for the process lifetime; clones share the
/// same actor.
#[derive(Clone)]
pub struct Camera {
    actor: Actor<CameraRequest, CameraResponse>,
    config: CameraConfig,
    counters: Arc<FrameCounters>,
}

impl Camera {
    /// Spawn the camera actor around a capture driver.
    pub fn new(config: CameraConfig, driver: Box<dyn CaptureDriver>) -> Self {
        let counters = Arc::new(FrameCounters::default());
        let handler_counters = counters.clone();
        let handler_config = config.clone();

        let actor_config = ActorConfig::default()
            .with_capacity(config.mailbox_capacity())
            .with_overflow(Overflow::Block(config.request_deadline()));

        let actor = Actor::spawn("camera", actor_config, move |_me| CameraHandler {
            pool: FramePool::new(handler_config.pool_slots(), handler_config.frame_size()),
            driver,
            config: handler_config,
            mode: CameraMode::StandBy,
            pattern: TestPattern::None,
            counters: handler_counters,
        });

        Self {
            actor,
            config,
            counters,
        }
    }

    /// Transition StandBy -> Streaming|Trigger and start hardware capture.
    pub async fn enable(&self, mode: CameraMode) -> Result<(), CameraError> {
        match self.call(CameraRequest::Enable(mode)).await? {
            CameraResponse::Enable { success: true } => Ok(()),
            CameraResponse::Enable { success: false } => {
                Err(CameraError::Driver("enable rejected".to_string()))
            }
            other => Err(mismatch(other)),
        }
    }

    /// Stop capture and return to StandBy.
    pub async fn disable(&self) -> Result<(), CameraError> {
        self.call(CameraRequest::Disable).await.map(drop)
    }

    pub async fn set_power(&self, enable: bool) -> Result<(), CameraError> {
        match self.call(CameraRequest::SetPower(enable)).await? {
            CameraResponse::Power { success: true } => Ok(()),
            CameraResponse::Power { success: false } => {
                Err(CameraError::Driver("power request rejected".to_string()))
            }
            other => Err(mismatch(other)),
        }
    }

    pub async fn set_test_pattern(&self, pattern: TestPattern) -> Result<(), CameraError> {
        self.call(CameraRequest::SetTestPattern(pattern))
            .await
            .map(drop)
    }

    /// Fire one capture; only meaningful in Trigger mode.
    pub async fn trigger(&self) -> Result<(), CameraError> {
        self.call(CameraRequest::Trigger).await.map(drop)
    }

    /// Drain `count` completed captures without conversion. Returns how
    /// many were actually drained.
    pub async fn discard_frames(&self, count: usize) -> Result<usize, CameraError> {
        match self.call(CameraRequest::Discard(count)).await? {
            CameraResponse::Discard { drained } => Ok(drained),
            other => Err(mismatch(other)),
        }
    }

    /// Capture one raw frame and render every requested format into its
    /// destination buffer. Buffers come back populated, in request order.
    pub async fn get_frame(
        &self,
        formats: Vec<FrameFormat>,
    ) -> Result<Vec<FrameFormat>, CameraError> {
        match self.call(CameraRequest::GetFrame(formats)).await? {
            CameraResponse::Frame(result) => result,
            other => Err(mismatch(other)),
        }
    }

    /// Captures dropped for want of a free pool buffer.
    pub fn overflow_count(&self) -> u64 {
        self.counters.overflow.load(Ordering::Relaxed)
    }

    /// Frame waits that ran past the expected capture interval.
    pub fn underflow_count(&self) -> u64 {
        self.counters.underflow.load(Ordering::Relaxed)
    }

    async fn call(&self, request: CameraRequest) -> Result<CameraResponse, CameraError> {
        Ok(self
            .actor
            .call(request, self.config.request_deadline())
            .await?)
    }
}

fn mismatch(response: CameraResponse) -> CameraError {
    log::error!("camera response kind mismatch: {response:?}");
    CameraError::Driver("response kind mismatch".to_string())
}
