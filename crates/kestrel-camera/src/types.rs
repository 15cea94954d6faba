/// Sensor operating mode. Exactly one mode is active at a time, mutated
/// only by the camera actor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CameraMode {
    /// Powered but not capturing.
    StandBy,
    /// Continuous capture at the sensor frame rate.
    Streaming,
    /// One capture per explicit trigger.
    Trigger,
}

/// Sensor self-test patterns, in place of real scene data.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TestPattern {
    None,
    ColorBar,
    WalkingOnes,
}

/// Output pixel format of a converted frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PixelFormat {
    Rgba,
    Rgb,
    /// 8-bit grayscale.
    Gray,
    /// Raw Bayer passthrough; skips demosaic entirely.
    Raw,
}

impl PixelFormat {
    pub fn bytes_per_pixel(&self) -> usize {
        match self {
            PixelFormat::Rgba => 4,
            PixelFormat::Rgb => 3,
            PixelFormat::Gray => 1,
            PixelFormat::Raw => 1,
        }
    }
}

/// Resize sampling method.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FilterMethod {
    Bilinear,
    Nearest,
}

/// Clockwise rotation applied after resize.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Rotation {
    R0,
    R90,
    R180,
    R270,
}

/// One requested output rendering of a captured frame.
///
/// `width`/`height` are the resize target, before any rotation (a 90/270
/// rotation swaps the output dimensions; the byte count is unchanged).
/// The destination buffer travels by value through the mailbox and comes
/// back populated in the response.
#[derive(Debug)]
pub struct FrameFormat {
    pub format: PixelFormat,
    pub filter: FilterMethod,
    pub rotation: Rotation,
    pub width: usize,
    pub height: usize,
    pub preserve_aspect: bool,
    pub white_balance: bool,
    pub buffer: Vec<u8>,
}

impl FrameFormat {
    /// Build a format descriptor with a zeroed destination buffer of the
    /// exact required size. Defaults: bilinear filter, no rotation,
    /// stretch-to-fit, white balance on.
    pub fn new(format: PixelFormat, width: usize, height: usize) -> Self {
        Self {
            format,
            filter: FilterMethod::Bilinear,
            rotation: Rotation::R0,
            width,
            height,
            preserve_aspect: false,
            white_balance: true,
            buffer: vec![0u8; width * height * format.bytes_per_pixel()],
        }
    }

    pub fn with_filter(mut self, filter: FilterMethod) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_rotation(mut self, rotation: Rotation) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_preserve_aspect(mut self, preserve: bool) -> Self {
        self.preserve_aspect = preserve;
        self
    }

    pub fn with_white_balance(mut self, enabled: bool) -> Self {
        self.white_balance = enabled;
        self
    }

    /// Replace the destination buffer (e.g. to reuse an allocation from a
    /// previous frame).
    pub fn with_buffer(mut self, buffer: Vec<u8>) -> Self {
        self.buffer = buffer;
        self
    }

    /// Number of bytes this format must be able to hold.
    pub fn required_len(&self) -> usize {
        self.width * self.height * self.format.bytes_per_pixel()
    }
}
