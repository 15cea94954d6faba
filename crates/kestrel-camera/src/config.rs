use std::time::Duration;

/// Configuration for the camera pipeline.
#[derive(Clone, Debug)]
pub struct CameraConfig {
    width: usize,
    height: usize,
    pool_slots: usize,
    mailbox_capacity: usize,
    capture_timeout: Duration,
    request_deadline: Duration,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            // Native sensor resolution; raw captures are always this size.
            width: 324,
            height: 324,
            pool_slots: 4,
            mailbox_capacity: 4,
            capture_timeout: Duration::from_millis(200),
            request_deadline: Duration::from_secs(1),
        }
    }
}

impl CameraConfig {
    /// Set the raw capture width in pixels. Must be even (Bayer cells are 2x2).
    pub fn with_width(mut self, width: usize) -> Self {
        self.width = width;
        self
    }

    /// Set the raw capture height in pixels. Must be even.
    pub fn with_height(mut self, height: usize) -> Self {
        self.height = height;
        self
    }

    /// Set the number of fixed frame-pool slots.
    pub fn with_pool_slots(mut self, pool_slots: usize) -> Self {
        self.pool_slots = pool_slots;
        self
    }

    /// Set the actor mailbox capacity.
    pub fn with_mailbox_capacity(mut self, capacity: usize) -> Self {
        self.mailbox_capacity = capacity;
        self
    }

    /// Set the bounded wait for a completed capture.
    pub fn with_capture_timeout(mut self, timeout: Duration) -> Self {
        self.capture_timeout = timeout;
        self
    }

    /// Set the deadline applied to synchronous camera requests.
    pub fn with_request_deadline(mut self, deadline: Duration) -> Self {
        self.request_deadline = deadline;
        self
    }

    // Getters
    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn pool_slots(&self) -> usize {
        self.pool_slots
    }

    pub fn mailbox_capacity(&self) -> usize {
        self.mailbox_capacity
    }

    pub fn capture_timeout(&self) -> Duration {
        self.capture_timeout
    }

    pub fn request_deadline(&self) -> Duration {
        self.request_deadline
    }

    /// Bytes per raw Bayer frame.
    pub fn frame_size(&self) -> usize {
        self.width * self.height
    }
}
