use std::time::Duration;

/// Behavior when a request arrives and the mailbox is full.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Overflow {
    /// Wait up to the given duration for a slot, then fail.
    Block(Duration),
    /// Fail immediately.
    Reject,
}

/// Configuration for an actor's mailbox.
#[derive(Clone, Copy, Debug)]
pub struct ActorConfig {
    capacity: usize,
    overflow: Overflow,
}

impl Default for ActorConfig {
    fn default() -> Self {
        Self {
            capacity: 4,
            overflow: Overflow::Block(Duration::from_millis(100)),
        }
    }
}

impl ActorConfig {
    /// Set the mailbox capacity (number of queued requests).
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Set the full-mailbox behavior for sync calls.
    pub fn with_overflow(mut self, overflow: Overflow) -> Self {
        self.overflow = overflow;
        self
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn overflow(&self) -> Overflow {
        self.overflow
    }
}
