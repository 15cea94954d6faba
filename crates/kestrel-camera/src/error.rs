use kestrel_actor::ActorError;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CameraError {
    /// Invalid request parameters; rejected before touching hardware.
    Config(String),
    /// A single driver/bus operation failed. No automatic retry here.
    Driver(String),
    /// No free frame buffer, or the actor mailbox stayed full.
    Exhausted,
    /// A completed capture did not arrive within the bounded wait.
    CaptureTimeout,
    /// A pool handle was used after the slot was returned.
    StaleFrame,
    Actor(ActorError),
}

impl fmt::Display for CameraError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CameraError::Config(msg) => write!(f, "configuration error: {msg}"),
            CameraError::Driver(msg) => write!(f, "driver error: {msg}"),
            CameraError::Exhausted => write!(f, "resource exhausted"),
            CameraError::CaptureTimeout => write!(f, "no completed capture within bound"),
            CameraError::StaleFrame => write!(f, "stale frame handle"),
            CameraError::Actor(err) => write!(f, "actor error: {err}"),
        }
    }
}

impl std::error::Error for CameraError {}

impl From<ActorError> for CameraError {
    fn from(err: ActorError) -> Self {
        match err {
            ActorError::MailboxFull => CameraError::Exhausted,
            other => CameraError::Actor(other),
        }
    }
}
