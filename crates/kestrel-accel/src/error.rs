use kestrel_actor::ActorError;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccelError {
    /// A single bus operation failed.
    Bus(String),
    /// The attach sequence failed; the device is out of service until
    /// process restart.
    Halted,
    Actor(ActorError),
}

impl fmt::Display for AccelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccelError::Bus(msg) => write!(f, "bus error: {msg}"),
            AccelError::Halted => write!(f, "accelerator halted after attach failure"),
            AccelError::Actor(err) => write!(f, "actor error: {err}"),
        }
    }
}

impl std::error::Error for AccelError {}

impl From<ActorError> for AccelError {
    fn from(err: ActorError) -> Self {
        AccelError::Actor(err)
    }
}
