use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActorError {
    /// The mailbox stayed full past the configured bound.
    MailboxFull,
    /// No response arrived within the caller's deadline.
    Timeout,
    /// The worker thread is gone; only possible if every actor handle was
    /// dropped while a call was in flight.
    WorkerGone,
}

impl fmt::Display for ActorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActorError::MailboxFull => write!(f, "mailbox full"),
            ActorError::Timeout => write!(f, "response deadline exceeded"),
            ActorError::WorkerGone => write!(f, "worker terminated"),
        }
    }
}

impl std::error::Error for ActorError {}
