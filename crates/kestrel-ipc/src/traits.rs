use crate::{CoreMessage, IpcError};

/// Seam over the physical shared mailbox and doorbell.
///
/// One instance represents one core's view: `push` writes into the peer's
/// mailbox, `pop` reads from the local one. The messenger holds the
/// hardware gate around both, so implementations need no further
/// synchronization of the mailbox itself.
pub trait CoreTransport: Send + Sync {
    /// Append to the peer core's mailbox. Fails with `MailboxFull` when
    /// the fixed mailbox has no room; the caller may retry later.
    fn push(&self, msg: CoreMessage) -> Result<(), IpcError>;

    /// Take the next message from the local mailbox, if any.
    fn pop(&self) -> Option<CoreMessage>;

    /// Ring the peer's doorbell interrupt.
    fn ring(&self);

    /// Block until the local doorbell has been rung since the last wait.
    /// Spurious returns are allowed; the receive loop re-checks the
    /// mailbox regardless.
    fn wait(&self);
}
