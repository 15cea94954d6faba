use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IpcError {
    /// Application payload does not fit the fixed message size.
    PayloadTooLarge(usize),
    /// The peer's mailbox is full; the caller may retry later.
    MailboxFull,
}

impl fmt::Display for IpcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IpcError::PayloadTooLarge(len) => {
                write!(f, "payload too large: {len} bytes")
            }
            IpcError::MailboxFull => write!(f, "peer mailbox full"),
        }
    }
}

impl std::error::Error for IpcError {}
