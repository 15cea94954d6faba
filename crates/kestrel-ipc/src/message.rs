use crate::IpcError;

/// Fixed application payload size; together with the tag this keeps every
/// message the same size in the shared mailbox.
pub const PAYLOAD_LEN: usize = 60;

/// System-reserved message kinds, handled inside the messenger before the
/// application handler runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SystemTag {
    /// The peer core finished its bring-up and is accepting messages.
    PeerReady,
    /// One line of the peer's console ring, relayed for logging.
    ConsoleLine,
}

/// Message discriminant. Application tags are forwarded verbatim to the
/// registered handler.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MessageTag {
    System(SystemTag),
    App(u8),
}

/// Fixed-size tagged payload exchanged between the two cores.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CoreMessage {
    pub tag: MessageTag,
    pub payload: [u8; PAYLOAD_LEN],
}

impl CoreMessage {
    /// Build an application message, copying `data` into the fixed
    /// payload (zero-padded).
    pub fn app(tag: u8, data: &[u8]) -> Result<Self, IpcError> {
        if data.len() > PAYLOAD_LEN {
            return Err(IpcError::PayloadTooLarge(data.len()));
        }
        let mut payload = [0u8; PAYLOAD_LEN];
        payload[..data.len()].copy_from_slice(data);
        Ok(Self {
            tag: MessageTag::App(tag),
            payload,
        })
    }

    /// Build a system message with an empty payload.
    pub fn system(tag: SystemTag) -> Self {
        Self {
            tag: MessageTag::System(tag),
            payload: [0u8; PAYLOAD_LEN],
        }
    }

    /// Build a console-line relay message; the line is truncated to the
    /// payload size.
    pub fn console_line(line: &str) -> Self {
        let mut payload = [0u8; PAYLOAD_LEN];
        let bytes = line.as_bytes();
        let len = bytes.len().min(PAYLOAD_LEN);
        payload[..len].copy_from_slice(&bytes[..len]);
        Self {
            tag: MessageTag::System(SystemTag::ConsoleLine),
            payload,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_payload_is_zero_padded() {
        let msg = CoreMessage::app(3, &[1, 2, 3]).unwrap();
        assert_eq!(msg.tag, MessageTag::App(3));
        assert_eq!(&msg.payload[..3], &[1, 2, 3]);
        assert!(msg.payload[3..].iter().all(|&b| b == 0));
    }

    #[test]
    fn oversized_payload_is_rejected() {
        let data = [0u8; PAYLOAD_LEN + 1];
        assert_eq!(
            CoreMessage::app(0, &data).unwrap_err(),
            IpcError::PayloadTooLarge(PAYLOAD_LEN + 1)
        );
    }

    #[test]
    fn console_line_truncates() {
        let long = "x".repeat(PAYLOAD_LEN * 2);
        let msg = CoreMessage::console_line(&long);
        assert!(msg.payload.iter().all(|&b| b == b'x'));
    }
}
