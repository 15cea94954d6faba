//! Typed message dispatch between the two cores of the device.
//!
//! The physical shared mailbox and doorbell interrupt live elsewhere; this
//! crate owns the message-passing contract on top of them: fixed-size
//! tagged messages, FIFO delivery per sender, interception of
//! system-reserved tags before the (single) application handler, and
//! gate-guarded access to the shared mailbox with a fixed two-party
//! identity scheme.

pub mod error;
pub mod gate;
pub mod message;
pub mod messenger;
pub mod traits;

pub use error::IpcError;
pub use gate::{CoreId, GateGuard, HardwareGate};
pub use message::{CoreMessage, MessageTag, PAYLOAD_LEN, SystemTag};
pub use messenger::Messenger;
pub use traits::CoreTransport;
