//! Accelerator attach state machine.
//!
//! An external accelerator hangs off a serial bus behind a host stack that
//! raises attach/enumeration/detach events and completes interface-select
//! and status-query calls asynchronously. This crate drives the multi-step
//! enumeration as an actor: every bus event and every completion re-enters
//! the mailbox as a request, so the sequence is fully serialized with the
//! power path.

pub mod error;
pub mod fsm;
pub mod traits;

pub use error::AccelError;
pub use fsm::{Accelerator, AccelConfig, AccelRequest, AccelResponse, AttachState, BusEvent};
pub use traits::{AcceleratorBus, BusCompletion, DeviceInfo, DeviceSignature, InterfaceDesc, PowerRail};
