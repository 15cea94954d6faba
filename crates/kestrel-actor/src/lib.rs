//! Single-consumer request/response workers for hardware-owning subsystems.
//!
//! Every subsystem that owns a piece of hardware exclusively (sensor,
//! accelerator bus, power rails) is built on one [`Actor`]: a dedicated
//! worker thread bound to one bounded mailbox. All requests against the
//! actor are strictly ordered and dispatched one at a time, which is the
//! sole serialization mechanism for the owned device. Callers either await
//! a response (a sync call with a deadline) or hand over a continuation
//! that the worker invokes before its next dequeue.

pub mod actor;
pub mod config;
pub mod error;

pub use actor::{Actor, Handler};
pub use config::{ActorConfig, Overflow};
pub use error::ActorError;
