pub mod logging;

pub use logging::{RingLogger, StdoutLogger, init_ring_logger, init_stdout_logger};

// Re-export log so downstream crates can use kestrel_base::log::*
pub use log;
