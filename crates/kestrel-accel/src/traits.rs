use crate::AccelError;

/// Completion callback for an asynchronous bus call.
///
/// Invoked exactly once with the success of the operation, from the host
/// stack's completion context. It may only do non-blocking work
/// (typically a mailbox enqueue).
pub type BusCompletion = Box<dyn FnOnce(bool) + Send>;

/// One advertised interface of an attached device.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InterfaceDesc {
    pub class: u8,
    pub subclass: u8,
}

/// What the host stack reports about a newly attached device.
#[derive(Clone, Debug)]
pub struct DeviceInfo {
    pub vendor_id: u16,
    pub product_id: u16,
    pub interfaces: Vec<InterfaceDesc>,
}

/// The identity an accelerator must present to be claimed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DeviceSignature {
    pub vendor_id: u16,
    pub product_id: u16,
    pub class: u8,
    pub subclass: u8,
}

impl DeviceSignature {
    /// True if `info` is the expected accelerator and advertises a
    /// matching interface.
    pub fn matches(&self, info: &DeviceInfo) -> bool {
        if info.vendor_id != self.vendor_id || info.product_id != self.product_id {
            return false;
        }
        info.interfaces
            .iter()
            .any(|i| i.class == self.class && i.subclass == self.subclass)
    }
}

/// Host-stack seam for the accelerator's bus class.
///
/// `open_class` is synchronous; the two enumeration steps complete through
/// their callbacks. All methods are called from the attach actor's worker
/// thread only.
pub trait AcceleratorBus: Send {
    /// Bind the class driver to the claimed device.
    fn open_class(&mut self) -> Result<(), AccelError>;

    /// Select the accelerator interface; `done` fires when the bus
    /// transaction completes.
    fn set_interface(&mut self, done: BusCompletion) -> Result<(), AccelError>;

    /// Query device status; `done` fires when the bus transaction
    /// completes.
    fn get_status(&mut self, done: BusCompletion) -> Result<(), AccelError>;
}

/// Power rail and reset line for the accelerator.
pub trait PowerRail: Send {
    /// Assert or deassert the supply rail.
    fn set_rail(&mut self, enable: bool);

    /// Sample the power-good signal.
    fn power_good(&self) -> bool;

    /// Assert or release the reset line.
    fn set_reset(&mut self, asserted: bool);
}
