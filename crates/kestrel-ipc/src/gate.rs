/// Identity of a core in the two-party gate scheme. Exactly two
/// participants exist; each holds its identity for the process lifetime.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CoreId {
    Primary,
    Secondary,
}

impl CoreId {
    pub fn peer(&self) -> CoreId {
        match self {
            CoreId::Primary => CoreId::Secondary,
            CoreId::Secondary => CoreId::Primary,
        }
    }

    /// Index presented to the gate hardware.
    pub fn index(&self) -> u8 {
        match self {
            CoreId::Primary => 0,
            CoreId::Secondary => 1,
        }
    }
}

/// Hardware mutual-exclusion gate shared between exactly the two cores.
///
/// `lock` blocks until the gate is held by `core`; `unlock` releases it.
/// The gate is held only across short mailbox read/write sections, never
/// while waiting for anything else.
pub trait HardwareGate: Send + Sync {
    fn lock(&self, core: CoreId);
    fn unlock(&self, core: CoreId);
}

/// RAII guard for the gate; the critical section is its scope.
pub struct GateGuard<'a> {
    gate: &'a dyn HardwareGate,
    core: CoreId,
}

impl<'a> GateGuard<'a> {
    pub fn new(gate: &'a dyn HardwareGate, core: CoreId) -> Self {
        gate.lock(core);
        Self { gate, core }
    }
}

impl Drop for GateGuard<'_> {
    fn drop(&mut self) {
        self.gate.unlock(self.core);
    }
}
