use crate::CameraError;

/// Checkout token for one pool slot.
///
/// Copyable on purpose: the generation counter is what catches a handle
/// used after its slot went back to the pool.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameHandle {
    index: usize,
    generation: u32,
}

impl FrameHandle {
    pub fn index(&self) -> usize {
        self.index
    }
}

struct Slot {
    data: Vec<u8>,
    generation: u32,
    checked_out: bool,
}

/// Fixed-capacity, index-addressed frame buffer set.
///
/// A slot is owned exclusively by the pool until checked out, then
/// exclusively by the holder of the handle until released. There is no
/// internal lock; the owning actor's request serialization is the only
/// synchronization, so a holder must never reuse a handle after releasing
/// it. The per-slot generation makes such reuse an error instead of
/// silent corruption.
pub struct FramePool {
    slots: Vec<Slot>,
}

impl FramePool {
    pub fn new(count: usize, frame_size: usize) -> Self {
        let slots = (0..count)
            .map(|_| Slot {
                data: vec![0u8; frame_size],
                generation: 0,
                checked_out: false,
            })
            .collect();
        Self { slots }
    }

    /// Take exclusive ownership of a free slot, or `None` if all are out.
    pub fn checkout(&mut self) -> Option<FrameHandle> {
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if !slot.checked_out {
                slot.checked_out = true;
                return Some(FrameHandle {
                    index,
                    generation: slot.generation,
                });
            }
        }
        None
    }

    /// Return a slot to the pool. The handle (and any copy of it) is dead
    /// afterwards.
    pub fn release(&mut self, handle: FrameHandle) -> Result<(), CameraError> {
        let slot = self.live_slot_index(&handle)?;
        let slot = &mut self.slots[slot];
        slot.checked_out = false;
        // Invalidate every outstanding copy of the handle.
        slot.generation = slot.generation.wrapping_add(1);
        Ok(())
    }

    pub fn bytes(&self, handle: &FrameHandle) -> Result<&[u8], CameraError> {
        let index = self.live_slot_index(handle)?;
        Ok(&self.slots[index].data)
    }

    pub fn bytes_mut(&mut self, handle: &FrameHandle) -> Result<&mut [u8], CameraError> {
        let index = self.live_slot_index(handle)?;
        Ok(&mut self.slots[index].data)
    }

    pub fn free_count(&self) -> usize {
        self.slots.iter().filter(|s| !s.checked_out).count()
    }

    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    fn live_slot_index(&self, handle: &FrameHandle) -> Result<usize, CameraError> {
        let slot = self
            .slots
            .get(handle.index)
            .ok_or(CameraError::StaleFrame)?;
        if !slot.checked_out || slot.generation != handle.generation {
            return Err(CameraError::StaleFrame);
        }
        Ok(handle.index)
    }
}
