//! Per-frame state.

use alloc::vec::Vec;
use core::fmt;
use core::sync::atomic::{AtomicU8, Ordering};

use spin::{Mutex, MutexGuard};

use crate::{PageRef, PhysicalAddress};

/// Stable identifier of a frame record: its slot in the frame table's dense record table.
///
/// Slots are reused once a frame is destroyed, so a `FrameId` is only meaningful together with
/// the frame's physical address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FrameId(pub(crate) usize);

impl FrameId {
    /// Returns the raw slot index.
    pub const fn as_usize(self) -> usize {
        self.0
    }
}

enum FrameFlag {
    /// Frame must not be chosen by the eviction engine.
    Pinned = 1 << 0,
    /// Frame has been removed from the table; set once and never cleared.
    Retired = 1 << 1,
}

/// Atomic flags for a registered frame.
struct FrameFlags(AtomicU8);

impl FrameFlags {
    const fn from_bits(initial: u8) -> Self {
        Self(AtomicU8::new(initial))
    }

    fn set(&self, flag: FrameFlag) {
        self.0.fetch_or(flag as u8, Ordering::AcqRel);
    }

    fn clear(&self, flag: FrameFlag) {
        self.0.fetch_and(!(flag as u8), Ordering::AcqRel);
    }

    fn test(&self, flag: FrameFlag) -> bool {
        (self.0.load(Ordering::Acquire) & flag as u8) != 0
    }
}

/// A physical frame registered in the frame table.
///
/// The sharer set holds every logical page currently resident in the frame; more than one
/// when the frame backs a shared mapping. It is guarded by its own lock so that pages of
/// different frames can be added and removed without contending on the table lock.
pub struct Frame {
    address: PhysicalAddress,
    id: FrameId,
    sequence: u64,
    flags: FrameFlags,
    sharers: Mutex<Vec<PageRef>>,
}

impl Frame {
    /// Creates a pinned frame with no sharers.
    pub(crate) fn new(address: PhysicalAddress, id: FrameId, sequence: u64) -> Self {
        Self {
            address,
            id,
            sequence,
            flags: FrameFlags::from_bits(FrameFlag::Pinned as u8),
            sharers: Mutex::new(Vec::new()),
        }
    }

    /// The physical address of the frame.
    pub fn address(&self) -> PhysicalAddress {
        self.address
    }

    /// The frame's slot in the frame table.
    pub fn id(&self) -> FrameId {
        self.id
    }

    /// Insertion sequence number; larger is newer.
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Returns true if the eviction engine must skip this frame.
    pub fn is_pinned(&self) -> bool {
        self.flags.test(FrameFlag::Pinned)
    }

    /// Returns true once the frame has been removed from the table. A retired frame handle
    /// only describes the past; its address may already belong to a new frame.
    pub fn is_retired(&self) -> bool {
        self.flags.test(FrameFlag::Retired)
    }

    /// Returns a copy of the current sharer set.
    pub fn sharers(&self) -> Vec<PageRef> {
        self.sharers.lock().clone()
    }

    /// Returns the number of sharers.
    pub fn sharer_count(&self) -> usize {
        self.sharers.lock().len()
    }

    pub(crate) fn set_pinned(&self, pinned: bool) {
        if pinned {
            self.flags.set(FrameFlag::Pinned);
        } else {
            self.flags.clear(FrameFlag::Pinned);
        }
    }

    pub(crate) fn retire(&self) {
        self.flags.set(FrameFlag::Retired);
    }

    pub(crate) fn lock_sharers(&self) -> MutexGuard<'_, Vec<PageRef>> {
        self.sharers.lock()
    }
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Frame")
            .field("address", &self.address)
            .field("id", &self.id)
            .field("sequence", &self.sequence)
            .field("pinned", &self.is_pinned())
            .field("retired", &self.is_retired())
            .finish_non_exhaustive()
    }
}
