//! Errors reported by the frame table.

use core::fmt;

use crate::{PageRef, PhysicalAddress};

/// Errors that can occur during frame table operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameError {
    /// The allocator is exhausted and eviction could not free a frame.
    OutOfMemory,
    /// An eviction sweep found no frame that is both unpinned and not recently used.
    NoEvictableFrame,
    /// No live frame is registered at the given address.
    NotRegistered(PhysicalAddress),
    /// The page is already resident in the frame at the given address.
    AlreadyResident(PageRef, PhysicalAddress),
    /// The frame at the given address has no sharers and cannot be unpinned.
    NoSharers(PhysicalAddress),
}

impl fmt::Display for FrameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfMemory => write!(f, "out of physical frames"),
            Self::NoEvictableFrame => write!(f, "no evictable frame"),
            Self::NotRegistered(addr) => write!(f, "no frame registered at {}", addr),
            Self::AlreadyResident(page, addr) => {
                write!(f, "{:?} is already resident in frame {}", page, addr)
            }
            Self::NoSharers(addr) => write!(f, "frame {} has no sharers", addr),
        }
    }
}

impl core::error::Error for FrameError {}

/// A violated frame table invariant, reported by
/// [`FrameTable::check_invariants`](crate::FrameTable::check_invariants).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvariantViolation {
    /// A frame is in the address index but not in the clock order.
    MissingFromClock(PhysicalAddress),
    /// A frame is in the clock order but not in the address index.
    MissingFromIndex(PhysicalAddress),
    /// The address index and the clock order hold different numbers of frames.
    IndexSizeMismatch { index: usize, clock: usize },
    /// An unpinned frame has no sharers.
    UnpinnedWithoutSharers(PhysicalAddress),
    /// A page is a sharer of more than one frame, or the residency index disagrees with the
    /// frame's sharer set.
    ResidencyMismatch(PageRef),
}

impl fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingFromClock(addr) => write!(f, "frame {} missing from clock order", addr),
            Self::MissingFromIndex(addr) => write!(f, "frame {} missing from address index", addr),
            Self::IndexSizeMismatch { index, clock } => write!(
                f,
                "address index holds {} frames but clock order holds {}",
                index, clock
            ),
            Self::UnpinnedWithoutSharers(addr) => {
                write!(f, "unpinned frame {} has no sharers", addr)
            }
            Self::ResidencyMismatch(page) => write!(f, "residency of {:?} is inconsistent", page),
        }
    }
}

impl core::error::Error for InvariantViolation {}
