//! Interface to the physical page allocator.

use crate::PhysicalAddress;

bitflags::bitflags! {
    /// Flags forwarded to the physical page allocator with every frame request.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct AllocFlags: u32 {
        /// Panic inside the allocator instead of reporting exhaustion.
        const ASSERT = 1 << 0;
        /// Zero-fill the frame before returning it.
        const ZERO = 1 << 1;
        /// Take the frame from the user pool rather than the kernel pool.
        const USER = 1 << 2;
    }
}

/// A source of fixed-size physical frames.
///
/// The frame table owns every frame it obtains from the allocator and returns each one through
/// [`FrameAllocator::free`] exactly once.
pub trait FrameAllocator {
    /// Allocates one page-aligned frame, or returns `None` when no frame is free.
    ///
    /// Must not block waiting for memory; exhaustion is the frame table's cue to evict.
    fn allocate(&self, flags: AllocFlags) -> Option<PhysicalAddress>;

    /// Returns a frame previously handed out by [`FrameAllocator::allocate`] to the free pool.
    fn free(&self, frame: PhysicalAddress);
}
