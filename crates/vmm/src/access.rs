//! Hardware "accessed" bit interface.
//!
//! The clock algorithm approximates LRU with the accessed bit the MMU sets in a leaf page
//! table entry whenever the page is touched. [`AccessBits`] is the interface the eviction
//! engine uses; [`PageTableAccess`] implements it on top of any source of leaf entries.

use alloc::sync::Arc;

use crate::{AddressSpaceId, VirtualAddress, arch::PageEntry};

/// Query and reset of the per-mapping accessed bit.
pub trait AccessBits {
    /// Returns true if the page at `vaddr` in `space` was accessed since the bit was last
    /// cleared. Returns false if there is no mapping. Has no side effects.
    fn was_accessed(&self, space: AddressSpaceId, vaddr: VirtualAddress) -> bool;

    /// Clears the accessed bit of the page at `vaddr` in `space`. The bit is never cleared
    /// automatically.
    fn clear_accessed(&self, space: AddressSpaceId, vaddr: VirtualAddress);
}

/// Access to the leaf page table entries of every address space.
pub trait LeafEntries {
    /// Returns the leaf entry mapping `vaddr` in `space`, if any.
    fn entry(&self, space: AddressSpaceId, vaddr: VirtualAddress) -> Option<PageEntry>;

    /// Overwrites the leaf entry mapping `vaddr` in `space`.
    ///
    /// Implementations must invalidate any cached translation of `vaddr` so that the MMU
    /// observes the new entry.
    fn update(&self, space: AddressSpaceId, vaddr: VirtualAddress, entry: PageEntry);
}

impl<T: LeafEntries + ?Sized> LeafEntries for Arc<T> {
    fn entry(&self, space: AddressSpaceId, vaddr: VirtualAddress) -> Option<PageEntry> {
        (**self).entry(space, vaddr)
    }

    fn update(&self, space: AddressSpaceId, vaddr: VirtualAddress, entry: PageEntry) {
        (**self).update(space, vaddr, entry)
    }
}

/// [`AccessBits`] backed by the accessed bit of leaf page table entries.
pub struct PageTableAccess<L> {
    entries: L,
}

impl<L: LeafEntries> PageTableAccess<L> {
    /// Wraps a source of leaf page table entries.
    pub const fn new(entries: L) -> Self {
        Self { entries }
    }

    /// Returns the wrapped entry source.
    pub fn entries(&self) -> &L {
        &self.entries
    }
}

impl<L: LeafEntries> AccessBits for PageTableAccess<L> {
    fn was_accessed(&self, space: AddressSpaceId, vaddr: VirtualAddress) -> bool {
        self.entries
            .entry(space, vaddr)
            .is_some_and(|entry| entry.is_present() && entry.is_accessed())
    }

    fn clear_accessed(&self, space: AddressSpaceId, vaddr: VirtualAddress) {
        if let Some(mut entry) = self.entries.entry(space, vaddr) {
            entry.clear_accessed();
            self.entries.update(space, vaddr, entry);
        }
    }
}
