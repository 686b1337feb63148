//! Logical pages as seen by the frame table.
//!
//! Logical pages are owned by the page service (the supplemental page table and its backing
//! store). The frame table only stores [`PageRef`]s, plain copyable identifiers, so that a
//! frame never keeps a page alive and dropping a sharer never frees anything.

use core::fmt;

use crate::{AddressSpaceId, PhysicalAddress, VirtualAddress};

/// Reference to a logical page: the page mapped at `vaddr` in address space `space`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PageRef {
    space: AddressSpaceId,
    vaddr: VirtualAddress,
}

impl PageRef {
    /// Creates a reference to the page at `vaddr` in `space`.
    ///
    /// # Panics
    ///
    /// Panics if `vaddr` is not page-aligned.
    pub const fn new(space: AddressSpaceId, vaddr: VirtualAddress) -> Self {
        assert!(vaddr.is_page_aligned(), "page address must be page-aligned");
        Self { space, vaddr }
    }

    /// The address space this page belongs to.
    pub const fn space(self) -> AddressSpaceId {
        self.space
    }

    /// The virtual address of the page within its address space.
    pub const fn vaddr(self) -> VirtualAddress {
        self.vaddr
    }
}

impl fmt::Debug for PageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PageRef({}, {})", self.space, self.vaddr)
    }
}

/// Loading and unloading of logical pages, provided by the virtual memory subsystem.
///
/// Implementations may block on backing-store I/O inside [`PageService::unload`]. The frame
/// table never holds the table lock or a frame's sharer lock while calling into this trait.
pub trait PageService {
    /// Evicts `page` from the frame at `frame`.
    ///
    /// Must write dirty data back to the page's backing store (executable image, mapped file
    /// or swap), invalidate the mapping in the page's address space and mark the page
    /// non-resident. Must not free the page record itself. `pinned` reports whether the frame
    /// was pinned when the unload was requested.
    fn unload(&self, page: PageRef, frame: PhysicalAddress, pinned: bool);

    /// Returns the page of `space` that the page service believes is resident in `frame`.
    fn find_owner(&self, space: AddressSpaceId, frame: PhysicalAddress) -> Option<PageRef>;
}
