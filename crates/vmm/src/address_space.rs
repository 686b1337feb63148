//! Address space identity.
//!
//! The frame table never touches an address space's page tables directly; it only needs to
//! tell sharers from different address spaces apart and hand the identity back to the
//! access-bit and page services. An address space is therefore represented by an opaque id.

use core::fmt;

/// Opaque identifier of a virtual address space (one per process, plus the kernel's).
///
/// In the kernel this is derived from the root page table's physical address, which is unique
/// for the lifetime of the address space.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct AddressSpaceId(usize);

impl AddressSpaceId {
    /// Creates an address space id from its raw value.
    pub const fn new(raw: usize) -> Self {
        Self(raw)
    }

    /// Returns the raw id value.
    pub const fn as_usize(self) -> usize {
        self.0
    }
}

impl fmt::Debug for AddressSpaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AddressSpaceId({:#x})", self.0)
    }
}

impl fmt::Display for AddressSpaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "as:{:#x}", self.0)
    }
}
