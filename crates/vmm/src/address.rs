//! Address types for physical frames and virtual pages.
//!
//! The frame table keys every frame by its physical address and every resident page by the
//! virtual address it is mapped at. Both are thin newtypes over `usize` validated against the
//! active architecture.

use core::fmt;
use core::ops::Add;

use crate::arch;

/// Macro to define common address type functionality.
///
/// This macro generates the basic structure and methods common to both physical
/// and virtual address types, reducing code duplication.
macro_rules! impl_address_common {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        #[repr(transparent)]
        pub struct $name(usize);

        impl $name {
            /// Returns the raw address value.
            #[inline]
            pub const fn as_usize(self) -> usize {
                self.0
            }

            /// Checks if the address is aligned to the given alignment.
            ///
            /// # Panics
            ///
            /// Panics if `align` is not a power of two.
            #[inline]
            pub const fn is_aligned(self, align: usize) -> bool {
                assert!(align.is_power_of_two(), "alignment must be a power of two");
                self.0 & (align - 1) == 0
            }

            /// Returns true if this address is the start of a page.
            #[inline]
            pub const fn is_page_aligned(self) -> bool {
                self.is_aligned(arch::PAGE_SIZE)
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({:#x})", stringify!($name), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{:#x}", self.0)
            }
        }

        impl Add<usize> for $name {
            type Output = Self;

            #[inline]
            fn add(self, rhs: usize) -> Self::Output {
                Self::new(self.0 + rhs)
            }
        }
    };
}

impl_address_common!(
    PhysicalAddress,
    "A physical memory address.\n\n\
     Frames are identified by the physical address of their first byte, so a page-aligned\n\
     `PhysicalAddress` doubles as the frame table key."
);

impl PhysicalAddress {
    /// Creates a new physical address.
    ///
    /// # Panics
    ///
    /// Panics if the address exceeds the architecture's maximum physical address width.
    #[inline]
    pub const fn new(addr: usize) -> Self {
        assert!(
            arch::validate_physical(addr),
            "physical address exceeds maximum width"
        );
        Self(addr)
    }
}

impl_address_common!(
    VirtualAddress,
    "A virtual memory address.\n\n\
     Together with an [`AddressSpaceId`](crate::AddressSpaceId) this identifies a logical page."
);

impl VirtualAddress {
    /// Creates a new virtual address.
    ///
    /// # Panics
    ///
    /// Panics if the address is not canonical for the architecture.
    #[inline]
    pub const fn new(addr: usize) -> Self {
        assert!(arch::validate_virtual(addr), "address is not canonical");
        Self(addr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn physical_new_valid_address() {
        let addr = PhysicalAddress::new(0x0100);
        assert_eq!(addr.as_usize(), 0x0100);
    }

    #[test]
    #[should_panic(expected = "physical address exceeds maximum width")]
    fn physical_new_exceeds_max() {
        let _ = PhysicalAddress::new(1usize << arch::MAX_PHYSICAL_BITS);
    }

    #[test]
    #[should_panic(expected = "address is not canonical")]
    fn virtual_new_rejects_non_canonical() {
        let _ = VirtualAddress::new(1usize << arch::MAX_VIRTUAL_BITS);
    }

    #[test]
    fn page_alignment() {
        let addr = PhysicalAddress::new(arch::PAGE_SIZE * 4);
        assert!(addr.is_page_aligned());
        assert!(!(addr + 1).is_page_aligned());
    }

    #[test]
    fn formats_as_hex() {
        let addr = VirtualAddress::new(0x0420);
        assert_eq!(format!("{}", addr), "0x420");
        assert_eq!(format!("{:?}", addr), "VirtualAddress(0x420)");
    }

    #[test]
    fn ordering_follows_numeric_value() {
        assert!(PhysicalAddress::new(0x0100) < PhysicalAddress::new(0x0200));
    }
}
