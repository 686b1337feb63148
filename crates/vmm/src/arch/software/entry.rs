//! Page table entry for software emulation.

use crate::PhysicalAddress;

use super::{PAGE_SIZE, flags::PageFlags};

/// A single page table entry for software emulation.
///
/// The entry format:
/// - Bits 0-7: Flags (same positions as x86_64)
/// - Bits 8-19: Frame number (physical address >> 4)
/// - Bits 20-63: Reserved (zero)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(transparent)]
pub struct PageEntry(usize);

impl PageEntry {
    /// Flag bits mask (bits 0-7).
    const FLAGS_MASK: usize = 0xFF;

    /// Shift of the frame number field.
    const FRAME_SHIFT: usize = 8;

    /// Frame number mask, after shifting (12 bits).
    const FRAME_MASK: usize = 0xFFF;

    /// Creates a new page table entry.
    ///
    /// The physical address must be page-aligned (lowest 4 bits must be zero for 16-byte pages).
    pub fn new(address: PhysicalAddress, flags: PageFlags) -> Self {
        debug_assert!(
            address.is_aligned(PAGE_SIZE),
            "physical address must be page-aligned (16-byte alignment)"
        );

        let frame = (address.as_usize() / PAGE_SIZE) & Self::FRAME_MASK;
        let flag_bits = flags.to_raw() & Self::FLAGS_MASK;
        Self((frame << Self::FRAME_SHIFT) | flag_bits)
    }

    /// Returns the physical address stored in this entry.
    ///
    /// Returns None if the entry is not present.
    pub fn address(self) -> Option<PhysicalAddress> {
        if self.is_present() {
            let frame = (self.0 >> Self::FRAME_SHIFT) & Self::FRAME_MASK;
            Some(PhysicalAddress::new(frame * PAGE_SIZE))
        } else {
            None
        }
    }

    /// Returns the flags for this entry.
    pub fn flags(self) -> PageFlags {
        PageFlags::from_raw(self.0 & Self::FLAGS_MASK)
    }

    /// Sets the flags for this entry, preserving the address.
    pub fn set_flags(&mut self, flags: PageFlags) {
        let frame_bits = self.0 & !Self::FLAGS_MASK;
        self.0 = frame_bits | (flags.to_raw() & Self::FLAGS_MASK);
    }

    /// Returns whether this entry is present (valid).
    pub fn is_present(self) -> bool {
        self.flags().is_present()
    }

    /// Returns whether the MMU has accessed this page since the bit was last cleared.
    pub fn is_accessed(self) -> bool {
        self.flags().is_accessed()
    }

    /// Sets the accessed bit, as the emulated MMU does on every access.
    pub fn mark_accessed(&mut self) {
        let mut flags = self.flags();
        flags.set_accessed(true);
        self.set_flags(flags);
    }

    /// Clears the accessed bit.
    pub fn clear_accessed(&mut self) {
        let mut flags = self.flags();
        flags.set_accessed(false);
        self.set_flags(flags);
    }

    /// Returns whether the page has been written since it was mapped.
    pub fn is_dirty(self) -> bool {
        self.flags().is_dirty()
    }

    /// Returns the raw usize value of this entry.
    pub const fn as_usize(self) -> usize {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn present() -> PageFlags {
        let mut flags = PageFlags::empty();
        flags.set_present(true);
        flags
    }

    #[test]
    fn stores_address_and_flags() {
        let entry = PageEntry::new(PhysicalAddress::new(0x1230), present());
        assert_eq!(entry.address(), Some(PhysicalAddress::new(0x1230)));
        assert!(entry.is_present());
        assert!(!entry.is_accessed());
    }

    #[test]
    fn not_present_has_no_address() {
        let entry = PageEntry::new(PhysicalAddress::new(0x1230), PageFlags::empty());
        assert_eq!(entry.address(), None);
    }

    #[test]
    fn accessed_bit_round_trip_preserves_address() {
        let mut entry = PageEntry::new(PhysicalAddress::new(0xFFF0), present());

        entry.mark_accessed();
        assert!(entry.is_accessed());
        assert_eq!(entry.address(), Some(PhysicalAddress::new(0xFFF0)));

        entry.clear_accessed();
        assert!(!entry.is_accessed());
        assert!(entry.is_present());
        assert_eq!(entry.address(), Some(PhysicalAddress::new(0xFFF0)));
    }
}
