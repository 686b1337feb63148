//! Software emulation of the page table entry layout.
//!
//! The software-emulated architecture is a "scale model" of x86_64:
//! - 16-bit physical and virtual addresses (vs 48-bit on x86_64)
//! - 16-byte pages (vs 4 KiB on x86_64)
//! - the same flag bit positions as x86_64 for the low eight flags
//!
//! This keeps frame tables built in tests tiny while still exercising the accessed-bit
//! protocol exactly as the hardware implementation does.

mod entry;
mod flags;

pub use entry::PageEntry;
pub use flags::PageFlags;

/// Maximum number of bits in a physical address for software emulation.
pub const MAX_PHYSICAL_BITS: usize = 16;

/// Maximum number of bits in a virtual address for software emulation.
pub const MAX_VIRTUAL_BITS: usize = 16;

/// Page size in bytes (16 bytes = 2^4).
pub const PAGE_SIZE: usize = 16;

/// Validates a physical address for software emulation.
///
/// Physical addresses must fit within 16 bits.
#[inline]
pub const fn validate_physical(addr: usize) -> bool {
    addr <= 0xFFFF
}

/// Validates a virtual address for software emulation.
///
/// Virtual addresses must be canonical (bits 16-63 must be sign-extended from bit 15).
#[inline]
pub const fn validate_virtual(addr: usize) -> bool {
    let canonical = if (addr & 0x8000) != 0 {
        addr | 0xFFFF_FFFF_FFFF_0000
    } else {
        addr & 0xFFFF
    };
    canonical == addr
}
