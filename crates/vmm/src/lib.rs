#![cfg_attr(not(any(test, feature = "software-emulation")), no_std)]

//! # Polaris Virtual Memory (VMM)
//!
//! The frame table of the Polaris virtual memory subsystem. It provides:
//!
//! - A registry of every physical frame that holds user pages, keyed by physical address.
//! - Shared frames: one frame may back the same page in several address spaces.
//! - Second-chance (clock) page replacement when physical memory runs out.
//! - Software emulation of its collaborators for testing in non-kernel environments.
//!
//! The table does not allocate physical memory, walk page tables or perform I/O itself. It
//! drives three collaborators instead: a [`FrameAllocator`], an [`AccessBits`] source and a
//! [`PageService`].

extern crate alloc;

mod access;
mod address;
mod address_space;
mod allocator;
mod arch;
mod config;
#[cfg(any(test, feature = "software-emulation"))]
mod emulation;
mod error;
mod eviction;
mod frame;
mod page;
mod stats;
mod table;

pub use access::{AccessBits, LeafEntries, PageTableAccess};
pub use address::{PhysicalAddress, VirtualAddress};
pub use address_space::AddressSpaceId;
pub use allocator::{AllocFlags, FrameAllocator};
pub use config::{ClockHand, FrameTableConfig};
#[cfg(any(test, feature = "software-emulation"))]
pub use emulation::{EmulatedFrameAllocator, EmulatedPageService, EmulatedPageTables, Unload};
pub use error::{FrameError, InvariantViolation};
pub use frame::{Frame, FrameId};
pub use page::{PageRef, PageService};
pub use stats::FrameTableStats;
pub use table::FrameTable;

pub use arch::{PAGE_SIZE, PageEntry, PageFlags};
