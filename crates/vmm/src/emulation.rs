//! Host-side implementations of the frame table's collaborators.
//!
//! These stand in for the kernel's page allocator, page tables and page service when the
//! frame table runs outside the kernel: in unit tests and, with the `software-emulation`
//! feature, in hosted tools. They use the software-emulated page entry layout.

use alloc::collections::{BTreeMap, BTreeSet};
use alloc::sync::Arc;
use alloc::vec::Vec;

use spin::Mutex;

use crate::{
    AddressSpaceId, AllocFlags, FrameAllocator, LeafEntries, PageRef, PageService,
    PhysicalAddress, VirtualAddress,
    arch::{self, PageEntry, PageFlags},
};

struct AllocatorState {
    free: Vec<PhysicalAddress>,
    allocated: BTreeSet<PhysicalAddress>,
}

/// A fixed pool of contiguous emulated frames.
///
/// Frames are handed out lowest address first and a freed frame is the next one handed out.
pub struct EmulatedFrameAllocator {
    state: Mutex<AllocatorState>,
}

impl EmulatedFrameAllocator {
    /// Creates a pool of `frames` frames starting at `base`.
    ///
    /// # Panics
    ///
    /// Panics if `base` is not page-aligned.
    pub fn new(base: PhysicalAddress, frames: usize) -> Self {
        assert!(base.is_page_aligned(), "pool base must be page-aligned");
        let free = (0..frames)
            .rev()
            .map(|index| base + index * arch::PAGE_SIZE)
            .collect();

        Self {
            state: Mutex::new(AllocatorState {
                free,
                allocated: BTreeSet::new(),
            }),
        }
    }

    /// Number of frames currently free.
    pub fn free_frames(&self) -> usize {
        self.state.lock().free.len()
    }

    /// Number of frames currently handed out.
    pub fn allocated_frames(&self) -> usize {
        self.state.lock().allocated.len()
    }
}

impl FrameAllocator for EmulatedFrameAllocator {
    fn allocate(&self, flags: AllocFlags) -> Option<PhysicalAddress> {
        let mut state = self.state.lock();
        let Some(frame) = state.free.pop() else {
            assert!(
                !flags.contains(AllocFlags::ASSERT),
                "emulated frame pool exhausted"
            );
            return None;
        };
        state.allocated.insert(frame);
        Some(frame)
    }

    fn free(&self, frame: PhysicalAddress) {
        let mut state = self.state.lock();
        assert!(
            state.allocated.remove(&frame),
            "frame {} freed but not allocated",
            frame
        );
        state.free.push(frame);
    }
}

/// Leaf page table entries of every emulated address space.
///
/// Each entry is keyed by the page it maps. [`touch`](Self::touch) and
/// [`write`](Self::write) play the part of the MMU.
#[derive(Default)]
pub struct EmulatedPageTables {
    entries: Mutex<BTreeMap<PageRef, PageEntry>>,
}

impl EmulatedPageTables {
    /// Creates empty page tables.
    pub fn new() -> Self {
        Self::default()
    }

    /// Maps `page` to `frame` as a present, writable user page.
    pub fn map(&self, page: PageRef, frame: PhysicalAddress) {
        let mut flags = PageFlags::empty();
        flags.set_present(true);
        flags.set_writable(true);
        flags.set_user(true);
        self.entries.lock().insert(page, PageEntry::new(frame, flags));
    }

    /// Removes the mapping of `page`, returning the old entry.
    pub fn unmap(&self, page: PageRef) -> Option<PageEntry> {
        self.entries.lock().remove(&page)
    }

    /// Returns the frame `page` is mapped to.
    pub fn translate(&self, page: PageRef) -> Option<PhysicalAddress> {
        self.entries.lock().get(&page).and_then(|entry| entry.address())
    }

    /// Records a read of `page`.
    pub fn touch(&self, page: PageRef) {
        self.access(page, false);
    }

    /// Records a write to `page`.
    pub fn write(&self, page: PageRef) {
        self.access(page, true);
    }

    /// Returns true if the accessed bit of `page` is set.
    pub fn is_accessed(&self, page: PageRef) -> bool {
        self.entries
            .lock()
            .get(&page)
            .is_some_and(|entry| entry.is_accessed())
    }

    fn access(&self, page: PageRef, write: bool) {
        let mut entries = self.entries.lock();
        let Some(entry) = entries.get_mut(&page) else {
            return;
        };
        if !entry.is_present() {
            return;
        }

        entry.mark_accessed();
        if write {
            let mut flags = entry.flags();
            assert!(flags.is_writable(), "write to read-only {:?}", page);
            flags.set_dirty(true);
            entry.set_flags(flags);
        }
    }
}

impl LeafEntries for EmulatedPageTables {
    fn entry(&self, space: AddressSpaceId, vaddr: VirtualAddress) -> Option<PageEntry> {
        self.entries.lock().get(&PageRef::new(space, vaddr)).copied()
    }

    fn update(&self, space: AddressSpaceId, vaddr: VirtualAddress, entry: PageEntry) {
        if let Some(current) = self.entries.lock().get_mut(&PageRef::new(space, vaddr)) {
            *current = entry;
        }
    }
}

/// One call to [`PageService::unload`] observed by the [`EmulatedPageService`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Unload {
    /// The page that was unloaded.
    pub page: PageRef,
    /// The frame it was unloaded from.
    pub frame: PhysicalAddress,
    /// The pin hint passed by the frame table.
    pub pinned: bool,
    /// Whether the page was dirty and had to be written back.
    pub flushed: bool,
}

#[derive(Default)]
struct ServiceState {
    resident: BTreeMap<PageRef, PhysicalAddress>,
    unloads: Vec<Unload>,
}

/// A page service that keeps pages in emulated page tables and logs every unload.
pub struct EmulatedPageService {
    page_tables: Arc<EmulatedPageTables>,
    state: Mutex<ServiceState>,
}

impl EmulatedPageService {
    /// Creates a page service with its own page tables.
    pub fn new() -> Self {
        Self::with_page_tables(Arc::new(EmulatedPageTables::new()))
    }

    /// Creates a page service that maps pages in `page_tables`.
    pub fn with_page_tables(page_tables: Arc<EmulatedPageTables>) -> Self {
        Self {
            page_tables,
            state: Mutex::new(ServiceState::default()),
        }
    }

    /// The page tables pages are mapped in.
    pub fn page_tables(&self) -> &Arc<EmulatedPageTables> {
        &self.page_tables
    }

    /// Loads `page` into `frame` and maps it, as the page fault handler would.
    pub fn install(&self, page: PageRef, frame: PhysicalAddress) {
        self.state.lock().resident.insert(page, frame);
        self.page_tables.map(page, frame);
    }

    /// Returns true if `page` is loaded.
    pub fn is_resident(&self, page: PageRef) -> bool {
        self.state.lock().resident.contains_key(&page)
    }

    /// Returns every unload performed so far, in order.
    pub fn unloads(&self) -> Vec<Unload> {
        self.state.lock().unloads.clone()
    }
}

impl Default for EmulatedPageService {
    fn default() -> Self {
        Self::new()
    }
}

impl PageService for EmulatedPageService {
    fn unload(&self, page: PageRef, frame: PhysicalAddress, pinned: bool) {
        let loaded_at = self.state.lock().resident.remove(&page);
        assert_eq!(
            loaded_at,
            Some(frame),
            "{:?} unloaded from {} but was not loaded there",
            page,
            frame
        );

        let flushed = self
            .page_tables
            .unmap(page)
            .is_some_and(|entry| entry.is_dirty());

        // Stands in for the write-back, giving other threads a chance to run.
        std::thread::yield_now();

        self.state.lock().unloads.push(Unload {
            page,
            frame,
            pinned,
            flushed,
        });
    }

    fn find_owner(&self, space: AddressSpaceId, frame: PhysicalAddress) -> Option<PageRef> {
        self.state
            .lock()
            .resident
            .iter()
            .find(|&(page, &loaded_at)| page.space() == space && loaded_at == frame)
            .map(|(page, _)| *page)
    }
}
