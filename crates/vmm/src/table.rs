//! The frame table: registry of every physical frame holding user pages.
//!
//! Frame records live in a dense slot table and are referenced by [`FrameId`] from two
//! indices: the address index (physical address to frame) and the clock order (insertion
//! sequence to frame, oldest first) that the eviction engine sweeps. A third index records
//! which frame each resident page occupies.
//!
//! # Locking
//!
//! Three kinds of lock are involved, always taken in this order:
//!
//! 1. the eviction lock, held for the whole of a release or an eviction;
//! 2. a frame's sharer lock, guarding that frame's sharer set;
//! 3. the table lock, guarding the indices, held only for structural updates.
//!
//! The table lock is never held while a sharer lock is acquired, and only the eviction lock
//! may be held across a call into the [`PageService`].

use alloc::collections::BTreeMap;
use alloc::sync::Arc;
use alloc::vec::Vec;

use spin::Mutex;

use crate::eviction::ClockState;
use crate::stats::Counters;
use crate::{
    AccessBits, AddressSpaceId, AllocFlags, Frame, FrameAllocator, FrameError, FrameId,
    FrameTableConfig, FrameTableStats, InvariantViolation, PageRef, PageService, PhysicalAddress,
};

/// Index structures guarded by the table lock.
pub(crate) struct TableInner {
    slots: Vec<Option<Arc<Frame>>>,
    free_slots: Vec<usize>,
    by_address: BTreeMap<PhysicalAddress, FrameId>,
    clock: BTreeMap<u64, FrameId>,
    resident: BTreeMap<PageRef, PhysicalAddress>,
    next_sequence: u64,
}

impl TableInner {
    const fn new() -> Self {
        Self {
            slots: Vec::new(),
            free_slots: Vec::new(),
            by_address: BTreeMap::new(),
            clock: BTreeMap::new(),
            resident: BTreeMap::new(),
            next_sequence: 0,
        }
    }

    /// Registers a new pinned frame at `address` in every index.
    ///
    /// # Panics
    ///
    /// Panics if a live frame is already registered at `address`, which means the allocator
    /// handed out a frame it does not own.
    fn insert(&mut self, address: PhysicalAddress) -> Arc<Frame> {
        assert!(
            !self.by_address.contains_key(&address),
            "allocator returned frame {} which is still registered",
            address
        );

        let id = match self.free_slots.pop() {
            Some(slot) => FrameId(slot),
            None => {
                self.slots.push(None);
                FrameId(self.slots.len() - 1)
            }
        };
        let sequence = self.next_sequence;
        self.next_sequence += 1;

        let frame = Arc::new(Frame::new(address, id, sequence));
        self.slots[id.0] = Some(frame.clone());
        self.by_address.insert(address, id);
        self.clock.insert(sequence, id);
        frame
    }

    /// Deregisters `frame` from every index and frees its slot.
    ///
    /// # Panics
    ///
    /// Panics if the indices do not agree on the frame.
    fn remove(&mut self, frame: &Frame) {
        let by_address = self.by_address.remove(&frame.address());
        let by_sequence = self.clock.remove(&frame.sequence());
        if by_address != Some(frame.id()) || by_sequence != Some(frame.id()) {
            panic!(
                "frame table corrupted: {:?} indexed as {:?} by address and {:?} by sequence",
                frame, by_address, by_sequence
            );
        }
        self.slots[frame.id().0] = None;
        self.free_slots.push(frame.id().0);
    }

    fn get(&self, address: PhysicalAddress) -> Option<Arc<Frame>> {
        self.by_address.get(&address).map(|&id| self.slot(id).clone())
    }

    /// # Panics
    ///
    /// Panics if an index refers to an empty slot.
    fn slot(&self, id: FrameId) -> &Arc<Frame> {
        match self.slots.get(id.0) {
            Some(Some(frame)) => frame,
            _ => panic!("frame table corrupted: {:?} refers to an empty slot", id),
        }
    }

    /// Returns every frame in clock order, oldest first.
    pub(crate) fn clock_snapshot(&self) -> Vec<Arc<Frame>> {
        self.clock.values().map(|&id| self.slot(id).clone()).collect()
    }

    fn len(&self) -> usize {
        self.by_address.len()
    }
}

/// The physical frame table of one virtual memory subsystem.
///
/// A `FrameTable` is created once when the subsystem starts and shared by reference with
/// every caller: the page fault handler, mapping and unmapping code and process teardown.
///
/// The three collaborators are the physical allocator `A`, the hardware accessed-bit
/// interface `B` and the page service `S`.
pub struct FrameTable<A, B, S> {
    allocator: A,
    access: B,
    pages: S,
    config: FrameTableConfig,
    pub(crate) eviction: Mutex<ClockState>,
    pub(crate) inner: Mutex<TableInner>,
    pub(crate) counters: Counters,
}

impl<A, B, S> FrameTable<A, B, S>
where
    A: FrameAllocator,
    B: AccessBits,
    S: PageService,
{
    /// Creates an empty frame table with the default configuration.
    pub fn new(allocator: A, access: B, pages: S) -> Self {
        Self::with_config(allocator, access, pages, FrameTableConfig::default())
    }

    /// Creates an empty frame table.
    pub fn with_config(allocator: A, access: B, pages: S, config: FrameTableConfig) -> Self {
        Self {
            allocator,
            access,
            pages,
            config,
            eviction: Mutex::new(ClockState::new()),
            inner: Mutex::new(TableInner::new()),
            counters: Counters::new(),
        }
    }

    /// The physical allocator frames are obtained from.
    pub fn allocator(&self) -> &A {
        &self.allocator
    }

    /// The accessed-bit interface used by the eviction engine.
    pub fn access_bits(&self) -> &B {
        &self.access
    }

    /// The page service sharers are unloaded through.
    pub fn page_service(&self) -> &S {
        &self.pages
    }

    /// The table's configuration.
    pub fn config(&self) -> &FrameTableConfig {
        &self.config
    }

    /// Obtains a new frame and registers it, evicting another frame if physical memory is
    /// exhausted.
    ///
    /// The frame starts pinned and without sharers: the caller loads the page into it, adds
    /// the page with [`add_sharer`](Self::add_sharer) and then [`unpin`](Self::unpin)s it.
    ///
    /// Fails with [`FrameError::OutOfMemory`] once `max_alloc_attempts` allocator requests
    /// have failed or as soon as an eviction cannot find a victim. The allocator is always
    /// asked at least once, whatever the configuration says.
    pub fn acquire_frame(&self, flags: AllocFlags) -> Result<PhysicalAddress, FrameError> {
        let attempts = self.config.max_alloc_attempts.max(1);
        for attempt in 1..=attempts {
            if let Some(address) = self.allocator.allocate(flags) {
                debug_assert!(address.is_page_aligned(), "allocator returned {}", address);
                let frame = self.inner.lock().insert(address);
                self.counters.record_acquired();
                log::trace!("acquired frame {} in slot {}", address, frame.id().as_usize());
                return Ok(address);
            }

            if attempt == attempts {
                break;
            }

            log::debug!(
                "physical memory exhausted, evicting (attempt {}/{})",
                attempt,
                attempts
            );
            if let Err(err) = self.evict() {
                log::error!("cannot acquire a frame: {}", err);
                return Err(FrameError::OutOfMemory);
            }
        }

        log::error!(
            "cannot acquire a frame: allocator exhausted after {} attempts",
            attempts
        );
        Err(FrameError::OutOfMemory)
    }

    /// Releases the frame at `address`.
    ///
    /// With `Some(space)` only the sharer belonging to `space` is detached and unloaded. With
    /// `None` every sharer is unloaded. Either way, if the frame is left without sharers it is
    /// deregistered and returned to the allocator; otherwise it stays registered for the
    /// remaining sharers. Releasing an address with no registered frame does nothing.
    pub fn release_frame(&self, address: PhysicalAddress, space: Option<AddressSpaceId>) {
        let _eviction = self.eviction.lock();
        self.release_locked(address, space);
    }

    /// Body of [`release_frame`](Self::release_frame); the caller holds the eviction lock.
    ///
    /// Returns true if the frame was reclaimed.
    pub(crate) fn release_locked(
        &self,
        address: PhysicalAddress,
        space: Option<AddressSpaceId>,
    ) -> bool {
        let Some(frame) = self.lookup(address) else {
            log::trace!("release of unregistered frame {} ignored", address);
            return false;
        };

        let pinned = frame.is_pinned();
        match space {
            Some(space) => {
                if let Some(page) = self.detach_sharer(&frame, |page| page.space() == space) {
                    self.pages.unload(page, address, pinned);
                }
            }
            None => {
                while let Some(page) = self.detach_sharer(&frame, |_| true) {
                    self.pages.unload(page, address, pinned);
                }
            }
        }

        self.reclaim_if_unshared(&frame)
    }

    /// Removes the first sharer matching `matches` from `frame` and forgets its residency.
    fn detach_sharer(
        &self,
        frame: &Frame,
        matches: impl Fn(&PageRef) -> bool,
    ) -> Option<PageRef> {
        let mut sharers = frame.lock_sharers();
        let index = sharers.iter().position(matches)?;
        let page = sharers.swap_remove(index);
        self.inner.lock().resident.remove(&page);
        log::trace!("detached {:?} from frame {}", page, frame.address());
        Some(page)
    }

    /// Destroys `frame` if its sharer set is empty. Returns true if it was destroyed.
    fn reclaim_if_unshared(&self, frame: &Frame) -> bool {
        let sharers = frame.lock_sharers();
        if !sharers.is_empty() {
            log::trace!(
                "frame {} kept for {} remaining sharers",
                frame.address(),
                sharers.len()
            );
            return false;
        }

        frame.retire();
        {
            let mut inner = self.inner.lock();
            inner.remove(frame);
            self.allocator.free(frame.address());
        }
        drop(sharers);

        self.counters.record_reclaimed();
        log::debug!("reclaimed frame {}", frame.address());
        true
    }

    /// Returns the sharer of the frame at `address` that belongs to `space`.
    ///
    /// Returns `None` if no frame is registered at `address` or none of its sharers belongs
    /// to `space`.
    pub fn find_sharer(&self, address: PhysicalAddress, space: AddressSpaceId) -> Option<PageRef> {
        let frame = self.lookup(address)?;
        let sharers = frame.lock_sharers();
        sharers.iter().copied().find(|page| page.space() == space)
    }

    /// Returns a handle to the frame registered at `address`.
    ///
    /// The handle stays valid after the frame is destroyed, but then only describes the past:
    /// check [`Frame::is_retired`] before acting on it.
    pub fn lookup(&self, address: PhysicalAddress) -> Option<Arc<Frame>> {
        self.inner.lock().get(address)
    }

    /// Records that `page` is now resident in the frame at `address`.
    ///
    /// Fails if no live frame is registered at `address` or if `page` is already resident in
    /// any frame.
    pub fn add_sharer(&self, address: PhysicalAddress, page: PageRef) -> Result<(), FrameError> {
        let frame = self
            .lookup(address)
            .ok_or(FrameError::NotRegistered(address))?;

        let mut sharers = frame.lock_sharers();
        if frame.is_retired() {
            return Err(FrameError::NotRegistered(address));
        }

        {
            let mut inner = self.inner.lock();
            if let Some(&current) = inner.resident.get(&page) {
                log::warn!("{:?} is already resident in frame {}", page, current);
                return Err(FrameError::AlreadyResident(page, current));
            }
            inner.resident.insert(page, address);
        }
        sharers.push(page);

        log::trace!("{:?} now shares frame {}", page, address);
        Ok(())
    }

    /// Pins the frame at `address`, excluding it from eviction.
    pub fn pin(&self, address: PhysicalAddress) -> Result<(), FrameError> {
        let frame = self
            .lookup(address)
            .ok_or(FrameError::NotRegistered(address))?;
        frame.set_pinned(true);
        Ok(())
    }

    /// Unpins the frame at `address`, making it a candidate for eviction.
    ///
    /// A frame without sharers holds no valid page and cannot be unpinned.
    pub fn unpin(&self, address: PhysicalAddress) -> Result<(), FrameError> {
        let frame = self
            .lookup(address)
            .ok_or(FrameError::NotRegistered(address))?;

        let sharers = frame.lock_sharers();
        if sharers.is_empty() {
            log::warn!("refusing to unpin frame {} without sharers", address);
            return Err(FrameError::NoSharers(address));
        }
        frame.set_pinned(false);
        Ok(())
    }

    /// Returns the address of the frame `page` is resident in.
    pub fn frame_of(&self, page: PageRef) -> Option<PhysicalAddress> {
        self.inner.lock().resident.get(&page).copied()
    }

    /// Asks the page service which page of `space` occupies the frame at `address`.
    ///
    /// Unlike [`find_sharer`](Self::find_sharer) this also finds pages the page service has
    /// loaded but not yet registered as sharers. Returns `None` for unregistered frames.
    pub fn owner_of(&self, address: PhysicalAddress, space: AddressSpaceId) -> Option<PageRef> {
        self.lookup(address)?;
        self.pages.find_owner(space, address)
    }

    /// Returns the number of registered frames.
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    /// Returns true if no frame is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns a snapshot of the table's counters.
    pub fn stats(&self) -> FrameTableStats {
        self.counters.snapshot()
    }

    /// Verifies the table's invariants.
    ///
    /// Only meaningful while no other thread is operating on the table.
    pub fn check_invariants(&self) -> Result<(), InvariantViolation> {
        let (frames, resident) = {
            let inner = self.inner.lock();

            for (&address, &id) in &inner.by_address {
                let frame = inner.slot(id);
                if inner.clock.get(&frame.sequence()) != Some(&id) {
                    return Err(InvariantViolation::MissingFromClock(address));
                }
            }
            for &id in inner.clock.values() {
                let frame = inner.slot(id);
                if inner.by_address.get(&frame.address()) != Some(&id) {
                    return Err(InvariantViolation::MissingFromIndex(frame.address()));
                }
            }
            if inner.by_address.len() != inner.clock.len() {
                return Err(InvariantViolation::IndexSizeMismatch {
                    index: inner.by_address.len(),
                    clock: inner.clock.len(),
                });
            }

            (inner.clock_snapshot(), inner.resident.clone())
        };

        let mut sharers_by_frame = BTreeMap::new();
        for frame in &frames {
            let sharers = frame.sharers();
            if sharers.is_empty() && !frame.is_pinned() {
                return Err(InvariantViolation::UnpinnedWithoutSharers(frame.address()));
            }
            sharers_by_frame.insert(frame.address(), sharers);
        }

        for (address, sharers) in &sharers_by_frame {
            if let Some(page) = sharers
                .iter()
                .find(|page| resident.get(*page) != Some(address))
            {
                return Err(InvariantViolation::ResidencyMismatch(*page));
            }
        }
        for (page, address) in &resident {
            let listed = sharers_by_frame
                .get(address)
                .is_some_and(|sharers| sharers.contains(page));
            if !listed {
                return Err(InvariantViolation::ResidencyMismatch(*page));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::{
        EmulatedFrameAllocator, EmulatedPageService, EmulatedPageTables, PageTableAccess,
        VirtualAddress, arch,
    };
    use std::sync::mpsc;
    use std::thread;
    use std::time::Duration;

    pub(crate) type TestTable = FrameTable<
        EmulatedFrameAllocator,
        PageTableAccess<Arc<EmulatedPageTables>>,
        EmulatedPageService,
    >;

    pub(crate) const BASE: PhysicalAddress = PhysicalAddress::new(0x1000);

    pub(crate) fn table_with(frames: usize, config: FrameTableConfig) -> TestTable {
        let page_tables = Arc::new(EmulatedPageTables::new());
        FrameTable::with_config(
            EmulatedFrameAllocator::new(BASE, frames),
            PageTableAccess::new(page_tables.clone()),
            EmulatedPageService::with_page_tables(page_tables),
            config,
        )
    }

    pub(crate) fn table(frames: usize) -> TestTable {
        table_with(frames, FrameTableConfig::default())
    }

    pub(crate) fn page(space: usize, index: usize) -> PageRef {
        PageRef::new(
            AddressSpaceId::new(space),
            VirtualAddress::new(index * arch::PAGE_SIZE),
        )
    }

    /// Loads `page` into `frame` the way the page fault handler does.
    pub(crate) fn install(table: &TestTable, frame: PhysicalAddress, page: PageRef) {
        table.page_service().install(page, frame);
        table.add_sharer(frame, page).unwrap();
    }

    /// Acquires a frame, loads `page` into it and unpins it.
    pub(crate) fn populate(table: &TestTable, page: PageRef) -> PhysicalAddress {
        let frame = table.acquire_frame(AllocFlags::USER).unwrap();
        install(table, frame, page);
        table.unpin(frame).unwrap();
        frame
    }

    #[test]
    fn acquired_frame_is_pinned_and_empty() {
        let table = table(4);
        let frame = table.acquire_frame(AllocFlags::USER).unwrap();

        let handle = table.lookup(frame).unwrap();
        assert_eq!(handle.address(), frame);
        assert!(handle.is_pinned());
        assert_eq!(handle.sharer_count(), 0);
        assert_eq!(table.len(), 1);
        table.check_invariants().unwrap();
    }

    #[test]
    fn simple_allocate_and_free() {
        let table = table(4);
        let space = AddressSpaceId::new(1);
        let frame = table.acquire_frame(AllocFlags::USER).unwrap();
        install(&table, frame, page(1, 0));
        table.unpin(frame).unwrap();

        table.release_frame(frame, Some(space));

        assert!(table.lookup(frame).is_none());
        assert!(table.is_empty());
        assert_eq!(table.allocator().free_frames(), 4);
        assert_eq!(table.page_service().unloads().len(), 1);
        assert_eq!(table.frame_of(page(1, 0)), None);
        table.check_invariants().unwrap();
    }

    #[test]
    fn release_of_unknown_frame_is_a_no_op() {
        let table = table(4);
        let frame = populate(&table, page(1, 0));

        table.release_frame(PhysicalAddress::new(0x2000), Some(AddressSpaceId::new(1)));
        table.release_frame(PhysicalAddress::new(0x2000), None);

        assert_eq!(table.len(), 1);
        assert!(table.lookup(frame).is_some());
        assert!(table.page_service().unloads().is_empty());
        table.check_invariants().unwrap();
    }

    #[test]
    fn release_twice_is_idempotent() {
        let table = table(4);
        let frame = populate(&table, page(1, 0));

        table.release_frame(frame, None);
        table.release_frame(frame, None);

        assert!(table.is_empty());
        assert_eq!(table.allocator().free_frames(), 4);
        assert_eq!(table.stats().reclaimed, 1);
    }

    #[test]
    fn shared_frame_survives_targeted_release() {
        let table = table(4);
        let a = page(1, 3);
        let b = page(2, 7);
        let frame = populate(&table, a);
        install(&table, frame, b);

        table.release_frame(frame, Some(a.space()));

        let handle = table.lookup(frame).unwrap();
        assert_eq!(handle.sharers(), [b]);
        assert_eq!(table.find_sharer(frame, a.space()), None);
        assert_eq!(table.find_sharer(frame, b.space()), Some(b));
        assert_eq!(table.allocator().free_frames(), 3);
        table.check_invariants().unwrap();

        table.release_frame(frame, Some(b.space()));

        assert!(table.lookup(frame).is_none());
        assert!(handle.is_retired());
        assert_eq!(table.allocator().free_frames(), 4);
        let unloaded: Vec<_> = table.page_service().unloads().iter().map(|u| u.page).collect();
        assert_eq!(unloaded, [a, b]);
    }

    #[test]
    fn full_release_unloads_every_sharer() {
        let table = table(4);
        let frame = populate(&table, page(1, 0));
        install(&table, frame, page(2, 0));
        install(&table, frame, page(3, 0));

        table.release_frame(frame, None);

        assert!(table.is_empty());
        assert_eq!(table.page_service().unloads().len(), 3);
        assert!(table.page_service().unloads().iter().all(|u| u.frame == frame));
    }

    #[test]
    fn find_sharer_on_unknown_frame() {
        let table = table(4);
        assert_eq!(
            table.find_sharer(PhysicalAddress::new(0x1000), AddressSpaceId::new(1)),
            None
        );
    }

    #[test]
    fn add_sharer_rejects_page_resident_elsewhere() {
        let table = table(4);
        let shared = page(1, 0);
        let first = populate(&table, shared);
        let second = table.acquire_frame(AllocFlags::USER).unwrap();

        assert_eq!(
            table.add_sharer(second, shared),
            Err(FrameError::AlreadyResident(shared, first))
        );
        assert_eq!(
            table.add_sharer(first, shared),
            Err(FrameError::AlreadyResident(shared, first))
        );
        assert_eq!(table.frame_of(shared), Some(first));
    }

    #[test]
    fn add_sharer_to_unknown_frame() {
        let table = table(4);
        let address = PhysicalAddress::new(0x1000);
        assert_eq!(
            table.add_sharer(address, page(1, 0)),
            Err(FrameError::NotRegistered(address))
        );
    }

    #[test]
    fn stale_handle_cannot_gain_sharers() {
        let table = table(4);
        let frame = populate(&table, page(1, 0));
        let handle = table.lookup(frame).unwrap();

        table.release_frame(frame, None);

        assert!(handle.is_retired());
        assert_eq!(
            table.add_sharer(frame, page(2, 0)),
            Err(FrameError::NotRegistered(frame))
        );
    }

    #[test]
    fn unpin_requires_sharers() {
        let table = table(4);
        let frame = table.acquire_frame(AllocFlags::USER).unwrap();

        assert_eq!(table.unpin(frame), Err(FrameError::NoSharers(frame)));
        assert!(table.lookup(frame).unwrap().is_pinned());
    }

    #[test]
    fn pin_and_unpin_unknown_frame() {
        let table = table(4);
        let address = PhysicalAddress::new(0x1000);
        assert_eq!(table.pin(address), Err(FrameError::NotRegistered(address)));
        assert_eq!(table.unpin(address), Err(FrameError::NotRegistered(address)));
    }

    #[test]
    fn owner_of_consults_page_service() {
        let table = table(4);
        let loaded = page(1, 2);
        let frame = table.acquire_frame(AllocFlags::USER).unwrap();
        table.page_service().install(loaded, frame);

        assert_eq!(table.find_sharer(frame, loaded.space()), None);
        assert_eq!(table.owner_of(frame, loaded.space()), Some(loaded));
        assert_eq!(table.owner_of(frame, AddressSpaceId::new(9)), None);
    }

    #[test]
    fn slots_are_reused_after_reclaim() {
        let table = table(4);
        let first = populate(&table, page(1, 0));
        let slot = table.lookup(first).unwrap().id();
        table.release_frame(first, None);

        let second = populate(&table, page(1, 1));
        assert_eq!(table.lookup(second).unwrap().id(), slot);
        table.check_invariants().unwrap();
    }

    #[test]
    fn forced_eviction_frees_exactly_one_frame() {
        let table = table(3);
        let victim = populate(&table, page(1, 0));
        populate(&table, page(1, 1));
        populate(&table, page(1, 2));
        assert_eq!(table.allocator().free_frames(), 0);

        let frame = table.acquire_frame(AllocFlags::USER).unwrap();

        assert_eq!(frame, victim);
        assert_eq!(table.stats().evictions, 1);
        assert_eq!(table.frame_of(page(1, 0)), None);
        assert!(!table.page_service().is_resident(page(1, 0)));
        assert_eq!(table.len(), 3);
        table.check_invariants().unwrap();
    }

    #[test]
    fn total_pin_reports_out_of_memory() {
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let table = table(3);
            for _ in 0..3 {
                table.acquire_frame(AllocFlags::USER).unwrap();
            }
            tx.send(table.acquire_frame(AllocFlags::USER)).unwrap();
        });

        let result = rx
            .recv_timeout(Duration::from_secs(10))
            .expect("acquire_frame did not return");
        assert_eq!(result, Err(FrameError::OutOfMemory));
    }

    #[test]
    fn empty_table_with_exhausted_allocator() {
        let table = table(0);
        assert_eq!(table.acquire_frame(AllocFlags::USER), Err(FrameError::OutOfMemory));
        assert_eq!(table.stats().evictions, 0);
    }

    #[test]
    fn single_attempt_never_evicts() {
        let table = table_with(1, FrameTableConfig::new().with_max_alloc_attempts(1));
        populate(&table, page(1, 0));

        assert_eq!(table.acquire_frame(AllocFlags::USER), Err(FrameError::OutOfMemory));
        assert_eq!(table.stats().evictions, 0);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn zero_attempts_still_asks_the_allocator() {
        let config = FrameTableConfig {
            max_alloc_attempts: 0,
            ..FrameTableConfig::default()
        };
        let table = table_with(1, config);

        let frame = table.acquire_frame(AllocFlags::USER).unwrap();
        assert_eq!(table.allocator().free_frames(), 0);

        install(&table, frame, page(1, 0));
        table.unpin(frame).unwrap();
        assert_eq!(table.acquire_frame(AllocFlags::USER), Err(FrameError::OutOfMemory));
        assert_eq!(table.stats().evictions, 0);
    }

    #[test]
    fn check_invariants_detects_frame_missing_from_clock() {
        let table = table(4);
        let frame = populate(&table, page(1, 0));
        let sequence = table.lookup(frame).unwrap().sequence();
        table.inner.lock().clock.remove(&sequence);

        assert_eq!(
            table.check_invariants(),
            Err(InvariantViolation::MissingFromClock(frame))
        );
    }

    #[test]
    fn check_invariants_detects_frame_missing_from_index() {
        let table = table(4);
        let frame = populate(&table, page(1, 0));
        table.inner.lock().by_address.remove(&frame);

        assert_eq!(
            table.check_invariants(),
            Err(InvariantViolation::MissingFromIndex(frame))
        );
    }

    #[test]
    fn check_invariants_detects_duplicate_clock_entry() {
        let table = table(4);
        let frame = populate(&table, page(1, 0));
        let id = table.lookup(frame).unwrap().id();
        table.inner.lock().clock.insert(u64::MAX, id);

        assert_eq!(
            table.check_invariants(),
            Err(InvariantViolation::IndexSizeMismatch { index: 1, clock: 2 })
        );
    }

    #[test]
    fn check_invariants_detects_unpinned_frame_without_sharers() {
        let table = table(4);
        let frame = table.acquire_frame(AllocFlags::USER).unwrap();
        table.lookup(frame).unwrap().set_pinned(false);

        assert_eq!(
            table.check_invariants(),
            Err(InvariantViolation::UnpinnedWithoutSharers(frame))
        );
    }

    #[test]
    fn check_invariants_detects_sharer_missing_from_residency() {
        let table = table(4);
        let resident = page(1, 0);
        populate(&table, resident);
        table.inner.lock().resident.remove(&resident);

        assert_eq!(
            table.check_invariants(),
            Err(InvariantViolation::ResidencyMismatch(resident))
        );
    }

    #[test]
    fn check_invariants_detects_residency_without_sharer() {
        let table = table(4);
        let frame = populate(&table, page(1, 0));
        let stray = page(2, 0);
        table.inner.lock().resident.insert(stray, frame);

        assert_eq!(
            table.check_invariants(),
            Err(InvariantViolation::ResidencyMismatch(stray))
        );
    }

    #[test]
    fn concurrent_acquires_yield_distinct_frames() {
        let table = Arc::new(table(128));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let table = table.clone();
                thread::spawn(move || {
                    (0..16)
                        .map(|_| table.acquire_frame(AllocFlags::USER).unwrap())
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let mut frames: Vec<_> = handles
            .into_iter()
            .flat_map(|handle| handle.join().unwrap())
            .collect();
        frames.sort();
        frames.dedup();

        assert_eq!(frames.len(), 128);
        assert_eq!(table.len(), 128);
        table.check_invariants().unwrap();
    }

    #[test]
    fn concurrent_targeted_releases_reclaim_once() {
        let table = Arc::new(table(4));
        let frame = populate(&table, page(0, 0));
        for space in 1..8 {
            install(&table, frame, page(space, 0));
        }

        let handles: Vec<_> = (0..8)
            .map(|space| {
                let table = table.clone();
                thread::spawn(move || {
                    table.release_frame(frame, Some(AddressSpaceId::new(space)));
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert!(table.is_empty());
        assert_eq!(table.stats().reclaimed, 1);
        assert_eq!(table.page_service().unloads().len(), 8);
        assert_eq!(table.allocator().free_frames(), 4);
    }

    #[test]
    fn sustained_pressure_keeps_invariants() {
        let config = FrameTableConfig::new().with_max_alloc_attempts(64);
        let table = Arc::new(table_with(4, config));

        let handles: Vec<_> = (1..=2)
            .map(|space| {
                let table = table.clone();
                thread::spawn(move || {
                    for index in 0..32 {
                        populate(&table, page(space, index));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(table.len(), 4);
        assert_eq!(table.stats().acquired, 64);
        assert_eq!(table.stats().evictions, 60);
        table.check_invariants().unwrap();
    }
}
