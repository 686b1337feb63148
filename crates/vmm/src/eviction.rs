//! Second-chance (clock) page replacement.
//!
//! Frames are swept in insertion order, oldest first, wrapping around to the oldest frame
//! after the newest. Pinned frames are skipped. Every other frame gets the second-chance
//! test: if any of its sharers has been accessed since the last sweep, the accessed bits are
//! cleared and the frame is skipped, otherwise it becomes the victim and all its sharers are
//! unloaded through the ordinary release path.

use alloc::sync::Arc;

use crate::{
    AccessBits, ClockHand, Frame, FrameAllocator, FrameError, FrameTable, PageService,
    PhysicalAddress,
};

/// Eviction engine state, guarded by the eviction lock.
pub(crate) struct ClockState {
    /// Insertion sequence number of the last victim.
    hand: Option<u64>,
}

impl ClockState {
    pub(crate) const fn new() -> Self {
        Self { hand: None }
    }
}

impl<A, B, S> FrameTable<A, B, S>
where
    A: FrameAllocator,
    B: AccessBits,
    S: PageService,
{
    /// Selects a victim frame with the clock algorithm and reclaims it.
    ///
    /// Returns the address of the evicted frame. The frame is back in the allocator unless a
    /// new sharer was attached to it while it was being drained.
    ///
    /// Fails with [`FrameError::NoEvictableFrame`] if the table is empty or if every frame
    /// stayed pinned or recently used for two full revolutions of the clock.
    pub fn evict(&self) -> Result<PhysicalAddress, FrameError> {
        let mut clock = self.eviction.lock();
        let victim = self.select_victim(&mut clock)?;
        let address = victim.address();

        log::debug!(
            "evicting frame {} with {} sharers",
            address,
            victim.sharer_count()
        );
        if self.release_locked(address, None) {
            self.counters.record_eviction();
        } else {
            log::debug!("frame {} gained a sharer while being evicted", address);
        }
        Ok(address)
    }

    /// Runs the clock sweep. The caller holds the eviction lock, so no frame can be removed
    /// from the table while the snapshot is in use.
    fn select_victim(&self, clock: &mut ClockState) -> Result<Arc<Frame>, FrameError> {
        let frames = self.inner.lock().clock_snapshot();
        if frames.is_empty() {
            log::error!("eviction requested but no frame is registered");
            return Err(FrameError::NoEvictableFrame);
        }

        let start = match (self.config().clock_hand, clock.hand) {
            (ClockHand::Rotating, Some(hand)) => {
                frames.partition_point(|frame| frame.sequence() <= hand) % frames.len()
            }
            _ => 0,
        };

        // Each frame is visited at most twice: the first visit may clear its accessed bits,
        // the second can then select it.
        for step in 0..2 * frames.len() {
            let frame = &frames[(start + step) % frames.len()];
            if frame.is_pinned() {
                continue;
            }
            if !self.is_evictable(frame) {
                self.counters.record_second_chance();
                continue;
            }

            clock.hand = Some(frame.sequence());
            return Ok(frame.clone());
        }

        log::error!(
            "no evictable frame among {} registered frames",
            frames.len()
        );
        Err(FrameError::NoEvictableFrame)
    }

    /// The second-chance test.
    ///
    /// Returns false, after clearing the accessed bits, if any sharer was accessed since its
    /// bit was last cleared. A shared frame is therefore only evictable once none of the
    /// address spaces mapping it has touched it for a whole revolution.
    fn is_evictable(&self, frame: &Frame) -> bool {
        let sharers = frame.lock_sharers();
        let mut recently_used = false;
        for page in sharers.iter() {
            if self.access_bits().was_accessed(page.space(), page.vaddr()) {
                self.access_bits().clear_accessed(page.space(), page.vaddr());
                recently_used = true;
            }
        }
        !recently_used
    }
}
