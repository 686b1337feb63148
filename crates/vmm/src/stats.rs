//! Frame table counters.

use core::sync::atomic::{AtomicU64, Ordering};

/// Snapshot of the frame table counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameTableStats {
    /// Frames obtained from the allocator and registered.
    pub acquired: u64,
    /// Frames deregistered and returned to the allocator.
    pub reclaimed: u64,
    /// Evictions whose victim was reclaimed.
    pub evictions: u64,
    /// Frames spared by the second-chance test.
    pub second_chances: u64,
}

#[derive(Default)]
pub(crate) struct Counters {
    acquired: AtomicU64,
    reclaimed: AtomicU64,
    evictions: AtomicU64,
    second_chances: AtomicU64,
}

impl Counters {
    pub(crate) const fn new() -> Self {
        Self {
            acquired: AtomicU64::new(0),
            reclaimed: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
            second_chances: AtomicU64::new(0),
        }
    }

    pub(crate) fn record_acquired(&self) {
        self.acquired.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_reclaimed(&self) {
        self.reclaimed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_eviction(&self) {
        self.evictions.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_second_chance(&self) {
        self.second_chances.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> FrameTableStats {
        FrameTableStats {
            acquired: self.acquired.load(Ordering::Relaxed),
            reclaimed: self.reclaimed.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            second_chances: self.second_chances.load(Ordering::Relaxed),
        }
    }
}
