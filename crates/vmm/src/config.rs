//! Frame table tuning.

/// Where each eviction sweep starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClockHand {
    /// Keep a persistent hand: a sweep resumes at the frame inserted after the last victim,
    /// so successive sweeps make round-robin progress through the whole table.
    #[default]
    Rotating,
    /// Restart every sweep at the oldest frame. Recently inserted frames are only reached
    /// after everything older has been examined again.
    RestartAtOldest,
}

/// Configuration of a [`FrameTable`](crate::FrameTable).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameTableConfig {
    /// Number of allocator requests [`acquire_frame`](crate::FrameTable::acquire_frame) makes
    /// before giving up. Every failed request except the last is followed by one eviction.
    pub max_alloc_attempts: usize,
    /// Start point of eviction sweeps.
    pub clock_hand: ClockHand,
}

impl FrameTableConfig {
    /// Default number of allocation attempts per acquisition.
    pub const DEFAULT_MAX_ALLOC_ATTEMPTS: usize = 8;

    /// Creates the default configuration.
    pub const fn new() -> Self {
        Self {
            max_alloc_attempts: Self::DEFAULT_MAX_ALLOC_ATTEMPTS,
            clock_hand: ClockHand::Rotating,
        }
    }

    /// Sets the number of allocation attempts. Values below one are raised to one.
    pub const fn with_max_alloc_attempts(mut self, attempts: usize) -> Self {
        self.max_alloc_attempts = if attempts == 0 { 1 } else { attempts };
        self
    }

    /// Sets the clock hand policy.
    pub const fn with_clock_hand(mut self, clock_hand: ClockHand) -> Self {
        self.clock_hand = clock_hand;
        self
    }
}

impl Default for FrameTableConfig {
    fn default() -> Self {
        Self::new()
    }
}
