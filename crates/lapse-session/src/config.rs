//! Configuration for the session store.

use std::time::Duration;

/// Default idle time after which a session becomes eligible for eviction.
pub const DEFAULT_MAX_AGE: Duration = Duration::from_secs(5);

/// Default interval between sweeper passes.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(1);

/// Default buffer size of the eviction event channel.
pub const DEFAULT_EVENT_CAPACITY: usize = 256;

/// Smallest sweep interval the store will schedule.
pub(crate) const MIN_SWEEP_INTERVAL: Duration = Duration::from_millis(1);

/// Largest sweep interval the store will schedule (one year).
pub(crate) const MAX_SWEEP_INTERVAL: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// Configuration for the session store.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Idle duration after which, absent any update, a session is evicted.
    pub max_age: Duration,

    /// How often the sweeper scans the table.
    /// Should be well below `max_age`; `max_age / 5` or less keeps eviction tight.
    pub sweep_interval: Duration,

    /// Number of eviction events buffered per subscriber before older
    /// events are dropped.
    pub event_capacity: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            max_age: DEFAULT_MAX_AGE,
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}

impl StoreConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the idle duration after which sessions expire.
    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = max_age;
        self
    }

    /// Set the sweep interval.
    pub fn with_sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = interval;
        self
    }

    /// Set the eviction event buffer size.
    pub fn with_event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity;
        self
    }

    /// Earliest and latest point, relative to the last update, at which a
    /// session is evicted.
    pub fn eviction_window(&self) -> (Duration, Duration) {
        (self.max_age, self.max_age.saturating_add(self.sweep_interval))
    }

    /// Sweep interval actually scheduled by the sweeper.
    pub(crate) fn effective_sweep_interval(&self) -> Duration {
        self.sweep_interval.clamp(MIN_SWEEP_INTERVAL, MAX_SWEEP_INTERVAL)
    }
}
