//! Rolling window of recent readings
//!
//! Keeps the last `capacity` readings in arrival order for charts, stats and
//! the live table.

use std::collections::VecDeque;

use crate::reading::Reading;

/// Default number of readings kept in memory
pub const DEFAULT_CAPACITY: usize = 100;

/// Fixed-capacity FIFO of the most recent readings
#[derive(Debug, Clone)]
pub struct RollingWindow {
    /// Readings, oldest first
    buffer: VecDeque<Reading>,
    /// Maximum number of readings kept
    capacity: usize,
}

impl RollingWindow {
    /// Create a window holding at most `capacity` readings (minimum 1)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            buffer: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a reading, evicting the oldest one when full
    pub fn append(&mut self, reading: Reading) {
        if self.buffer.len() >= self.capacity {
            self.buffer.pop_front();
        }
        self.buffer.push_back(reading);
    }

    /// Copy of the current contents, oldest first
    pub fn snapshot(&self) -> Vec<Reading> {
        self.buffer.iter().cloned().collect()
    }

    /// Most recent reading
    pub fn latest(&self) -> Option<&Reading> {
        self.buffer.back()
    }

    /// Iterate over the readings, oldest first
    pub fn iter(&self) -> impl Iterator<Item = &Reading> {
        self.buffer.iter()
    }

    /// Number of readings held
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Maximum number of readings held
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Drop all readings
    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}

impl Default for RollingWindow {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
