use std::ops::Range;

use crate::domain::{ClockTime, Minutes, TimeWindow};

/// Fixed-size slots covering the team activity window.
///
/// Slot `s` spans `[start + s*len, start + (s+1)*len)`. A trailing remainder
/// shorter than one slot is not part of the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeGrid {
    start: Minutes,
    slot_minutes: Minutes,
    slot_count: usize,
}

impl TimeGrid {
    /// Returns `None` when the window is empty or `slot_minutes` is zero.
    pub fn new(window: TimeWindow, slot_minutes: Minutes) -> Option<Self> {
        if window.end <= window.start || slot_minutes == 0 {
            return None;
        }
        Some(Self {
            start: window.start.minutes(),
            slot_minutes,
            slot_count: (window.len() / slot_minutes) as usize,
        })
    }

    pub fn slot_count(&self) -> usize {
        self.slot_count
    }

    pub fn slot_minutes(&self) -> Minutes {
        self.slot_minutes
    }

    pub fn slot_start(&self, slot: usize) -> ClockTime {
        ClockTime::from_minutes(self.start + slot as Minutes * self.slot_minutes)
    }

    pub fn slot_end(&self, slot: usize) -> ClockTime {
        self.slot_start(slot + 1)
    }

    /// Slot whose start is exactly `time`, if any.
    pub fn slot_at(&self, time: ClockTime) -> Option<usize> {
        let offset = time.minutes().checked_sub(self.start)?;
        if offset % self.slot_minutes != 0 {
            return None;
        }
        let slot = (offset / self.slot_minutes) as usize;
        (slot <= self.slot_count).then_some(slot)
    }

    /// Slots lying entirely inside `window`.
    pub fn slots_within(&self, window: TimeWindow) -> Range<usize> {
        let first = self.boundary(window.start, true);
        let last = self.boundary(window.end, false);
        first..last.max(first)
    }

    /// Slots sharing at least one minute with `window`.
    pub fn slots_overlapping(&self, window: TimeWindow) -> Range<usize> {
        if window.is_empty() {
            return 0..0;
        }
        let first = self.boundary(window.start, false);
        let last = self.boundary(window.end, true);
        first..last.max(first)
    }

    /// Number of slot boundaries at or before `t`, rounded up when `t`
    /// falls inside a slot and `ceil` is set.
    fn boundary(&self, t: ClockTime, ceil: bool) -> usize {
        let Some(offset) = t.minutes().checked_sub(self.start) else {
            return 0;
        };
        let idx = if ceil {
            offset.div_ceil(self.slot_minutes)
        } else {
            offset / self.slot_minutes
        };
        (idx as usize).min(self.slot_count)
    }
}
