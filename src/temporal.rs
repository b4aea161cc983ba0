//! N-frame temporal history over a GPU-owned object
//!
//! Reprojection and accumulation effects need "this frame's" and
//! "k frames ago" views of the same logical resource. The ring buffer holds
//! N pre-allocated slots, rotates the write target once per frame, and
//! tracks how many frames of trustworthy history have accumulated since the
//! last discontinuity.
//!
//! Misuse (out-of-range offset, use after dispose) is a programmer error
//! and panics immediately rather than returning a recoverable error.

/// Fixed-size ring of N slots with per-frame rotation and validity tracking.
pub struct TemporalResource<T> {
    slots: Vec<T>,
    write_index: usize,
    frames_since_reset: u64,
    history_length: usize,
    disposed: bool,
}

impl<T> TemporalResource<T> {
    /// Allocate `history_length` slots up front via `factory` (called with
    /// the slot index). `history_length` must be at least 1.
    pub fn new(history_length: usize, mut factory: impl FnMut(usize) -> T) -> Self {
        assert!(history_length >= 1, "history_length must be at least 1");
        let slots = (0..history_length).map(&mut factory).collect();
        Self {
            slots,
            write_index: 0,
            frames_since_reset: 0,
            history_length,
            disposed: false,
        }
    }

    pub fn history_length(&self) -> usize {
        self.history_length
    }

    pub fn frames_since_reset(&self) -> u64 {
        self.frames_since_reset
    }

    /// This frame's write target.
    pub fn get_write(&mut self) -> &mut T {
        assert!(!self.disposed, "temporal resource used after dispose()");
        &mut self.slots[self.write_index]
    }

    /// The slot `offset` frames behind the write target (0 = the write
    /// target itself, 1 = previous frame's target). Check
    /// [`Self::has_valid_history`] before trusting the contents.
    pub fn get_read(&self, offset: usize) -> &T {
        assert!(!self.disposed, "temporal resource used after dispose()");
        assert!(
            offset < self.history_length,
            "history offset {offset} out of range (history length {})",
            self.history_length
        );
        let index = (self.write_index + self.history_length - offset) % self.history_length;
        &self.slots[index]
    }

    /// Whether the slot at `offset` holds data from a real earlier frame.
    pub fn has_valid_history(&self, offset: usize) -> bool {
        offset < self.history_length && self.frames_since_reset > offset as u64
    }

    /// Whether every slot has been written since the last reset.
    pub fn is_warm(&self) -> bool {
        self.frames_since_reset >= self.history_length as u64
    }

    /// Rotate the write target and count the completed frame. Call exactly
    /// once per frame, after passes have consumed and produced data.
    pub fn advance_frame(&mut self) {
        assert!(!self.disposed, "temporal resource used after dispose()");
        self.write_index = (self.write_index + 1) % self.history_length;
        self.frames_since_reset += 1;
    }

    /// Mark accumulated history as untrustworthy without touching slots.
    ///
    /// For view discontinuities (camera teleport, object-type switch)
    /// where the allocations are still the right shape.
    pub fn invalidate_history(&mut self) {
        assert!(!self.disposed, "temporal resource used after dispose()");
        self.frames_since_reset = 0;
    }

    /// Tear down every slot via `teardown` and enter the terminal disposed
    /// state. Subsequent calls do nothing; any other use panics.
    pub fn dispose(&mut self, mut teardown: impl FnMut(T)) {
        if self.disposed {
            return;
        }
        for slot in self.slots.drain(..) {
            teardown(slot);
        }
        self.disposed = true;
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn history_becomes_valid_after_enough_frames() {
        let mut temporal = TemporalResource::new(2, |i| i as u32);

        assert!(!temporal.has_valid_history(1));
        temporal.advance_frame();
        assert!(!temporal.has_valid_history(1));
        assert!(temporal.has_valid_history(0));
        temporal.advance_frame();
        assert!(temporal.has_valid_history(1));
    }

    #[test]
    fn read_offset_one_is_previous_write_target() {
        let mut temporal = TemporalResource::new(2, |_| 0u32);

        *temporal.get_write() = 100; // slot 0, frame 0
        temporal.advance_frame();
        *temporal.get_write() = 200; // slot 1, frame 1
        temporal.advance_frame();

        // Write target is slot 0 again; one frame back is slot 1.
        assert_eq!(*temporal.get_read(1), 200);
        assert_eq!(*temporal.get_read(0), 100);
    }

    #[test]
    fn warm_after_history_length_frames() {
        let mut temporal = TemporalResource::new(3, |_| ());
        assert!(!temporal.is_warm());
        temporal.advance_frame();
        temporal.advance_frame();
        assert!(!temporal.is_warm());
        temporal.advance_frame();
        assert!(temporal.is_warm());
    }

    #[test]
    fn invalidate_resets_validity_not_slots() {
        let mut temporal = TemporalResource::new(2, |_| 5u32);
        temporal.advance_frame();
        temporal.advance_frame();
        assert!(temporal.is_warm());

        temporal.invalidate_history();
        assert!(!temporal.is_warm());
        assert!(!temporal.has_valid_history(0));
        // Slots survive untouched.
        assert_eq!(*temporal.get_read(1), 5);
    }

    #[test]
    fn dispose_tears_down_each_slot_once() {
        let mut torn_down = Vec::new();
        let mut temporal = TemporalResource::new(3, |i| i);
        temporal.dispose(|slot| torn_down.push(slot));
        assert_eq!(torn_down, vec![0, 1, 2]);

        // Second dispose performs no further teardown.
        let mut again = Vec::new();
        temporal.dispose(|slot| again.push(slot));
        assert!(again.is_empty());
        assert!(temporal.is_disposed());
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn read_beyond_history_panics() {
        let temporal = TemporalResource::new(2, |_| ());
        let _ = temporal.get_read(2);
    }

    #[test]
    #[should_panic(expected = "after dispose")]
    fn read_after_dispose_panics() {
        let mut temporal = TemporalResource::new(1, |_| ());
        temporal.dispose(|_| {});
        let _ = temporal.get_read(0);
    }

    #[test]
    #[should_panic(expected = "at least 1")]
    fn zero_history_length_panics() {
        let _ = TemporalResource::new(0, |_| ());
    }
}
