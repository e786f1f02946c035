//! Bump-pointer arena with stack-discipline marker resets.
//!
//! Generalizes the teacher crate's single-threaded `FrameArena` (pure
//! pointer-bump, reset-to-zero only) with the marker save/restore pair the
//! spec requires, and its own mutex — contention scope is one arena, never
//! the whole pool.

use std::alloc::{alloc, dealloc, Layout};
use std::ptr::NonNull;

use crate::error::MemoryError;
use crate::memory::layout::align_up;
use crate::sync::mutex::Mutex;

struct ArenaState {
    used: usize,
    marker: usize,
}

/// A single contiguous region bump-allocated from, with save/restore
/// markers for stack-discipline resets.
pub struct MemoryArena {
    base: NonNull<u8>,
    capacity: usize,
    alignment: usize,
    state: Mutex<ArenaState>,
}

// SAFETY: all mutable state lives behind `state`'s mutex; `base` is never
// written to concurrently without holding that lock.
unsafe impl Send for MemoryArena {}
unsafe impl Sync for MemoryArena {}

impl MemoryArena {
    /// Create a standalone arena with the given capacity and alignment.
    pub fn create(capacity: usize, alignment: usize) -> Result<Self, MemoryError> {
        if capacity == 0 || !crate::memory::layout::is_power_of_two(alignment) {
            return Err(MemoryError::InvalidArgument);
        }

        let layout = Layout::from_size_align(capacity, alignment)
            .map_err(|_| MemoryError::InvalidArgument)?;

        // SAFETY: layout has nonzero size and a validated alignment.
        let ptr = unsafe { alloc(layout) };
        let base = NonNull::new(ptr).ok_or(MemoryError::AllocationFailed)?;

        Ok(MemoryArena {
            base,
            capacity,
            alignment,
            state: Mutex::new(ArenaState { used: 0, marker: 0 }),
        })
    }

    /// Allocate `size` bytes, aligned to the arena's alignment.
    ///
    /// Returns `None` if the arena is exhausted.
    pub fn allocate(&self, size: usize) -> Option<NonNull<u8>> {
        let mut state = self.state.lock();
        let aligned_used = align_up(state.used, self.alignment);
        let new_used = aligned_used.checked_add(size)?;
        if new_used > self.capacity {
            return None;
        }

        // SAFETY: `aligned_used + size <= capacity`, so the resulting range
        // lies entirely within the arena's backing allocation.
        let ptr = unsafe { self.base.as_ptr().add(aligned_used) };
        state.used = new_used;
        NonNull::new(ptr)
    }

    /// Reset the arena to empty, invalidating every prior allocation.
    pub fn reset(&self) {
        let mut state = self.state.lock();
        state.used = 0;
        state.marker = 0;
    }

    /// Capture the current `used` offset as a marker.
    pub fn get_marker(&self) -> usize {
        let mut state = self.state.lock();
        state.marker = state.used;
        state.used
    }

    /// Set the marker to an explicit offset without moving `used`.
    pub fn set_marker(&self, marker: usize) {
        self.state.lock().marker = marker;
    }

    /// Reset `used` back to `marker`.
    ///
    /// Resetting to a marker greater than the current `used` is a contract
    /// violation (the marker could not have been captured from this
    /// arena's history) and is a fatal assertion, per spec.
    pub fn reset_to_marker(&self, marker: usize) {
        let mut state = self.state.lock();
        assert!(
            marker <= state.used,
            "reset_to_marker: marker {marker} is ahead of used {}",
            state.used
        );
        state.used = marker;
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn used(&self) -> usize {
        self.state.lock().used
    }
}

impl Drop for MemoryArena {
    fn drop(&mut self) {
        let layout = Layout::from_size_align(self.capacity, self.alignment)
            .expect("arena layout was validated at creation");
        // SAFETY: `base` was allocated in `create` with this exact layout.
        unsafe { dealloc(self.base.as_ptr(), layout) };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_allocation_advances_used() {
        let arena = MemoryArena::create(1024, 8).unwrap();
        let p1 = arena.allocate(100).unwrap();
        let p2 = arena.allocate(200).unwrap();
        assert_ne!(p1.as_ptr(), p2.as_ptr());
        assert!(arena.used() >= 300);
    }

    #[test]
    fn exhaustion_returns_none() {
        let arena = MemoryArena::create(32, 8).unwrap();
        assert!(arena.allocate(16).is_some());
        assert!(arena.allocate(16).is_some());
        assert!(arena.allocate(16).is_none());
    }

    #[test]
    fn reset_returns_to_zero_and_reuses_memory() {
        let arena = MemoryArena::create(1024, 8).unwrap();
        let p1 = arena.allocate(64).unwrap();
        arena.reset();
        assert_eq!(arena.used(), 0);
        let p2 = arena.allocate(64).unwrap();
        assert_eq!(p1, p2);
    }

    #[test]
    fn marker_discipline_restores_exact_offset() {
        // S5: create(1024, 8); a = allocate(100); set_marker; b, c = allocate(200) each;
        // reset_to_marker(marker) returns used to the marker; next allocate(200) reuses `b`.
        let arena = MemoryArena::create(1024, 8).unwrap();
        let _a = arena.allocate(100).unwrap();
        let marker = arena.get_marker();

        let b = arena.allocate(200).unwrap();
        let _c = arena.allocate(200).unwrap();

        arena.reset_to_marker(marker);
        assert_eq!(arena.used(), marker);

        let b2 = arena.allocate(200).unwrap();
        assert_eq!(b, b2);
    }

    #[test]
    #[should_panic]
    fn reset_to_marker_ahead_of_used_is_fatal() {
        let arena = MemoryArena::create(1024, 8).unwrap();
        arena.allocate(16).unwrap();
        arena.reset_to_marker(999);
    }
}
