//! The tagged memory pool: one contiguous region, first-fit reuse,
//! leak-tracked, mutex-guarded.
//!
//! Grounded on the original C engine's `memory_pool_create`/`memory_pool_allocate`
//! (single backing allocation, free-list-of-freed-blocks reuse) generalized
//! per spec to tagged, aligned allocation with per-tag leak accounting —
//! and on the teacher crate's `SystemHeap`/`FrameArena` for how a single
//! guarded backing allocation is owned and released in Rust.

use std::alloc::{alloc, dealloc, Layout};
use std::ptr::NonNull;

use crate::debug::BacktraceTracker;
use crate::error::MemoryError;
use crate::memory::header::{BlockHeader, POOL_MAGIC};
use crate::memory::layout::{align_up, is_power_of_two};
use crate::memory::record::RecordPool;
use crate::sync::mutex::Mutex;
use crate::tag::MemoryTag;

/// Default alignment used by [`MemoryPool::allocate`].
pub const STANDARD_ALIGNMENT: usize = 8;

/// Configuration for [`MemoryPool::with_config`].
#[derive(Debug, Clone, Copy)]
pub struct MemoryPoolConfig {
    /// Total capacity of the pool's backing allocation, in bytes.
    pub size: u64,
    /// Capacity of the pre-reserved allocation-record table. Sized
    /// generously enough for the expected peak number of simultaneous
    /// live allocations; exhausting it fails new allocations with
    /// [`MemoryError::AllocationFailed`] even if the pool itself has
    /// space.
    pub record_capacity: usize,
}

impl Default for MemoryPoolConfig {
    fn default() -> Self {
        MemoryPoolConfig {
            size: 0,
            record_capacity: 4096,
        }
    }
}

/// One non-empty per-tag leak bucket reported by [`MemoryPool::detect_leaks`].
#[derive(Debug, Clone)]
pub struct LeakReport {
    pub tag: MemoryTag,
    pub count: usize,
    pub pointers: Vec<*mut u8>,
}

/// Point-in-time allocation statistics.
#[derive(Debug, Clone, Copy, Default)]
pub struct PoolStats {
    pub used: usize,
    pub total: usize,
    pub free_list_bytes: usize,
    pub live_allocations: usize,
}

struct PoolState {
    used: usize,
    high_water: usize,
    free_list: Option<NonNull<BlockHeader>>,
    free_list_bytes: usize,
}

/// A single contiguous, tagged, thread-safe allocation region.
pub struct MemoryPool {
    base: NonNull<u8>,
    total: usize,
    state: Mutex<PoolState>,
    records: RecordPool,
    traces: BacktraceTracker,
}

// SAFETY: every field is either immutable after construction (`base`,
// `total`) or guarded by a mutex (`state`, and `records` internally).
unsafe impl Send for MemoryPool {}
unsafe impl Sync for MemoryPool {}

impl MemoryPool {
    /// Initialize a pool with `size` bytes and the default record-table
    /// capacity. Fails if the OS cannot satisfy the allocation or if
    /// `size` is zero.
    pub fn init(size: u64) -> Result<Self, MemoryError> {
        Self::with_config(MemoryPoolConfig {
            size,
            ..MemoryPoolConfig::default()
        })
    }

    /// Initialize a pool from an explicit configuration.
    pub fn with_config(config: MemoryPoolConfig) -> Result<Self, MemoryError> {
        if config.size == 0 {
            return Err(MemoryError::InvalidArgument);
        }
        let total = usize::try_from(config.size).map_err(|_| MemoryError::InvalidArgument)?;

        let layout = Layout::from_size_align(total, STANDARD_ALIGNMENT)
            .map_err(|_| MemoryError::InvalidArgument)?;
        // SAFETY: layout has nonzero size and a valid alignment.
        let ptr = unsafe { alloc(layout) };
        let base = NonNull::new(ptr).ok_or(MemoryError::AllocationFailed)?;

        crate::diagnostics::info(&format!(
            "memory pool initialized: {total} bytes, {} record slots",
            config.record_capacity
        ));

        Ok(MemoryPool {
            base,
            total,
            state: Mutex::new(PoolState {
                used: 0,
                high_water: 0,
                free_list: None,
                free_list_bytes: 0,
            }),
            records: RecordPool::new(config.record_capacity),
            traces: BacktraceTracker::new(),
        })
    }

    /// Allocate `size` bytes tagged `tag`, aligned to [`STANDARD_ALIGNMENT`].
    pub fn allocate(&self, size: usize, tag: MemoryTag) -> Result<NonNull<u8>, MemoryError> {
        self.allocate_aligned(size, STANDARD_ALIGNMENT, tag)
    }

    /// Allocate `size` bytes tagged `tag`, aligned to `alignment`.
    ///
    /// `alignment` must be a power of two. A zero-byte request is rounded
    /// up to one byte so it still yields a distinct, freeable allocation.
    pub fn allocate_aligned(
        &self,
        size: usize,
        alignment: usize,
        tag: MemoryTag,
    ) -> Result<NonNull<u8>, MemoryError> {
        if !is_power_of_two(alignment) {
            return Err(MemoryError::InvalidArgument);
        }
        let size = size.max(1);
        let header_size = BlockHeader::header_size();

        let mut state = self.state.lock();

        // First-fit scan of the free list: does this block's total
        // capacity cover header + alignment padding + payload? The header
        // always lands immediately before the user pointer (`candidate_user
        // - header_size`), never at the block's nominal start, so `free`'s
        // `ptr - header_size` recovery is valid even when alignment padding
        // pushes the user pointer forward.
        let mut prev: Option<NonNull<BlockHeader>> = None;
        let mut cursor = state.free_list;
        while let Some(node) = cursor {
            // SAFETY: every node on the free list was stamped by a prior
            // `free` call and is still owned by this pool.
            let node_ref = unsafe { node.as_ref() };
            let node_addr = node.as_ptr() as usize;
            let candidate_user = align_up(node_addr + header_size, alignment);
            let header_addr = candidate_user - header_size;
            let needed = candidate_user + size - node_addr;

            if node_ref.size >= needed {
                let next = node_ref.next;
                match prev {
                    Some(mut p) => unsafe { p.as_mut().next = next },
                    None => state.free_list = next,
                }
                state.free_list_bytes -= node_ref.size;

                let block_size = node_ref.size;
                let header_ptr = header_addr as *mut BlockHeader;
                // SAFETY: `header_addr` lies within `[node_addr, node_addr +
                // block_size - header_size]`, guaranteed by the `needed`
                // check above.
                unsafe { BlockHeader::write_live(header_ptr, block_size, tag) };
                state.used += block_size;

                let user_ptr = candidate_user as *mut u8;
                if !self.records.insert(user_ptr, size, tag) {
                    // Recursion trap tripped: undo the reuse so the pool
                    // stays consistent and report failure. Restore the free
                    // block at its original position and full span, not at
                    // `header_addr`, since that's what the free list tracks.
                    state.used -= block_size;
                    let node_ptr = node_addr as *mut BlockHeader;
                    unsafe {
                        node_ptr.write(BlockHeader {
                            next: state.free_list,
                            size: block_size,
                            tag: MemoryTag::None,
                            magic: POOL_MAGIC,
                        })
                    };
                    state.free_list = NonNull::new(node_ptr);
                    state.free_list_bytes += block_size;
                    return Err(MemoryError::AllocationFailed);
                }
                self.traces.record_alloc(user_ptr as usize, size);

                return Ok(NonNull::new(user_ptr).expect("non-null by construction"));
            }

            prev = cursor;
            cursor = node_ref.next;
        }

        // No reusable block: bump from the high-water mark. As above, the
        // header sits at `candidate_user - header_size`, immediately before
        // the user pointer; the block's advanced span is rounded up to
        // `STANDARD_ALIGNMENT` so the *next* bump allocation's block start
        // (and therefore its own header placement) stays aligned too.
        let block_start = self.base.as_ptr() as usize + state.high_water;
        let candidate_user = align_up(block_start + header_size, alignment);
        let header_addr = candidate_user - header_size;
        let block_size = align_up(candidate_user + size - block_start, STANDARD_ALIGNMENT);

        if state.high_water + block_size > self.total {
            return Err(MemoryError::AllocationFailed);
        }

        let header_ptr = header_addr as *mut BlockHeader;
        // SAFETY: `header_addr` lies within `[block_start, block_start +
        // block_size - header_size]`, and `block_start + block_size` does
        // not exceed `base + total`, verified above.
        unsafe { BlockHeader::write_live(header_ptr, block_size, tag) };

        let user_ptr = candidate_user as *mut u8;
        if !self.records.insert(user_ptr, size, tag) {
            return Err(MemoryError::AllocationFailed);
        }

        state.high_water += block_size;
        state.used += block_size;
        self.traces.record_alloc(user_ptr as usize, size);

        Ok(NonNull::new(user_ptr).expect("non-null by construction"))
    }

    /// Free a previously allocated block.
    ///
    /// `tag` should match the tag the block was allocated with; a
    /// mismatch is a soft failure (logged, the block's own recorded tag
    /// wins) rather than a hard error, since the header is the source of
    /// truth. A magic-sentinel mismatch is fatal for this allocation path
    /// — no free is performed — but does not abort the process.
    pub fn free(&self, ptr: NonNull<u8>, tag: MemoryTag) -> Result<(), MemoryError> {
        let header_size = BlockHeader::header_size();
        let header_ptr = (ptr.as_ptr() as usize - header_size) as *mut BlockHeader;

        let mut state = self.state.lock();

        // SAFETY: every live user pointer returned by this pool has a
        // valid `BlockHeader` at this offset.
        let header = unsafe { &*header_ptr };
        if !header.is_valid() {
            crate::diagnostics::error(&format!(
                "free: corruption detected at {:p} (bad header magic)",
                ptr.as_ptr()
            ));
            return Err(MemoryError::CorruptionDetected);
        }

        let actual_tag = header.tag;
        if actual_tag != tag {
            crate::diagnostics::warn(&format!(
                "free: tag mismatch for {:p} (allocated as {}, freed as {})",
                ptr.as_ptr(),
                actual_tag.name(),
                tag.name()
            ));
        }

        self.records.remove(ptr.as_ptr(), actual_tag);
        self.traces.record_free(ptr.as_ptr() as usize);

        let block_size = header.size;
        state.used -= block_size;

        // SAFETY: `header_ptr` is valid for writes; we're about to prepend
        // it to the free list under the same lock that guards the list.
        unsafe {
            header_ptr.write(BlockHeader {
                next: state.free_list,
                size: block_size,
                tag: MemoryTag::None,
                magic: POOL_MAGIC,
            });
        }
        state.free_list = NonNull::new(header_ptr);
        state.free_list_bytes += block_size;

        Ok(())
    }

    /// Allocate space for a single `T`, tagged `tag`.
    pub fn alloc_typed<T>(&self, tag: MemoryTag) -> Result<NonNull<T>, MemoryError> {
        let layout = Layout::new::<T>();
        self.allocate_aligned(layout.size(), layout.align(), tag)
            .map(|p| p.cast())
    }

    /// Free space previously returned by `alloc_typed::<T>`.
    pub fn free_typed<T>(&self, ptr: NonNull<T>, tag: MemoryTag) -> Result<(), MemoryError> {
        self.free(ptr.cast(), tag)
    }

    /// Report every tag with outstanding allocations. Called from
    /// `shutdown` but available standalone for diagnostics.
    pub fn detect_leaks(&self) -> Vec<LeakReport> {
        let mut reports = Vec::new();
        for tag in MemoryTag::ALL {
            let records = self.records.records_for_tag(tag);
            if !records.is_empty() {
                reports.push(LeakReport {
                    tag,
                    count: records.len(),
                    pointers: records.iter().map(|r| r.ptr).collect(),
                });
            }
        }
        reports
    }

    /// Run leak detection, warn for every non-empty tag, then consume
    /// `self` and release the backing allocation.
    ///
    /// With the `debug` feature enabled, each leaked pointer's allocation
    /// backtrace (captured at `allocate`/`allocate_aligned` time) is logged
    /// alongside the summary.
    pub fn shutdown(self) -> Vec<LeakReport> {
        let reports = self.detect_leaks();
        for report in &reports {
            crate::diagnostics::warn(&format!(
                "memory pool shutdown: {} leaked allocation(s) under tag '{}'",
                report.count,
                report.tag.name()
            ));
            for ptr in &report.pointers {
                if let Some(backtrace) = self.allocation_backtrace(*ptr) {
                    crate::diagnostics::warn(&format!("  leaked at {:p}:\n{}", ptr, backtrace));
                }
            }
        }
        reports
        // `self` drops here, releasing the backing allocation via `Drop`.
    }

    /// The allocation-site backtrace captured for `ptr`, formatted, if the
    /// `debug` feature was enabled at allocation time.
    pub fn allocation_backtrace(&self, ptr: *mut u8) -> Option<String> {
        self.traces.trace_for(ptr as usize).map(|t| t.backtrace)
    }

    /// Point-in-time statistics snapshot.
    pub fn stats(&self) -> PoolStats {
        let state = self.state.lock();
        PoolStats {
            used: state.used,
            total: self.total,
            free_list_bytes: state.free_list_bytes,
            live_allocations: self.records.live_count(),
        }
    }

    pub fn total_capacity(&self) -> usize {
        self.total
    }

    /// Copy `size` bytes from `src` to `dest`. No locking; caller ensures
    /// the regions do not overlap.
    ///
    /// # Safety
    /// `src` and `dest` must be valid for reads/writes of `size` bytes and
    /// must not overlap.
    pub unsafe fn copy(dest: *mut u8, src: *const u8, size: usize) {
        std::ptr::copy_nonoverlapping(src, dest, size);
    }

    /// Fill `size` bytes at `dest` with `value`.
    ///
    /// # Safety
    /// `dest` must be valid for writes of `size` bytes.
    pub unsafe fn set(dest: *mut u8, value: u8, size: usize) {
        std::ptr::write_bytes(dest, value, size);
    }

    /// Zero `size` bytes at `dest`.
    ///
    /// # Safety
    /// `dest` must be valid for writes of `size` bytes.
    pub unsafe fn zero(dest: *mut u8, size: usize) {
        Self::set(dest, 0, size);
    }
}

impl Drop for MemoryPool {
    fn drop(&mut self) {
        let layout = Layout::from_size_align(self.total, STANDARD_ALIGNMENT)
            .expect("layout was validated at construction");
        // SAFETY: `base` was allocated in `with_config` with this layout.
        unsafe { dealloc(self.base.as_ptr(), layout) };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn s1_pool_allocate_free_round_trip() {
        let pool = MemoryPool::init(16 * 1024).unwrap();

        let p1 = pool.allocate(64, MemoryTag::Engine).unwrap();
        let p2 = pool.allocate(128, MemoryTag::Component).unwrap();
        assert_eq!(p1.as_ptr() as usize % STANDARD_ALIGNMENT, 0);
        assert_eq!(p2.as_ptr() as usize % STANDARD_ALIGNMENT, 0);

        unsafe {
            MemoryPool::set(p1.as_ptr(), 0xAB, 64);
            MemoryPool::set(p2.as_ptr(), 0xAB, 128);
        }

        pool.free(p1, MemoryTag::Engine).unwrap();
        let p3 = pool.allocate(64, MemoryTag::Engine).unwrap();
        assert_eq!(p1, p3, "freed block should be reused by a same-size allocation");

        pool.free(p2, MemoryTag::Component).unwrap();
        pool.free(p3, MemoryTag::Engine).unwrap();

        assert!(pool.detect_leaks().is_empty());
    }

    #[test]
    fn s2_leak_detection_reports_exact_count() {
        let pool = MemoryPool::init(1024 * 1024).unwrap();
        for _ in 0..3 {
            pool.allocate(32, MemoryTag::Editor).unwrap();
        }

        let reports = pool.shutdown();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].tag, MemoryTag::Editor);
        assert_eq!(reports[0].count, 3);
    }

    #[test]
    fn invalid_alignment_is_rejected() {
        let pool = MemoryPool::init(4096).unwrap();
        assert_eq!(
            pool.allocate_aligned(16, 3, MemoryTag::Engine).unwrap_err(),
            MemoryError::InvalidArgument
        );
    }

    #[test]
    fn zero_size_allocation_is_defined_and_freeable() {
        let pool = MemoryPool::init(4096).unwrap();
        let p = pool.allocate(0, MemoryTag::Game).unwrap();
        pool.free(p, MemoryTag::Game).unwrap();
    }

    #[test]
    fn exhausted_pool_fails_allocation() {
        let pool = MemoryPool::init(64).unwrap();
        assert!(pool.allocate(1024, MemoryTag::Engine).is_err());
    }

    #[test]
    fn corrupted_header_is_detected_on_free() {
        let pool = MemoryPool::init(4096).unwrap();
        let p = pool.allocate(32, MemoryTag::Engine).unwrap();

        let header_ptr =
            (p.as_ptr() as usize - BlockHeader::header_size()) as *mut BlockHeader;
        unsafe {
            (*header_ptr).magic = 0xDEAD_BEEF;
        }

        assert_eq!(
            pool.free(p, MemoryTag::Engine).unwrap_err(),
            MemoryError::CorruptionDetected
        );
    }

    #[test]
    fn stats_reflect_used_and_free_list() {
        let pool = MemoryPool::init(4096).unwrap();
        let p = pool.allocate(64, MemoryTag::Engine).unwrap();
        let used_before = pool.stats().used;
        assert!(used_before > 0);

        pool.free(p, MemoryTag::Engine).unwrap();
        let stats = pool.stats();
        assert_eq!(stats.used, 0);
        assert_eq!(stats.free_list_bytes, used_before);
    }

    #[test]
    fn freeing_a_block_after_a_misaligning_predecessor_recovers_the_right_header() {
        // A 4-byte allocation leaves `high_water` 4 bytes past an 8-byte
        // boundary; without rounding the advanced block span up to
        // `STANDARD_ALIGNMENT`, the following block's header would land at
        // a different offset than `ptr - header_size` expects, and `free`
        // would read garbage instead of the real header.
        let pool = MemoryPool::init(4096).unwrap();
        let _a = pool.allocate(4, MemoryTag::Engine).unwrap();
        let b = pool.allocate(8, MemoryTag::Engine).unwrap();
        pool.free(b, MemoryTag::Engine).unwrap();
    }

    #[test]
    fn freed_allocation_has_no_backtrace() {
        let pool = MemoryPool::init(4096).unwrap();
        let p = pool.allocate(32, MemoryTag::Engine).unwrap();
        pool.free(p, MemoryTag::Engine).unwrap();
        assert!(pool.allocation_backtrace(p.as_ptr()).is_none());
    }

    #[cfg(feature = "debug")]
    #[test]
    fn live_allocation_carries_a_backtrace_under_the_debug_feature() {
        let pool = MemoryPool::init(4096).unwrap();
        let p = pool.allocate(32, MemoryTag::Engine).unwrap();
        assert!(pool.allocation_backtrace(p.as_ptr()).is_some());
        pool.free(p, MemoryTag::Engine).unwrap();
    }
}
