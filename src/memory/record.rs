//! Allocation-record bookkeeping, kept out of the main pool's backing
//! region so tracking an allocation never recurses into the pool it
//! tracks.
//!
//! Reserved as a fixed-size slot table at [`crate::memory::MemoryPool`]
//! construction time, managed as an intrusive free list, guarded by its own
//! mutex distinct from the pool's. Slot storage itself is a plain `Vec`
//! from the process allocator — the same choice the teacher crate makes
//! for its own bookkeeping structures (`SystemHeap`, `SlabRegistry`), never
//! the pool whose allocations it is recording.

use crate::sync::mutex::Mutex;
use crate::tag::MemoryTag;

/// One outstanding allocation: user pointer, user-requested size, and tag.
#[derive(Debug, Clone, Copy)]
pub struct AllocationRecord {
    pub ptr: *mut u8,
    pub size: usize,
    pub tag: MemoryTag,
}

struct Slot {
    record: Option<AllocationRecord>,
    next_free: Option<usize>,
    next_in_tag: Option<usize>,
    prev_in_tag: Option<usize>,
}

struct RecordPoolInner {
    slots: Vec<Slot>,
    free_head: Option<usize>,
    tag_heads: Vec<Option<usize>>,
    live_count: usize,
}

/// Fixed-capacity, self-allocating record table.
pub(crate) struct RecordPool {
    inner: Mutex<RecordPoolInner>,
    capacity: usize,
}

// SAFETY: every raw pointer stored here is only ever read back as an
// address for bookkeeping (leak reports, record lookup); it is never
// dereferenced through `RecordPool`. All mutable access goes through the
// inner mutex.
unsafe impl Send for RecordPool {}
unsafe impl Sync for RecordPool {}

impl RecordPool {
    pub fn new(capacity: usize) -> Self {
        let mut slots = Vec::with_capacity(capacity);
        for i in 0..capacity {
            slots.push(Slot {
                record: None,
                next_free: if i + 1 < capacity { Some(i + 1) } else { None },
                next_in_tag: None,
                prev_in_tag: None,
            });
        }

        RecordPool {
            inner: Mutex::new(RecordPoolInner {
                slots,
                free_head: if capacity > 0 { Some(0) } else { None },
                tag_heads: vec![None; MemoryTag::COUNT],
                live_count: 0,
            }),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Record a new live allocation. Fails if the record table itself is
    /// exhausted — a contract the caller (the pool) should size generously
    /// via `MemoryPoolConfig::record_capacity`.
    pub fn insert(&self, ptr: *mut u8, size: usize, tag: MemoryTag) -> bool {
        let mut inner = self.inner.lock();
        let Some(slot_idx) = inner.free_head else {
            return false;
        };
        inner.free_head = inner.slots[slot_idx].next_free;

        let tag_idx = tag.index();
        let old_head = inner.tag_heads[tag_idx];
        inner.slots[slot_idx] = Slot {
            record: Some(AllocationRecord { ptr, size, tag }),
            next_free: None,
            next_in_tag: old_head,
            prev_in_tag: None,
        };
        if let Some(head) = old_head {
            inner.slots[head].prev_in_tag = Some(slot_idx);
        }
        inner.tag_heads[tag_idx] = Some(slot_idx);
        inner.live_count += 1;
        true
    }

    /// Remove the record for `ptr` tagged `tag`. Returns `true` if a
    /// matching record was found and removed.
    pub fn remove(&self, ptr: *mut u8, tag: MemoryTag) -> bool {
        let mut inner = self.inner.lock();
        let tag_idx = tag.index();

        let mut cursor = inner.tag_heads[tag_idx];
        while let Some(idx) = cursor {
            let (next_in_tag, prev_in_tag, matches) = {
                let slot = &inner.slots[idx];
                let matches = slot.record.map(|r| r.ptr) == Some(ptr);
                (slot.next_in_tag, slot.prev_in_tag, matches)
            };

            if matches {
                match prev_in_tag {
                    Some(prev) => inner.slots[prev].next_in_tag = next_in_tag,
                    None => inner.tag_heads[tag_idx] = next_in_tag,
                }
                if let Some(next) = next_in_tag {
                    inner.slots[next].prev_in_tag = prev_in_tag;
                }

                let free_head = inner.free_head;
                let slot = &mut inner.slots[idx];
                slot.record = None;
                slot.next_in_tag = None;
                slot.prev_in_tag = None;
                slot.next_free = free_head;
                inner.free_head = Some(idx);
                inner.live_count -= 1;
                return true;
            }

            cursor = next_in_tag;
        }

        false
    }

    /// Snapshot every live record under `tag`, for leak reporting.
    pub fn records_for_tag(&self, tag: MemoryTag) -> Vec<AllocationRecord> {
        let inner = self.inner.lock();
        let mut out = Vec::new();
        let mut cursor = inner.tag_heads[tag.index()];
        while let Some(idx) = cursor {
            let slot = &inner.slots[idx];
            if let Some(record) = slot.record {
                out.push(record);
            }
            cursor = slot.next_in_tag;
        }
        out
    }

    /// Total number of live records across every tag.
    pub fn live_count(&self) -> usize {
        self.inner.lock().live_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_and_remove_round_trip() {
        let pool = RecordPool::new(4);
        let p1 = 0x1000 as *mut u8;
        let p2 = 0x2000 as *mut u8;

        assert!(pool.insert(p1, 64, MemoryTag::Engine));
        assert!(pool.insert(p2, 128, MemoryTag::Engine));
        assert_eq!(pool.live_count(), 2);

        let recs = pool.records_for_tag(MemoryTag::Engine);
        assert_eq!(recs.len(), 2);

        assert!(pool.remove(p1, MemoryTag::Engine));
        assert_eq!(pool.live_count(), 1);
        assert!(!pool.remove(p1, MemoryTag::Engine));

        assert!(pool.remove(p2, MemoryTag::Engine));
        assert_eq!(pool.live_count(), 0);
    }

    #[test]
    fn exhaustion_reports_false() {
        let pool = RecordPool::new(1);
        assert!(pool.insert(0x10 as *mut u8, 8, MemoryTag::Game));
        assert!(!pool.insert(0x20 as *mut u8, 8, MemoryTag::Game));
    }

    #[test]
    fn separate_tags_do_not_interfere() {
        let pool = RecordPool::new(4);
        assert!(pool.insert(0x10 as *mut u8, 8, MemoryTag::Game));
        assert!(pool.insert(0x20 as *mut u8, 8, MemoryTag::Editor));
        assert_eq!(pool.records_for_tag(MemoryTag::Game).len(), 1);
        assert_eq!(pool.records_for_tag(MemoryTag::Editor).len(), 1);
        assert!(pool.remove(0x10 as *mut u8, MemoryTag::Game));
        assert_eq!(pool.records_for_tag(MemoryTag::Editor).len(), 1);
    }
}
