//! Allocation backtrace tracking for leak diagnostics.
//!
//! Grounded on the teacher crate's `debug::backtrace::BacktraceTracker`:
//! a side table keyed by allocation address, populated only when the
//! `debug` feature is enabled so the cost (a full stack walk per
//! allocation) is opt-in.

use std::collections::HashMap;

use crate::sync::mutex::Mutex;

/// A captured backtrace for one live allocation.
#[derive(Clone)]
pub struct AllocationTrace {
    pub address: usize,
    pub size: usize,
    pub backtrace: String,
}

/// Side table of allocation-site backtraces, keyed by user pointer address.
/// A no-op (empty, zero-cost on the hot path) unless the `debug` feature is
/// enabled.
pub(crate) struct BacktraceTracker {
    traces: Mutex<HashMap<usize, AllocationTrace>>,
}

impl BacktraceTracker {
    pub fn new() -> Self {
        BacktraceTracker {
            traces: Mutex::new(HashMap::new()),
        }
    }

    pub fn record_alloc(&self, address: usize, size: usize) {
        #[cfg(feature = "debug")]
        {
            let bt = backtrace::Backtrace::new();
            let trace = AllocationTrace {
                address,
                size,
                backtrace: format!("{bt:?}"),
            };
            self.traces.lock().insert(address, trace);
        }

        #[cfg(not(feature = "debug"))]
        {
            let _ = (address, size);
        }
    }

    pub fn record_free(&self, address: usize) {
        self.traces.lock().remove(&address);
    }

    /// The captured trace for `address`, if the `debug` feature was enabled
    /// when it was allocated.
    pub fn trace_for(&self, address: usize) -> Option<AllocationTrace> {
        self.traces.lock().get(&address).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn free_drops_the_recorded_trace() {
        let tracker = BacktraceTracker::new();
        tracker.record_alloc(0x1000, 64);
        tracker.record_free(0x1000);
        assert!(tracker.trace_for(0x1000).is_none());
    }

    #[cfg(feature = "debug")]
    #[test]
    fn debug_feature_captures_a_non_empty_backtrace() {
        let tracker = BacktraceTracker::new();
        tracker.record_alloc(0x2000, 128);
        let trace = tracker.trace_for(0x2000).expect("trace recorded under debug feature");
        assert_eq!(trace.size, 128);
        assert!(!trace.backtrace.is_empty());
    }

    #[cfg(not(feature = "debug"))]
    #[test]
    fn without_debug_feature_no_trace_is_recorded() {
        let tracker = BacktraceTracker::new();
        tracker.record_alloc(0x3000, 16);
        assert!(tracker.trace_for(0x3000).is_none());
    }
}
