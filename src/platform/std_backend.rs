//! `std`/`libloading`-backed platform bridge.
//!
//! No window or renderer backend is in scope (spec §1 Non-goals): this
//! implementation supplies the clock and dynamic-library loading for real,
//! and a `stop()`-driven running flag in place of a concrete windowing
//! event pump, so the crate is runnable and testable without a platform
//! crate of its own.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Instant;

use libloading::Library;

use super::{LibHandle, OsBridge};

/// `std`-backed platform bridge: a real monotonic clock and real dynamic
/// library loading, with a caller-driven running flag.
pub struct StdPlatform {
    start: Instant,
    running: AtomicBool,
    libraries: Mutex<HashMap<u64, Library>>,
    next_handle: AtomicU64,
}

impl StdPlatform {
    /// Create a platform bridge that reports itself running until
    /// [`StdPlatform::stop`] is called.
    pub fn new() -> Self {
        StdPlatform {
            start: Instant::now(),
            running: AtomicBool::new(true),
            libraries: Mutex::new(HashMap::new()),
            next_handle: AtomicU64::new(1),
        }
    }

    /// Signal the engine loop to exit after its current tick.
    pub fn stop(&self) {
        self.running.store(false, Ordering::Release);
    }
}

impl Default for StdPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl OsBridge for StdPlatform {
    fn monotonic_millis(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }

    fn poll_events(&mut self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    unsafe fn lib_open(&self, path: &str) -> Option<LibHandle> {
        // SAFETY: loading arbitrary code is inherently unsafe; the caller
        // (the plugin container) is responsible for only pointing this at
        // trusted plugin artifacts.
        let library = Library::new(path).ok()?;
        let id = self.next_handle.fetch_add(1, Ordering::Relaxed);
        self.libraries.lock().unwrap().insert(id, library);
        Some(LibHandle(id))
    }

    unsafe fn lib_symbol(&self, handle: LibHandle, name: &str) -> Option<*const ()> {
        let libraries = self.libraries.lock().unwrap();
        let library = libraries.get(&handle.0)?;
        let symbol: libloading::Symbol<*const ()> = library.get(name.as_bytes()).ok()?;
        Some(*symbol)
    }

    unsafe fn lib_close(&self, handle: LibHandle) {
        self.libraries.lock().unwrap().remove(&handle.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_is_monotonic() {
        let platform = StdPlatform::new();
        let t1 = platform.monotonic_millis();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let t2 = platform.monotonic_millis();
        assert!(t2 >= t1);
    }

    #[test]
    fn stop_flips_is_running() {
        let mut platform = StdPlatform::new();
        assert!(platform.is_running());
        platform.stop();
        assert!(!platform.poll_events());
        assert!(!platform.is_running());
    }

    #[test]
    fn opening_missing_library_fails_cleanly() {
        let platform = StdPlatform::new();
        let handle = unsafe { platform.lib_open("/nonexistent/path/to/lib.so") };
        assert!(handle.is_none());
    }
}
