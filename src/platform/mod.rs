//! Platform abstraction: the capability set the engine loop and plugin
//! container consume from the host OS.
//!
//! Per spec's "Double-indirection pointer tables" redesign note, this is
//! expressed as one Rust trait (`OsBridge`) implemented by a single
//! concrete backend chosen at construction, rather than a raw
//! function-pointer struct. Raw allocation and the monotonic clock are
//! *not* part of this trait: `std::alloc` is already the idiomatic Rust
//! boundary to the OS allocator (the teacher crate's own `FrameArena` and
//! `SystemHeap` call it directly), so [`crate::memory::MemoryPool`] uses it
//! without indirection. `OsBridge` covers what `std::alloc` cannot give
//! you: the clock, the event pump, render-present hooks, and dynamic
//! library loading.

mod std_backend;

pub use std_backend::StdPlatform;

/// Opaque handle to a dynamically loaded library, returned by
/// [`OsBridge::lib_open`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LibHandle(pub(crate) u64);

/// Capability set the core requires from the host platform.
///
/// One implementor per concrete platform backend (window/renderer/input
/// specifics are out of scope and live on the other side of this trait, in
/// the host binary).
pub trait OsBridge: Send + Sync {
    /// Monotonic time in milliseconds, used to compute frame delta time.
    fn monotonic_millis(&self) -> u64;

    /// Pump the platform's event queue; the only bounded per-tick blocking
    /// point in the engine loop. Returns whether the platform is still
    /// running after the pump.
    fn poll_events(&mut self) -> bool;

    /// Whether the platform currently reports itself running.
    fn is_running(&self) -> bool;

    /// Clear the active render target. A no-op backend is acceptable; the
    /// loop omits render-layer steps entirely if the platform has nothing
    /// meaningful to do here (see [`OsBridge::has_renderer`]).
    fn renderer_clear(&mut self) {}

    /// Present the active render target.
    fn renderer_present(&mut self) {}

    /// Whether this backend has a real renderer behind `renderer_clear`/
    /// `renderer_present`. When `false`, the engine loop skips both calls.
    fn has_renderer(&self) -> bool {
        false
    }

    /// Open a dynamic library at `path`.
    ///
    /// # Safety
    /// The returned handle must only be used with `lib_symbol`/`lib_close`
    /// from the same `OsBridge` implementor, and the library at `path`
    /// must remain valid for the handle's lifetime.
    unsafe fn lib_open(&self, path: &str) -> Option<LibHandle>;

    /// Resolve `name` in the library behind `handle`.
    ///
    /// # Safety
    /// `handle` must have been returned by `lib_open` on this same bridge
    /// and not yet closed. The caller is responsible for transmuting the
    /// returned pointer to the correct function signature.
    unsafe fn lib_symbol(&self, handle: LibHandle, name: &str) -> Option<*const ()>;

    /// Close a library opened with `lib_open`.
    ///
    /// # Safety
    /// `handle` must not be used again after this call.
    unsafe fn lib_close(&self, handle: LibHandle);
}

#[cfg(test)]
pub(crate) mod mock {
    //! A scripted platform backend for deterministic loop/plugin tests
    //! (spec §8 scenario S6: "`is_running` returns true for 3 polls then
    //! false").

    use super::{LibHandle, OsBridge};
    use std::collections::HashMap;

    pub struct MockPlatform {
        remaining_polls: u32,
        millis: u64,
        pub poll_count: u32,
        libs: HashMap<u64, HashMap<String, *const ()>>,
        next_handle: u64,
    }

    // The stored pointers are addresses of `extern "C" fn` test fixtures,
    // registered once up front and never mutated through the raw pointer
    // itself; sharing or moving them across threads is safe.
    unsafe impl Send for MockPlatform {}
    unsafe impl Sync for MockPlatform {}

    impl MockPlatform {
        pub fn new(remaining_polls: u32) -> Self {
            MockPlatform {
                remaining_polls,
                millis: 0,
                poll_count: 0,
                libs: HashMap::new(),
                next_handle: 1,
            }
        }

        /// Register a fake library exposing the given symbol table, so
        /// plugin-container tests can exercise `load`/`run`/`unload`
        /// without a real shared object on disk.
        pub fn register_library(&mut self, symbols: HashMap<String, *const ()>) -> String {
            let id = self.next_handle;
            self.next_handle += 1;
            self.libs.insert(id, symbols);
            format!("mock://{id}")
        }
    }

    impl OsBridge for MockPlatform {
        fn monotonic_millis(&self) -> u64 {
            self.millis
        }

        fn poll_events(&mut self) -> bool {
            self.poll_count += 1;
            self.millis += 16;
            if self.remaining_polls > 0 {
                self.remaining_polls -= 1;
                true
            } else {
                false
            }
        }

        fn is_running(&self) -> bool {
            self.remaining_polls > 0
        }

        unsafe fn lib_open(&self, path: &str) -> Option<LibHandle> {
            let id: u64 = path.strip_prefix("mock://")?.parse().ok()?;
            self.libs.contains_key(&id).then_some(LibHandle(id))
        }

        unsafe fn lib_symbol(&self, handle: LibHandle, name: &str) -> Option<*const ()> {
            self.libs.get(&handle.0)?.get(name).copied()
        }

        unsafe fn lib_close(&self, _handle: LibHandle) {}
    }
}
