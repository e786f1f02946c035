//! Dynamic plugin lifecycle: a finite-state machine around a single
//! dynamically loaded shared library with a fixed C-ABI symbol contract.
//!
//! Grounded on the original C engine's `Plugin`/`plugin_load`/`plugin_run`/
//! `plugin_unload` trio (dlopen/dlsym/dlclose plus the `plugin_init`/
//! `plugin_update`/`plugin_shutdown` symbol contract), rewritten around
//! [`crate::platform::OsBridge`] so loading goes through the same
//! capability seam as the rest of the platform layer, and using
//! `libloading`'s `Symbol` machinery only at the `OsBridge` implementation
//! boundary — the container itself deals in raw function pointers after
//! `OsBridge::lib_symbol` resolves them.

use crate::error::PluginError;
use crate::platform::{LibHandle, OsBridge};

type PluginInitFn = unsafe extern "C" fn();
type PluginUpdateFn = unsafe extern "C" fn(f32);
type PluginShutdownFn = unsafe extern "C" fn();

/// The plugin container's lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PluginState {
    Unloaded,
    Loaded,
    Running,
    Stopped,
}

struct PluginSymbols {
    init: PluginInitFn,
    update: PluginUpdateFn,
    shutdown: PluginShutdownFn,
}

/// Owns one dynamically loaded plugin and its lifecycle state.
///
/// Calls made outside the state they're valid in (e.g. `run` before `load`)
/// are logged, no-op failures rather than panics — plugin misuse should
/// never take down the host engine.
pub struct PluginContainer {
    state: PluginState,
    handle: Option<LibHandle>,
    symbols: Option<PluginSymbols>,
}

impl PluginContainer {
    pub fn new() -> Self {
        PluginContainer {
            state: PluginState::Unloaded,
            handle: None,
            symbols: None,
        }
    }

    pub fn state(&self) -> PluginState {
        self.state
    }

    /// Load the shared library at `path` through `bridge` and resolve its
    /// three required symbols. Transitions `Unloaded -> Loaded`.
    ///
    /// `plugin_init` is not called here — it fires on the first [`run`]
    /// call, on the `Loaded -> Running` transition.
    ///
    /// [`run`]: PluginContainer::run
    pub fn load(&mut self, bridge: &dyn OsBridge, path: &str) -> Result<(), PluginError> {
        if self.state != PluginState::Unloaded {
            crate::diagnostics::warn("plugin load called outside Unloaded state");
            return Err(PluginError::InvalidArgument);
        }

        // SAFETY: `bridge` is responsible for only loading trusted plugin
        // artifacts; this container only calls the three symbols below,
        // each validated present before use.
        let handle = unsafe { bridge.lib_open(path) }
            .ok_or_else(|| PluginError::AllocationFailed(path.to_string()))?;

        let symbols = match self.resolve_symbols(bridge, handle) {
            Ok(symbols) => symbols,
            Err(e) => {
                unsafe { bridge.lib_close(handle) };
                return Err(e);
            }
        };

        self.handle = Some(handle);
        self.symbols = Some(symbols);
        self.state = PluginState::Loaded;
        crate::diagnostics::debug(&format!("plugin loaded: {path}"));
        Ok(())
    }

    fn resolve_symbols(
        &self,
        bridge: &dyn OsBridge,
        handle: LibHandle,
    ) -> Result<PluginSymbols, PluginError> {
        // SAFETY: `handle` was just returned by `bridge.lib_open`.
        let init = unsafe { bridge.lib_symbol(handle, "plugin_init") }
            .ok_or(PluginError::SymbolMissing("plugin_init"))?;
        let update = unsafe { bridge.lib_symbol(handle, "plugin_update") }
            .ok_or(PluginError::SymbolMissing("plugin_update"))?;
        let shutdown = unsafe { bridge.lib_symbol(handle, "plugin_shutdown") }
            .ok_or(PluginError::SymbolMissing("plugin_shutdown"))?;

        // SAFETY: the plugin symbol contract fixes these three signatures;
        // a plugin violating it is a contract violation on the plugin's
        // side, not something this container can detect further.
        Ok(PluginSymbols {
            init: unsafe { std::mem::transmute::<*const (), PluginInitFn>(init) },
            update: unsafe { std::mem::transmute::<*const (), PluginUpdateFn>(update) },
            shutdown: unsafe { std::mem::transmute::<*const (), PluginShutdownFn>(shutdown) },
        })
    }

    /// On the first call, call `plugin_init` and transition
    /// `Loaded -> Running`; every call, including the first, then calls
    /// `plugin_update(dt)`.
    pub fn run(&mut self, dt: f32) -> Result<(), PluginError> {
        if self.state != PluginState::Loaded && self.state != PluginState::Running {
            crate::diagnostics::warn("plugin run called outside Loaded/Running state");
            return Err(PluginError::InvalidArgument);
        }
        let symbols = self.symbols.as_ref().expect("symbols set whenever state is Loaded/Running");

        if self.state == PluginState::Loaded {
            // SAFETY: `init` was resolved from the `plugin_init` symbol,
            // which the contract requires to match `extern "C" fn()`.
            unsafe { (symbols.init)() };
            self.state = PluginState::Running;
        }

        // SAFETY: `update` was resolved from `plugin_update` per the fixed
        // symbol contract.
        unsafe { (symbols.update)(dt) };
        Ok(())
    }

    /// Call `plugin_shutdown` and close the library. Transitions
    /// `Running|Loaded -> Stopped -> Unloaded`.
    pub fn unload(&mut self, bridge: &dyn OsBridge) -> Result<(), PluginError> {
        if self.state != PluginState::Loaded && self.state != PluginState::Running {
            crate::diagnostics::warn("plugin unload called outside Loaded/Running state");
            return Err(PluginError::InvalidArgument);
        }

        if let Some(symbols) = &self.symbols {
            // SAFETY: `shutdown` was resolved from `plugin_shutdown` per the
            // fixed symbol contract.
            unsafe { (symbols.shutdown)() };
        }
        self.state = PluginState::Stopped;

        if let Some(handle) = self.handle.take() {
            // SAFETY: `handle` was opened by this container and is not used
            // again after this call.
            unsafe { bridge.lib_close(handle) };
        }
        self.symbols = None;
        self.state = PluginState::Unloaded;
        crate::diagnostics::debug("plugin unloaded");
        Ok(())
    }
}

impl Default for PluginContainer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::mock::MockPlatform;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicU32, Ordering};

    static INIT_CALLS: AtomicU32 = AtomicU32::new(0);
    static UPDATE_CALLS: AtomicU32 = AtomicU32::new(0);
    static SHUTDOWN_CALLS: AtomicU32 = AtomicU32::new(0);
    static LAST_DT_MILLIS: AtomicU32 = AtomicU32::new(0);

    unsafe extern "C" fn fake_init() {
        INIT_CALLS.fetch_add(1, Ordering::SeqCst);
    }

    unsafe extern "C" fn fake_update(dt: f32) {
        UPDATE_CALLS.fetch_add(1, Ordering::SeqCst);
        LAST_DT_MILLIS.store((dt * 1000.0) as u32, Ordering::SeqCst);
    }

    unsafe extern "C" fn fake_shutdown() {
        SHUTDOWN_CALLS.fetch_add(1, Ordering::SeqCst);
    }

    fn fresh_mock_with_full_plugin() -> (MockPlatform, String) {
        INIT_CALLS.store(0, Ordering::SeqCst);
        UPDATE_CALLS.store(0, Ordering::SeqCst);
        SHUTDOWN_CALLS.store(0, Ordering::SeqCst);

        let mut platform = MockPlatform::new(0);
        let mut symbols: HashMap<String, *const ()> = HashMap::new();
        symbols.insert("plugin_init".to_string(), fake_init as *const ());
        symbols.insert("plugin_update".to_string(), fake_update as *const ());
        symbols.insert("plugin_shutdown".to_string(), fake_shutdown as *const ());
        let path = platform.register_library(symbols);
        (platform, path)
    }

    #[test]
    fn s6_full_lifecycle_calls_symbols_in_order() {
        let (platform, path) = fresh_mock_with_full_plugin();
        let mut container = PluginContainer::new();

        container.load(&platform, &path).unwrap();
        assert_eq!(container.state(), PluginState::Loaded);
        assert_eq!(INIT_CALLS.load(Ordering::SeqCst), 0);

        container.run(0.016).unwrap();
        assert_eq!(container.state(), PluginState::Running);
        assert_eq!(INIT_CALLS.load(Ordering::SeqCst), 1);
        assert_eq!(UPDATE_CALLS.load(Ordering::SeqCst), 1);
        assert_eq!(LAST_DT_MILLIS.load(Ordering::SeqCst), 16);

        container.run(0.020).unwrap();
        assert_eq!(INIT_CALLS.load(Ordering::SeqCst), 1);
        assert_eq!(UPDATE_CALLS.load(Ordering::SeqCst), 2);

        container.unload(&platform).unwrap();
        assert_eq!(container.state(), PluginState::Unloaded);
        assert_eq!(SHUTDOWN_CALLS.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn load_missing_library_fails() {
        let platform = MockPlatform::new(0);
        let mut container = PluginContainer::new();
        assert!(matches!(
            container.load(&platform, "mock://999"),
            Err(PluginError::AllocationFailed(_))
        ));
        assert_eq!(container.state(), PluginState::Unloaded);
    }

    #[test]
    fn load_missing_symbol_fails_and_closes_library() {
        let mut platform = MockPlatform::new(0);
        let mut symbols: HashMap<String, *const ()> = HashMap::new();
        symbols.insert("plugin_init".to_string(), fake_init as *const ());
        // plugin_update and plugin_shutdown deliberately missing.
        let path = platform.register_library(symbols);

        let mut container = PluginContainer::new();
        assert_eq!(
            container.load(&platform, &path),
            Err(PluginError::SymbolMissing("plugin_update"))
        );
        assert_eq!(container.state(), PluginState::Unloaded);
    }

    #[test]
    fn run_before_load_is_a_logged_no_op_failure() {
        let mut container = PluginContainer::new();
        assert_eq!(container.run(0.016), Err(PluginError::InvalidArgument));
    }

    #[test]
    fn double_load_is_rejected() {
        let (platform, path) = fresh_mock_with_full_plugin();
        let mut container = PluginContainer::new();
        container.load(&platform, &path).unwrap();
        assert_eq!(
            container.load(&platform, &path),
            Err(PluginError::InvalidArgument)
        );
    }
}
