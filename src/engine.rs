//! The top-level engine loop: owns the memory pool, the platform bridge,
//! and an optional plugin, and drives poll → update → render → present each
//! tick.
//!
//! Grounded on the original C engine's `engine_run` main loop (delta-time
//! computation from a monotonic clock, fixed poll/update/render/present
//! ordering, leak detection at shutdown) and the teacher crate's top-level
//! `GlobalState`/`init`/`shutdown` pair for how a single guarded,
//! process-lifetime resource bundle is constructed and torn down in Rust.

use crate::error::{EngineError, MemoryError};
use crate::memory::MemoryPool;
use crate::plugin::PluginContainer;

/// Process exit codes, mirroring the original C engine's `main` return
/// values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    Success = 0,
    EngineInitFailure = 1,
    ApplicationInitFailure = -1,
}

/// Configuration consumed by [`Engine::new`].
#[derive(Debug, Clone, Copy)]
pub struct EngineConfig {
    /// Total capacity of the engine's memory pool, in bytes.
    pub memory_pool_size: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            memory_pool_size: 16 * 1024 * 1024,
        }
    }
}

/// Owns the process-lifetime resources: the memory pool, the platform
/// bridge, and an optional loaded plugin.
pub struct Engine<B> {
    pool: MemoryPool,
    platform: B,
    plugin: Option<PluginContainer>,
    t_prev: u64,
}

impl<B> Engine<B>
where
    B: crate::platform::OsBridge,
{
    /// Initialize the memory pool and take ownership of an already
    /// constructed platform backend.
    pub fn new(config: EngineConfig, platform: B) -> Result<Self, EngineError> {
        let pool = MemoryPool::init(config.memory_pool_size).map_err(EngineError::Memory)?;
        let t_prev = platform.monotonic_millis();
        Ok(Engine {
            pool,
            platform,
            plugin: None,
            t_prev,
        })
    }

    pub fn pool(&self) -> &MemoryPool {
        &self.pool
    }

    pub fn platform(&self) -> &B {
        &self.platform
    }

    pub fn platform_mut(&mut self) -> &mut B {
        &mut self.platform
    }

    /// Load a plugin into this engine. Replaces any previously loaded
    /// plugin (the prior one is left as-is; callers should `unload_plugin`
    /// first if that matters to them).
    pub fn load_plugin(&mut self, path: &str) -> Result<(), EngineError> {
        let mut container = PluginContainer::new();
        container.load(&self.platform, path)?;
        self.plugin = Some(container);
        Ok(())
    }

    pub fn unload_plugin(&mut self) -> Result<(), EngineError> {
        if let Some(mut container) = self.plugin.take() {
            container.unload(&self.platform)?;
        }
        Ok(())
    }

    /// Run the main loop until the platform reports it has stopped running.
    ///
    /// Each tick: poll events, compute `dt` from the monotonic clock, run
    /// `update(dt)` (and the loaded plugin's `plugin_update`, if any), then
    /// `render()`, then clear/present the platform's renderer if it has one.
    pub fn run<F, R>(&mut self, mut update: F, mut render: R) -> ExitCode
    where
        F: FnMut(&mut Self, f32),
        R: FnMut(),
    {
        while self.platform.poll_events() {
            let t_now = self.platform.monotonic_millis();
            let dt = (t_now.saturating_sub(self.t_prev)) as f32 / 1000.0;
            self.t_prev = t_now;

            update(self, dt);

            if let Some(plugin) = &mut self.plugin {
                let _ = plugin.run(dt);
            }

            render();

            if self.platform.has_renderer() {
                self.platform.renderer_clear();
                self.platform.renderer_present();
            }

            if !self.platform.is_running() {
                break;
            }
        }

        ExitCode::Success
    }

    /// Detect leaks, then release the pool and close any loaded plugin.
    /// Returns the leak report for the caller to act on (log, assert in
    /// tests, etc).
    pub fn shutdown(mut self) -> Vec<crate::memory::LeakReport> {
        if let Some(mut plugin) = self.plugin.take() {
            let _ = plugin.unload(&self.platform);
        }
        self.pool.shutdown()
    }
}

impl From<MemoryError> for ExitCode {
    fn from(_: MemoryError) -> Self {
        ExitCode::EngineInitFailure
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as i32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::mock::MockPlatform;
    use crate::tag::MemoryTag;

    #[test]
    fn exit_codes_map_to_the_documented_process_codes() {
        assert_eq!(i32::from(ExitCode::Success), 0);
        assert_eq!(i32::from(ExitCode::EngineInitFailure), 1);
        assert_eq!(i32::from(ExitCode::ApplicationInitFailure), -1);
    }

    #[test]
    fn s6_loop_runs_exactly_as_many_ticks_as_the_platform_allows() {
        let config = EngineConfig {
            memory_pool_size: 64 * 1024,
        };
        let mut engine = Engine::new(config, MockPlatform::new(3)).unwrap();

        let mut ticks = 0;
        let mut renders = 0;
        let exit = engine.run(|_engine, _dt| ticks += 1, || renders += 1);

        assert_eq!(exit, ExitCode::Success);
        assert_eq!(ticks, 3);
        assert_eq!(renders, 3);
    }

    #[test]
    fn update_closure_can_allocate_through_the_engine_pool() {
        let config = EngineConfig {
            memory_pool_size: 64 * 1024,
        };
        let mut engine = Engine::new(config, MockPlatform::new(1)).unwrap();

        engine.run(
            |engine, _dt| {
                let p = engine.pool().allocate(16, MemoryTag::Game).unwrap();
                engine.pool().free(p, MemoryTag::Game).unwrap();
            },
            || {},
        );

        let reports = engine.shutdown();
        assert!(reports.is_empty());
    }

    #[test]
    fn dt_is_derived_from_the_platform_clock() {
        let config = EngineConfig {
            memory_pool_size: 4096,
        };
        let mut engine = Engine::new(config, MockPlatform::new(2)).unwrap();

        let mut deltas = Vec::new();
        engine.run(|_engine, dt| deltas.push(dt), || {});

        assert_eq!(deltas.len(), 2);
        for dt in deltas {
            assert!((dt - 0.016).abs() < 0.001);
        }
    }
}
