//! # enginecore
//!
//! Runtime substrate for a cross-platform game/editor engine: a tagged,
//! thread-safe memory pool with embedded allocators, a sparse-set
//! Entity-Component-System, and a dynamic-plugin lifecycle bound to a
//! platform abstraction that owns the main loop and time source.
//!
//! ## Subsystems
//!
//! - [`memory`] — the tagged memory pool and its embedded allocators
//!   (bump arena, first-fit freelist, aligned allocate/free), plus leak
//!   detection.
//! - [`ecs`] — entity manager and sparse-set component storage, allocated
//!   through the memory pool under [`tag::MemoryTag::Component`].
//! - [`systems`] — the ordered system registry ticked once per frame.
//! - [`plugin`] — the dynamically loaded plugin container and its
//!   load/run/unload state machine.
//! - [`platform`] — the OS-bridge capability trait the engine loop and
//!   plugin container consume, plus a `std`-backed implementation.
//! - [`engine`] — the top-level loop that owns the pool, the platform, and
//!   optionally a plugin.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use enginecore::{Engine, EngineConfig};
//! use enginecore::platform::StdPlatform;
//!
//! let config = EngineConfig { memory_pool_size: 1 << 20 };
//! let mut engine = Engine::new(config, StdPlatform::new()).expect("engine init");
//! engine.run(|_engine, _dt| {}, || {});
//! ```

mod debug;
mod diagnostics;
mod sync;

pub mod ecs;
pub mod engine;
pub mod error;
pub mod memory;
pub mod platform;
pub mod plugin;
pub mod systems;
pub mod tag;

pub use engine::{Engine, EngineConfig, ExitCode};
pub use error::{EcsError, EngineError, MemoryError, PluginError};
pub use memory::MemoryPool;
pub use tag::MemoryTag;
