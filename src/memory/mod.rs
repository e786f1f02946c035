//! The tagged memory pool and its embedded allocators.
//!
//! [`MemoryPool`] is the single contiguous region carved from the process
//! allocator at engine start; [`arena::MemoryArena`] and
//! [`freelist::FreeList`] are standalone sub-allocators usable either on
//! their own backing memory or, in the case of the arena, embedded inside
//! a larger region the caller manages.

mod header;
mod record;

pub mod arena;
pub mod freelist;
pub mod layout;
pub mod pool;

pub use arena::MemoryArena;
pub use freelist::FreeList;
pub use pool::{LeakReport, MemoryPool, MemoryPoolConfig, PoolStats, STANDARD_ALIGNMENT};
