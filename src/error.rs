//! Error kinds surfaced by the core.
//!
//! Every public operation returns a result; there is no panic-based
//! error path except for contract violations explicitly documented as
//! fatal (e.g. resetting an arena to an invalid marker). Hand-rolled enums
//! with manual `Display`/`Error` impls, no external error-handling crate.

use std::fmt;

/// Errors raised by the memory pool and its embedded allocators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryError {
    /// A null or out-of-range parameter was passed (e.g. zero-sized pool,
    /// non-power-of-two alignment).
    InvalidArgument,
    /// The pool or an allocator is exhausted, or the OS allocation failed.
    AllocationFailed,
    /// The pool was used before `init` or after `shutdown`.
    NotInitialized,
    /// A block header's magic sentinel did not match on `free`.
    CorruptionDetected,
}

impl fmt::Display for MemoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemoryError::InvalidArgument => write!(f, "invalid argument"),
            MemoryError::AllocationFailed => write!(f, "allocation failed: pool exhausted"),
            MemoryError::NotInitialized => write!(f, "memory pool not initialized"),
            MemoryError::CorruptionDetected => {
                write!(f, "corruption detected: block header magic mismatch")
            }
        }
    }
}

impl std::error::Error for MemoryError {}

/// Errors raised by the ECS core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EcsError {
    /// The component type has not been registered.
    InvalidArgument,
    /// The entity id is not live.
    NotInitialized,
    /// A registration or creation ceiling (`MAX_ENTITIES`/`MAX_COMPONENTS`)
    /// was reached.
    AllocationFailed,
}

impl fmt::Display for EcsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EcsError::InvalidArgument => write!(f, "invalid entity or component type"),
            EcsError::NotInitialized => write!(f, "entity is not live"),
            EcsError::AllocationFailed => write!(f, "ECS capacity exhausted"),
        }
    }
}

impl std::error::Error for EcsError {}

/// Errors raised by the plugin container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PluginError {
    /// The shared library could not be opened.
    AllocationFailed(String),
    /// One of the three required symbols was missing.
    SymbolMissing(&'static str),
    /// The operation is not valid in the plugin's current FSM state.
    InvalidArgument,
}

impl fmt::Display for PluginError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PluginError::AllocationFailed(path) => {
                write!(f, "failed to open plugin library at '{path}'")
            }
            PluginError::SymbolMissing(name) => {
                write!(f, "plugin is missing required symbol '{name}'")
            }
            PluginError::InvalidArgument => write!(f, "operation invalid in current plugin state"),
        }
    }
}

impl std::error::Error for PluginError {}

/// Top-level engine errors, covering init/shutdown failures not owned by a
/// single subsystem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    Memory(MemoryError),
    Ecs(EcsError),
    Plugin(PluginError),
    /// Catch-all for platform failures (`os_*` bridge calls).
    Generic(String),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::Memory(e) => write!(f, "memory error: {e}"),
            EngineError::Ecs(e) => write!(f, "ecs error: {e}"),
            EngineError::Plugin(e) => write!(f, "plugin error: {e}"),
            EngineError::Generic(msg) => write!(f, "engine error: {msg}"),
        }
    }
}

impl std::error::Error for EngineError {}

impl From<MemoryError> for EngineError {
    fn from(e: MemoryError) -> Self {
        EngineError::Memory(e)
    }
}

impl From<EcsError> for EngineError {
    fn from(e: EcsError) -> Self {
        EngineError::Ecs(e)
    }
}

impl From<PluginError> for EngineError {
    fn from(e: PluginError) -> Self {
        EngineError::Plugin(e)
    }
}
