//! The per-frame system registry.
//!
//! Grounded on the original C engine's fixed `System[MAX_SYSTEMS]` update
//! table, rewritten as an ordered `Vec` of boxed closures per spec's "ECS
//! growth" note — ordering (registration order, run every tick) is kept
//! exactly as it was in the original.

use crate::error::EcsError;

/// Compile-time ceiling on registered systems.
pub const MAX_SYSTEMS: usize = 128;

/// A per-frame update callback, invoked with the frame's delta time in
/// seconds.
pub type SystemFn = Box<dyn FnMut(f32) + Send>;

/// An ordered collection of systems, run once per frame in registration
/// order by [`SystemRegistry::update`].
#[derive(Default)]
pub struct SystemRegistry {
    systems: Vec<SystemFn>,
}

impl SystemRegistry {
    pub fn new() -> Self {
        SystemRegistry {
            systems: Vec::new(),
        }
    }

    /// Register a system. Fails once `MAX_SYSTEMS` systems are registered.
    pub fn register<F>(&mut self, system: F) -> Result<(), EcsError>
    where
        F: FnMut(f32) + Send + 'static,
    {
        if self.systems.len() >= MAX_SYSTEMS {
            return Err(EcsError::AllocationFailed);
        }
        self.systems.push(Box::new(system));
        Ok(())
    }

    /// Number of currently registered systems.
    pub fn len(&self) -> usize {
        self.systems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.systems.is_empty()
    }

    /// Run every registered system in registration order with the frame's
    /// delta time.
    pub fn update(&mut self, dt: f32) {
        for system in &mut self.systems {
            system(dt);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[test]
    fn systems_run_in_registration_order() {
        let order = Arc::new(std::sync::Mutex::new(Vec::new()));
        let mut registry = SystemRegistry::new();

        let order_a = Arc::clone(&order);
        registry.register(move |_dt| order_a.lock().unwrap().push(1)).unwrap();
        let order_b = Arc::clone(&order);
        registry.register(move |_dt| order_b.lock().unwrap().push(2)).unwrap();

        registry.update(0.016);
        assert_eq!(*order.lock().unwrap(), vec![1, 2]);
    }

    #[test]
    fn update_passes_delta_time_through() {
        let seen = Arc::new(AtomicU32::new(0));
        let seen_clone = Arc::clone(&seen);
        let mut registry = SystemRegistry::new();
        registry
            .register(move |dt| seen_clone.store((dt * 1000.0) as u32, Ordering::SeqCst))
            .unwrap();

        registry.update(0.033);
        assert_eq!(seen.load(Ordering::SeqCst), 33);
    }

    #[test]
    fn registering_past_max_systems_fails() {
        let mut registry = SystemRegistry::new();
        for _ in 0..MAX_SYSTEMS {
            registry.register(|_dt| {}).unwrap();
        }
        assert_eq!(registry.register(|_dt| {}), Err(EcsError::AllocationFailed));
    }
}
