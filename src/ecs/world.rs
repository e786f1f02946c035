//! The `World`: entities, registered component types, and the pool they are
//! allocated from, wired together behind one API.
//!
//! Grounded on the original C engine's `World`/`world_create_entity`/
//! `world_add_component` trio, rewritten around Rust generics so callers get
//! a typed `add`/`get`/`remove` instead of raw `void*` component blocks.

use std::mem::size_of;

use crate::ecs::component::ComponentArray;
use crate::ecs::entity::{Entity, EntityManager};
use crate::ecs::MAX_COMPONENTS;
use crate::error::EcsError;
use crate::memory::MemoryPool;
use crate::tag::MemoryTag;

/// A registered component type's slot in the `World`'s component table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComponentType(usize);

/// Owns entity identity and every registered component's sparse-set
/// storage, allocating component payloads from a borrowed memory pool.
pub struct World<'pool> {
    pool: &'pool MemoryPool,
    entities: EntityManager,
    components: Vec<ComponentArray>,
}

impl<'pool> World<'pool> {
    pub fn new(pool: &'pool MemoryPool) -> Self {
        World {
            pool,
            entities: EntityManager::new(),
            components: Vec::new(),
        }
    }

    /// Register a new component type sized for `T`. Returns the handle used
    /// by `add`/`get`/`remove`. Fails once `MAX_COMPONENTS` types have been
    /// registered.
    pub fn register_component<T>(&mut self) -> Result<ComponentType, EcsError> {
        if self.components.len() >= MAX_COMPONENTS {
            return Err(EcsError::AllocationFailed);
        }
        let index = self.components.len();
        self.components.push(ComponentArray::new(size_of::<T>()));
        Ok(ComponentType(index))
    }

    /// Create a new entity. Fails once `MAX_ENTITIES` live+recycled ids have
    /// been exhausted.
    pub fn create_entity(&mut self) -> Result<Entity, EcsError> {
        self.entities.create().ok_or(EcsError::AllocationFailed)
    }

    /// Whether `entity` is currently live.
    pub fn is_live(&self, entity: Entity) -> bool {
        self.entities.is_live(entity)
    }

    /// Destroy `entity`, freeing every component payload it still owns and
    /// recycling the id.
    pub fn destroy_entity(&mut self, entity: Entity) -> Result<(), EcsError> {
        if !self.entities.is_live(entity) {
            return Err(EcsError::NotInitialized);
        }
        for array in &mut self.components {
            if let Some(payload) = array.remove(entity) {
                // SAFETY: `payload` was allocated by this `World` through
                // `self.pool` with `array.payload_size()` bytes and has not
                // been freed since.
                let _ = self.pool.free(payload, MemoryTag::Component);
            }
        }
        self.entities.destroy(entity);
        Ok(())
    }

    fn array(&self, ty: ComponentType) -> &ComponentArray {
        &self.components[ty.0]
    }

    fn array_mut(&mut self, ty: ComponentType) -> &mut ComponentArray {
        &mut self.components[ty.0]
    }

    /// Attach a `T` value to `entity` under component type `ty`.
    ///
    /// `ty` must have been registered with `register_component::<T>()`; a
    /// mismatched size is a programmer error detected via `debug_assert`.
    pub fn add<T>(&mut self, entity: Entity, ty: ComponentType, value: T) -> Result<(), EcsError> {
        if !self.entities.is_live(entity) {
            return Err(EcsError::NotInitialized);
        }
        debug_assert_eq!(
            self.array(ty).payload_size(),
            size_of::<T>(),
            "component type registered with a different size than T"
        );
        if self.array(ty).contains(entity) {
            return Err(EcsError::InvalidArgument);
        }

        let payload = self
            .pool
            .allocate(size_of::<T>(), MemoryTag::Component)
            .map_err(|_| EcsError::AllocationFailed)?
            .cast::<T>();
        // SAFETY: `payload` is a fresh, uniquely-owned allocation sized for
        // `T`, aligned to `STANDARD_ALIGNMENT` which covers every `T` this
        // crate's callers register (see module-level invariant note).
        unsafe { payload.as_ptr().write(value) };

        self.array_mut(ty).insert(entity, payload.cast::<u8>());
        Ok(())
    }

    /// Borrow `entity`'s `T` component under `ty`, if present.
    pub fn get<T>(&self, entity: Entity, ty: ComponentType) -> Option<&T> {
        let payload = self.array(ty).get(entity)?;
        // SAFETY: the pointer was written by `add::<T>` with a `T`-sized,
        // `T`-aligned allocation and has not been freed (removal always
        // takes the payload out of the sparse set first).
        Some(unsafe { payload.cast::<T>().as_ref() })
    }

    /// Mutably borrow `entity`'s `T` component under `ty`, if present.
    pub fn get_mut<T>(&mut self, entity: Entity, ty: ComponentType) -> Option<&mut T> {
        let payload = self.array(ty).get(entity)?;
        // SAFETY: see `get`; `&mut self` guarantees exclusivity.
        Some(unsafe { payload.cast::<T>().as_mut() })
    }

    /// Detach `entity`'s component under `ty`, freeing its payload.
    pub fn remove<T>(&mut self, entity: Entity, ty: ComponentType) -> Result<(), EcsError> {
        let payload = self
            .array_mut(ty)
            .remove(entity)
            .ok_or(EcsError::InvalidArgument)?;
        // SAFETY: `payload` was allocated by `add::<T>` with this exact size
        // and tag and is being freed exactly once.
        self.pool
            .free(payload, MemoryTag::Component)
            .map_err(|_| EcsError::AllocationFailed)?;
        Ok(())
    }

    /// Iterate every `(entity, &T)` pair currently registered under `ty`.
    pub fn iter<'a, T: 'a>(&'a self, ty: ComponentType) -> impl Iterator<Item = (Entity, &'a T)> + 'a {
        self.array(ty)
            .iter()
            .map(|(entity, payload)| (entity, unsafe { payload.cast::<T>().as_ref() }))
    }
}
