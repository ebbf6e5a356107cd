use crate::entity::Entity;
use crate::error::EcsError;
use rustc_hash::FxHashMap;

/// Marker for types that can be stored as components.
///
/// Any `'static` type qualifies; a component type is identified by its static type.
pub trait Component: 'static {}

impl<T: 'static> Component for T {}

/// Sparse storage for one component type.
///
/// Values live in a dense array next to their owning entity, with a hash index
/// from entity to slot. Removal swaps the last slot into the hole, so
/// enumeration order is unspecified.
#[derive(Debug, Clone)]
pub struct ComponentStore<T> {
    index: FxHashMap<Entity, usize>,
    entities: Vec<Entity>,
    values: Vec<T>,
}

impl<T> Default for ComponentStore<T> {
    fn default() -> Self {
        Self {
            index: FxHashMap::default(),
            entities: Vec::new(),
            values: Vec::new(),
        }
    }
}

impl<T: Component> ComponentStore<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite the component for `entity`. Returns the replaced value, if any.
    pub fn add(&mut self, entity: Entity, value: T) -> Option<T> {
        if let Some(&slot) = self.index.get(&entity) {
            return Some(std::mem::replace(&mut self.values[slot], value));
        }
        self.index.insert(entity, self.values.len());
        self.entities.push(entity);
        self.values.push(value);
        None
    }

    /// Delete the component for `entity`. Returns whether it existed.
    pub fn remove(&mut self, entity: Entity) -> bool {
        self.take(entity).is_some()
    }

    /// Delete and return the component for `entity`.
    pub fn take(&mut self, entity: Entity) -> Option<T> {
        let slot = self.index.remove(&entity)?;
        self.entities.swap_remove(slot);
        let value = self.values.swap_remove(slot);
        if let Some(&moved) = self.entities.get(slot) {
            self.index.insert(moved, slot);
        }
        Some(value)
    }

    pub fn try_get(&self, entity: Entity) -> Option<&T> {
        self.index.get(&entity).map(|&slot| &self.values[slot])
    }

    /// Like [`try_get`](Self::try_get) but absence is an error.
    pub fn get(&self, entity: Entity) -> Result<&T, EcsError> {
        self.try_get(entity)
            .ok_or_else(|| EcsError::component_not_found::<T>(entity))
    }

    pub fn get_mut(&mut self, entity: Entity) -> Option<&mut T> {
        let slot = *self.index.get(&entity)?;
        Some(&mut self.values[slot])
    }

    /// Mutate the component in place. Returns `false` if `entity` has none.
    pub fn update(&mut self, entity: Entity, f: impl FnOnce(&mut T)) -> bool {
        match self.get_mut(entity) {
            Some(value) => {
                f(value);
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, entity: Entity) -> bool {
        self.index.contains_key(&entity)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Entities currently holding this component, in storage order.
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    /// All present `(entity, value)` pairs, unordered.
    pub fn iter(&self) -> impl Iterator<Item = (Entity, &T)> + '_ {
        self.entities.iter().copied().zip(self.values.iter())
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Entity, &mut T)> + '_ {
        self.entities.iter().copied().zip(self.values.iter_mut())
    }

    pub fn clear(&mut self) {
        self.index.clear();
        self.entities.clear();
        self.values.clear();
    }
}
