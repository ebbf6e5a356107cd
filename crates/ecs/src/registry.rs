use crate::entity::Entity;
use crate::storage::{Component, ComponentStore};
use rustc_hash::FxHashMap;
use std::any::{Any, TypeId};

/// Capabilities every store registers when it is created, so the registry can
/// fan out entity removal without knowing the concrete component types.
trait ErasedStore {
    fn remove_entity(&mut self, entity: Entity) -> bool;
    fn len(&self) -> usize;
    fn component_name(&self) -> &'static str;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Component> ErasedStore for ComponentStore<T> {
    fn remove_entity(&mut self, entity: Entity) -> bool {
        self.remove(entity)
    }

    fn len(&self) -> usize {
        ComponentStore::len(self)
    }

    fn component_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Owns exactly one [`ComponentStore`] per component type.
///
/// Stores are created on first mutable access. Read access to a type that was
/// never written returns `None` instead of allocating a store.
#[derive(Default)]
pub struct StoreRegistry {
    stores: FxHashMap<TypeId, Box<dyn ErasedStore>>,
}

impl StoreRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get<T: Component>(&self) -> Option<&ComponentStore<T>> {
        self.stores
            .get(&TypeId::of::<T>())
            .and_then(|store| store.as_any().downcast_ref::<ComponentStore<T>>())
    }

    pub fn get_mut<T: Component>(&mut self) -> Option<&mut ComponentStore<T>> {
        self.stores
            .get_mut(&TypeId::of::<T>())
            .and_then(|store| store.as_any_mut().downcast_mut::<ComponentStore<T>>())
    }

    /// Resolve the store for `T`, creating it on first use.
    pub fn get_or_create<T: Component>(&mut self) -> &mut ComponentStore<T> {
        let store = self.stores.entry(TypeId::of::<T>()).or_insert_with(|| {
            tracing::debug!(
                component = std::any::type_name::<T>(),
                "component store created"
            );
            Box::new(ComponentStore::<T>::new())
        });
        match store.as_any_mut().downcast_mut::<ComponentStore<T>>() {
            Some(store) => store,
            None => unreachable!("store keyed by TypeId holds a different component type"),
        }
    }

    /// Remove `entity` from every store. Returns how many stores held it.
    pub fn remove_entity(&mut self, entity: Entity) -> usize {
        self.stores
            .values_mut()
            .map(|store| store.remove_entity(entity))
            .filter(|&removed| removed)
            .count()
    }

    /// Number of stores created so far.
    pub fn store_count(&self) -> usize {
        self.stores.len()
    }

    /// `(component type name, population)` for every store, for diagnostics.
    pub fn populations(&self) -> Vec<(&'static str, usize)> {
        let mut out: Vec<_> = self
            .stores
            .values()
            .map(|store| (store.component_name(), store.len()))
            .collect();
        out.sort();
        out
    }
}

impl std::fmt::Debug for StoreRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreRegistry")
            .field("stores", &self.populations())
            .finish()
    }
}
