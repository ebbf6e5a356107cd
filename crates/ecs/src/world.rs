use crate::commands::CommandBuffer;
use crate::entity::{Entity, EntityRegistry};
use crate::error::EcsError;
use crate::query::{Query, QueryIter};
use crate::registry::StoreRegistry;
use crate::storage::{Component, ComponentStore};

/// Entity registry plus the component stores of every type.
///
/// All structural mutations go through `&mut self`, so a live query (which
/// borrows `&self`) statically excludes them.
#[derive(Debug, Default)]
pub struct World {
    entities: EntityRegistry,
    stores: StoreRegistry,
}

impl World {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_entity(&mut self) -> Entity {
        self.entities.create()
    }

    /// Create an entity reachable through [`entity_by_tag`](Self::entity_by_tag).
    ///
    /// Reusing a tag silently rebinds it to the new entity.
    pub fn create_tagged(&mut self, tag: impl Into<String>) -> Entity {
        self.entities.create_tagged(tag)
    }

    pub fn entity_by_tag(&self, tag: &str) -> Option<Entity> {
        self.entities.lookup(tag)
    }

    pub fn tag_of(&self, entity: Entity) -> Option<&str> {
        self.entities.tag_of(entity)
    }

    /// Destroy an entity and drop its components from every store.
    ///
    /// Destroying an entity that is already gone is a no-op and returns `false`.
    pub fn destroy_entity(&mut self, entity: Entity) -> bool {
        if !self.entities.destroy(entity) {
            tracing::trace!(%entity, "destroy of dead entity ignored");
            return false;
        }
        let components = self.stores.remove_entity(entity);
        tracing::debug!(%entity, components, "entity destroyed");
        true
    }

    pub fn is_alive(&self, entity: Entity) -> bool {
        self.entities.is_alive(entity)
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Live entities in no particular order.
    pub fn entities(&self) -> impl Iterator<Item = Entity> + '_ {
        self.entities.iter()
    }

    /// Attach `value` to `entity`, replacing any component of the same type.
    pub fn add_component<T: Component>(&mut self, entity: Entity, value: T) -> Result<(), EcsError> {
        if !self.entities.is_alive(entity) {
            return Err(EcsError::DeadEntity(entity));
        }
        self.stores.get_or_create::<T>().add(entity, value);
        Ok(())
    }

    /// Detach the `T` component. Returns whether one was present.
    pub fn remove_component<T: Component>(&mut self, entity: Entity) -> bool {
        self.stores
            .get_mut::<T>()
            .is_some_and(|store| store.remove(entity))
    }

    pub fn try_get<T: Component>(&self, entity: Entity) -> Option<&T> {
        self.stores.get::<T>()?.try_get(entity)
    }

    /// Read a component that must be present.
    pub fn get<T: Component>(&self, entity: Entity) -> Result<&T, EcsError> {
        self.try_get(entity)
            .ok_or_else(|| EcsError::component_not_found::<T>(entity))
    }

    pub fn get_mut<T: Component>(&mut self, entity: Entity) -> Option<&mut T> {
        self.stores.get_mut::<T>()?.get_mut(entity)
    }

    pub fn has<T: Component>(&self, entity: Entity) -> bool {
        self.stores.get::<T>().is_some_and(|store| store.contains(entity))
    }

    /// Mutate a component in place. Returns `false` if `entity` has no `T`.
    pub fn update<T: Component>(&mut self, entity: Entity, f: impl FnOnce(&mut T)) -> bool {
        self.stores
            .get_mut::<T>()
            .is_some_and(|store| store.update(entity, f))
    }

    /// Read-only access to the store of `T`, if any component of that type was ever added.
    pub fn store<T: Component>(&self) -> Option<&ComponentStore<T>> {
        self.stores.get::<T>()
    }

    pub fn stores(&self) -> &StoreRegistry {
        &self.stores
    }

    /// Lazily iterate `(entity, &A, &B, ..)` for entities holding every type in `Q`.
    pub fn query<'w, Q: Query<'w>>(&'w self) -> QueryIter<'w, Q> {
        QueryIter::new(&self.stores)
    }

    /// Replay queued structural changes in order. Returns how many succeeded.
    pub fn apply(&mut self, commands: &mut CommandBuffer) -> usize {
        commands.apply(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq)]
    struct Velocity(f32);
    #[derive(Debug, Clone, PartialEq)]
    struct Name(String);

    #[test]
    fn world_starts_empty() {
        let w = World::new();
        assert_eq!(w.entity_count(), 0);
        assert_eq!(w.stores().store_count(), 0);
    }

    #[test]
    fn add_then_get() {
        let mut w = World::new();
        let e = w.create_entity();
        w.add_component(e, Velocity(1.5)).unwrap();
        assert_eq!(w.try_get::<Velocity>(e), Some(&Velocity(1.5)));
        assert_eq!(w.get::<Velocity>(e), Ok(&Velocity(1.5)));
        assert!(w.has::<Velocity>(e));
    }

    #[test]
    fn get_absent_is_error_try_get_is_none() {
        let mut w = World::new();
        let e = w.create_entity();
        assert!(w.try_get::<Velocity>(e).is_none());
        assert!(matches!(
            w.get::<Velocity>(e),
            Err(EcsError::ComponentNotFound { .. })
        ));
    }

    #[test]
    fn remove_component_twice() {
        let mut w = World::new();
        let e = w.create_entity();
        assert!(!w.remove_component::<Velocity>(e));
        w.add_component(e, Velocity(0.0)).unwrap();
        assert!(w.remove_component::<Velocity>(e));
        assert!(!w.remove_component::<Velocity>(e));
    }

    #[test]
    fn destroy_cascades_into_every_store() {
        let mut w = World::new();
        let e = w.create_tagged("hero");
        let other = w.create_entity();
        w.add_component(e, Velocity(1.0)).unwrap();
        w.add_component(e, Name("hero".into())).unwrap();
        w.add_component(other, Velocity(2.0)).unwrap();

        assert!(w.destroy_entity(e));
        assert!(!w.is_alive(e));
        assert!(w.try_get::<Velocity>(e).is_none());
        assert!(w.try_get::<Name>(e).is_none());
        assert_eq!(w.entity_by_tag("hero"), None);
        assert_eq!(w.store::<Velocity>().map(|s| s.len()), Some(1));
        assert_eq!(w.try_get::<Velocity>(other), Some(&Velocity(2.0)));
    }

    #[test]
    fn destroy_twice_is_noop() {
        let mut w = World::new();
        let e = w.create_entity();
        assert!(w.destroy_entity(e));
        assert!(!w.destroy_entity(e));
    }

    #[test]
    fn add_to_dead_entity_is_rejected() {
        let mut w = World::new();
        let e = w.create_entity();
        w.destroy_entity(e);
        assert_eq!(w.add_component(e, Velocity(1.0)), Err(EcsError::DeadEntity(e)));
        assert!(w.store::<Velocity>().is_none());
    }

    #[test]
    fn update_in_place() {
        let mut w = World::new();
        let e = w.create_entity();
        w.add_component(e, Velocity(1.0)).unwrap();
        assert!(w.update::<Velocity>(e, |v| v.0 *= 3.0));
        assert_eq!(w.get::<Velocity>(e).unwrap().0, 3.0);
        if let Some(v) = w.get_mut::<Velocity>(e) {
            v.0 = 0.5;
        }
        assert_eq!(w.try_get::<Velocity>(e), Some(&Velocity(0.5)));
    }

    #[test]
    fn tags_lookup() {
        let mut w = World::new();
        let left = w.create_tagged("left_paddle");
        assert_eq!(w.entity_by_tag("left_paddle"), Some(left));
        assert_eq!(w.tag_of(left), Some("left_paddle"));
        assert_eq!(w.entity_by_tag("right_paddle"), None);
    }

    #[test]
    fn entities_lists_live_only() {
        let mut w = World::new();
        let a = w.create_entity();
        let b = w.create_entity();
        w.destroy_entity(a);
        let live: Vec<_> = w.entities().collect();
        assert_eq!(live, vec![b]);
    }
}
