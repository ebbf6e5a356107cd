use rustc_hash::{FxHashMap, FxHashSet};
use std::fmt;

/// Opaque entity identifier.
///
/// Ids start at 1 and strictly increase; a destroyed entity's id is never handed out again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Entity(u64);

impl Entity {
    /// Numeric id, for logging and external lookup tables.
    pub fn id(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Allocates entity identities, tracks liveness and an optional 1:1 tag mapping.
///
/// Destroying through the registry only forgets the entity; component cleanup
/// is driven by [`World::destroy_entity`](crate::World::destroy_entity).
#[derive(Debug)]
pub struct EntityRegistry {
    next_id: u64,
    live: FxHashSet<Entity>,
    by_tag: FxHashMap<String, Entity>,
    tag_of: FxHashMap<Entity, String>,
}

impl Default for EntityRegistry {
    fn default() -> Self {
        Self {
            next_id: 1,
            live: FxHashSet::default(),
            by_tag: FxHashMap::default(),
            tag_of: FxHashMap::default(),
        }
    }
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a fresh entity id.
    pub fn create(&mut self) -> Entity {
        let entity = Entity(self.next_id);
        self.next_id += 1;
        self.live.insert(entity);
        tracing::trace!(%entity, "entity created");
        entity
    }

    /// Issue a fresh entity and bind `tag` to it.
    ///
    /// If `tag` already names another entity, that mapping is silently replaced.
    pub fn create_tagged(&mut self, tag: impl Into<String>) -> Entity {
        let entity = self.create();
        self.bind_tag(entity, tag.into());
        entity
    }

    /// Re-tag a live entity. Any previous tag of `entity` and any previous owner
    /// of `tag` lose their mapping. Returns `false` if the entity is not alive.
    pub fn set_tag(&mut self, entity: Entity, tag: impl Into<String>) -> bool {
        if !self.is_alive(entity) {
            return false;
        }
        self.bind_tag(entity, tag.into());
        true
    }

    fn bind_tag(&mut self, entity: Entity, tag: String) {
        if let Some(old_tag) = self.tag_of.remove(&entity) {
            self.by_tag.remove(&old_tag);
        }
        if let Some(previous) = self.by_tag.insert(tag.clone(), entity) {
            if previous != entity {
                self.tag_of.remove(&previous);
            }
        }
        self.tag_of.insert(entity, tag);
    }

    /// Forget a live entity and its tag. Idempotent: returns `false` if it was already gone.
    pub fn destroy(&mut self, entity: Entity) -> bool {
        if !self.live.remove(&entity) {
            return false;
        }
        if let Some(tag) = self.tag_of.remove(&entity) {
            self.by_tag.remove(&tag);
        }
        true
    }

    pub fn lookup(&self, tag: &str) -> Option<Entity> {
        self.by_tag.get(tag).copied()
    }

    pub fn tag_of(&self, entity: Entity) -> Option<&str> {
        self.tag_of.get(&entity).map(String::as_str)
    }

    pub fn is_alive(&self, entity: Entity) -> bool {
        self.live.contains(&entity)
    }

    pub fn len(&self) -> usize {
        self.live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    /// Live entities in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = Entity> + '_ {
        self.live.iter().copied()
    }
}
