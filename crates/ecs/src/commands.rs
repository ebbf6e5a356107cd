use crate::entity::Entity;
use crate::error::EcsError;
use crate::storage::Component;
use crate::world::World;

type Command = Box<dyn FnOnce(&mut World) -> Result<(), EcsError>>;

/// Structural changes recorded while the world is borrowed by a query.
///
/// Commands run in the order they were queued when the buffer is applied.
#[derive(Default)]
pub struct CommandBuffer {
    commands: Vec<Command>,
}

impl CommandBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an insert-or-replace of `value` on `entity`.
    pub fn add<T: Component>(&mut self, entity: Entity, value: T) {
        self.commands
            .push(Box::new(move |world: &mut World| world.add_component(entity, value)));
    }

    pub fn remove<T: Component>(&mut self, entity: Entity) {
        self.commands.push(Box::new(move |world: &mut World| -> Result<(), EcsError> {
            world.remove_component::<T>(entity);
            Ok(())
        }));
    }

    pub fn destroy(&mut self, entity: Entity) {
        self.commands.push(Box::new(move |world: &mut World| -> Result<(), EcsError> {
            world.destroy_entity(entity);
            Ok(())
        }));
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Drain and run every queued command against `world`.
    ///
    /// A failing command is logged and skipped; the rest still run.
    /// Returns the number of commands that succeeded.
    pub fn apply(&mut self, world: &mut World) -> usize {
        let mut applied = 0;
        for command in self.commands.drain(..) {
            match command(world) {
                Ok(()) => applied += 1,
                Err(err) => tracing::warn!(%err, "deferred command skipped"),
            }
        }
        applied
    }
}

impl std::fmt::Debug for CommandBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandBuffer")
            .field("pending", &self.commands.len())
            .finish()
    }
}
