use crate::entity::Entity;

/// Errors from entity and component operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EcsError {
    #[error("entity {entity} has no {component} component")]
    ComponentNotFound {
        entity: Entity,
        component: &'static str,
    },
    #[error("entity {0} is not alive")]
    DeadEntity(Entity),
}

impl EcsError {
    pub(crate) fn component_not_found<T>(entity: Entity) -> Self {
        Self::ComponentNotFound {
            entity,
            component: std::any::type_name::<T>(),
        }
    }
}
