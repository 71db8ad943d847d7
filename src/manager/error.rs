use std::fmt::{self, Display};

use crate::entity::EntityId;
use crate::system::ComponentType;

/// Failures of [`EntityManager`](super::EntityManager) operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The entity does not exist or has been killed.
    NoSuchEntity(EntityId),
    /// No entity system is registered for the component type.
    NoSuchSystem(ComponentType),
    /// An entity system of the same component type is already registered.
    DuplicateSystem(ComponentType),
    /// The entity already has a component of this type.
    ComponentExists { entity: EntityId, ty: ComponentType },
    /// The entity system does not support creating components.
    CreationRefused { entity: EntityId, ty: ComponentType },
    /// The entity system does not allow spawners to create its components.
    SpawnRefused { spawner: String, ty: ComponentType },
}

impl std::error::Error for Error {}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::NoSuchEntity(entity) => write!(f, "entity {entity} does not exist"),
            Error::NoSuchSystem(ty) => write!(f, "no entity system of type {ty}"),
            Error::DuplicateSystem(ty) => write!(f, "entity system already added: {ty}"),
            Error::ComponentExists { entity, ty } => {
                write!(f, "entity {entity} already has a component of type {ty}")
            }
            Error::CreationRefused { entity, ty } => {
                write!(f, "entity system {ty} cannot create a component for entity {entity}")
            }
            Error::SpawnRefused { spawner, ty } => write!(
                f,
                "entity system {ty} does not allow spawner {spawner:?} to create components"
            ),
        }
    }
}
