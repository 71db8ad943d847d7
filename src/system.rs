//! Components and the entity systems that own them.
//!
//! Each [`EntitySystem`] stores all components of one [`ComponentType`].
//! Components are created and deleted through the owning system,
//! so that type-specific setup and teardown always runs.
//! Deletion is only reachable through the [`EntityManager`](crate::EntityManager),
//! which notifies deletion callbacks before the component is destroyed.

use std::any::Any;
use std::rc::Rc;

use crate::entity::EntityId;
use crate::manager::Error;
use crate::property::{Group, Properties};
use crate::pump::MessagePump;
use crate::sid::StringId;

mod default;
pub use default::DefaultEntitySystem;

/// The interned name of a component type.
pub type ComponentType = StringId;

/// Upcasts to [`Any`] for downcasting trait objects to their concrete type.
pub trait AsAny: Any {
    /// Returns `self` as `&dyn Any`.
    fn as_any(&self) -> &dyn Any;

    /// Returns `self` as `&mut dyn Any`.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any { self }

    fn as_any_mut(&mut self) -> &mut dyn Any { self }
}

/// A unit of data attached to an entity.
///
/// The data of a component is exposed by name through [`Properties`],
/// which is usually implemented with `#[derive(Properties)]`.
pub trait Component: Properties + AsAny {
    /// The type of this component.
    fn component_type(&self) -> ComponentType;

    /// Called by the owning system after the component has been created for `entity`.
    fn on_added_to_entity(&mut self, _entity: EntityId) {}

    /// Called by the owning system before the component of `entity` is destroyed.
    fn on_removed_from_entity(&mut self, _entity: EntityId) {}
}

/// A component type known at compile time.
pub trait Typed: Component + Default {
    /// The component type, same as [`Component::component_type`].
    const TYPE: ComponentType;
}

/// Downcasts a component trait object.
pub fn downcast_ref<C: Component>(component: &dyn Component) -> Option<&C> {
    component.as_any().downcast_ref()
}

/// Downcasts a mutable component trait object.
pub fn downcast_mut<C: Component>(component: &mut dyn Component) -> Option<&mut C> {
    component.as_any_mut().downcast_mut()
}

/// Proof that a component deletion is requested by the [`EntityManager`](crate::EntityManager).
///
/// Only the manager can construct this token,
/// so components cannot be deleted without notifying deletion callbacks.
#[derive(Debug)]
pub struct DeleteToken(());

impl DeleteToken {
    pub(crate) fn new() -> Self { Self(()) }
}

/// Owns the components of one type and the logic around them.
pub trait EntitySystem: AsAny {
    /// The type of the components owned by this system.
    fn component_type(&self) -> ComponentType;

    /// The base type of the components owned by this system.
    ///
    /// Looking up a component of the base type with derived search enabled
    /// also finds components of this system.
    fn base_type(&self) -> Option<ComponentType> { None }

    /// Whether `entity` has a component of this type.
    fn has_component(&self, entity: EntityId) -> bool;

    /// Gets the component of `entity`.
    fn component(&self, entity: EntityId) -> Option<&dyn Component>;

    /// Gets the component of `entity` mutably.
    fn component_mut(&mut self, entity: EntityId) -> Option<&mut dyn Component>;

    /// Creates a component for `entity`.
    ///
    /// Systems that do not support creating components keep the default,
    /// which returns [`Error::CreationRefused`].
    fn create_component(&mut self, entity: EntityId) -> Result<&mut dyn Component, Error> {
        Err(Error::CreationRefused { entity, ty: self.component_type() })
    }

    /// Removes and destroys the component of `entity`.
    ///
    /// Returns `false` if `entity` does not have a component of this type.
    fn delete_component(&mut self, token: DeleteToken, entity: EntityId) -> bool;

    /// Lists the entities that have a component of this type, in ascending order.
    fn entities(&self) -> Vec<EntityId>;

    /// Describes the properties of a new component of this type with their default values.
    fn component_properties(&self) -> Group;

    /// The properties of the system itself.
    fn system_properties(&self) -> Group { Group::new() }

    /// Called after the system has been added to an entity manager.
    ///
    /// This is where systems register their message functors.
    fn on_added_to_entity_manager(&mut self, _pump: &Rc<MessagePump>) {}

    /// Called when the system is removed from an entity manager or the manager is dropped.
    fn on_removed_from_entity_manager(&mut self, _pump: &Rc<MessagePump>) {}

    /// Whether the component of `entity` is saved with maps.
    fn store_component_to_map(&self, _entity: EntityId) -> bool { true }

    /// Whether [`Spawner`](crate::Spawner)s may create components of this type.
    fn allow_component_creation_by_spawner(&self) -> bool { true }

    /// Whether the system properties are saved with scenes.
    fn store_properties_to_scene(&self) -> bool { true }
}

/// Downcasts an entity system trait object.
pub fn downcast_system_ref<S: EntitySystem>(system: &dyn EntitySystem) -> Option<&S> {
    system.as_any().downcast_ref()
}

/// Downcasts a mutable entity system trait object.
pub fn downcast_system_mut<S: EntitySystem>(system: &mut dyn EntitySystem) -> Option<&mut S> {
    system.as_any_mut().downcast_mut()
}
