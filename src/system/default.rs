use std::fmt;
use std::marker::PhantomData;

use super::{Component, ComponentType, DeleteToken, EntitySystem, Typed};
use crate::entity::EntityId;
use crate::manager::Error;
use crate::property::{Group, Properties, PropertyContainer};
use crate::storage::{self, Storage};

/// An entity system that stores components of type `C` in the storage `S`.
///
/// New components start from [`Default::default`].
/// System-level properties can be registered in [`properties_mut`](Self::properties_mut).
pub struct DefaultEntitySystem<C: Typed, S: Storage<Comp = C> = storage::Tree<C>> {
    base_type:  Option<ComponentType>,
    storage:    S,
    properties: PropertyContainer,
    _ph:        PhantomData<fn() -> C>,
}

impl<C: Typed, S: Storage<Comp = C>> DefaultEntitySystem<C, S> {
    /// Creates an empty system without a base type.
    pub fn new() -> Self {
        Self {
            base_type:  None,
            storage:    S::default(),
            properties: PropertyContainer::new(),
            _ph:        PhantomData,
        }
    }

    /// Declares the base type of the components of this system.
    pub fn with_base_type(mut self, base_type: ComponentType) -> Self {
        self.base_type = Some(base_type);
        self
    }

    /// Gets the typed component of `entity`.
    pub fn get(&self, entity: EntityId) -> Option<&C> { self.storage.get(entity) }

    /// Gets the typed component of `entity` mutably.
    pub fn get_mut(&mut self, entity: EntityId) -> Option<&mut C> { self.storage.get_mut(entity) }

    /// Iterates over all components in ascending entity order.
    pub fn iter(&self) -> S::Iter<'_> { self.storage.iter() }

    /// Iterates mutably over all components in ascending entity order.
    pub fn iter_mut(&mut self) -> S::IterMut<'_> { self.storage.iter_mut() }

    /// Returns the number of components owned by this system.
    pub fn len(&self) -> usize { self.storage.cardinality() }

    /// Whether this system owns no components.
    pub fn is_empty(&self) -> bool { self.len() == 0 }

    /// The system-level properties.
    pub fn properties(&self) -> &PropertyContainer { &self.properties }

    /// The system-level properties, mutably.
    pub fn properties_mut(&mut self) -> &mut PropertyContainer { &mut self.properties }
}

impl<C: Typed, S: Storage<Comp = C>> Default for DefaultEntitySystem<C, S> {
    fn default() -> Self { Self::new() }
}

impl<C: Typed, S: Storage<Comp = C>> EntitySystem for DefaultEntitySystem<C, S> {
    fn component_type(&self) -> ComponentType { C::TYPE }

    fn base_type(&self) -> Option<ComponentType> { self.base_type }

    fn has_component(&self, entity: EntityId) -> bool { self.storage.get(entity).is_some() }

    fn component(&self, entity: EntityId) -> Option<&dyn Component> {
        self.storage.get(entity).map(|comp| comp as &dyn Component)
    }

    fn component_mut(&mut self, entity: EntityId) -> Option<&mut dyn Component> {
        self.storage.get_mut(entity).map(|comp| comp as &mut dyn Component)
    }

    fn create_component(&mut self, entity: EntityId) -> Result<&mut dyn Component, Error> {
        if self.storage.get(entity).is_some() {
            return Err(Error::ComponentExists { entity, ty: C::TYPE });
        }

        self.storage.set(entity, Some(C::default()));
        match self.storage.get_mut(entity) {
            Some(comp) => {
                comp.on_added_to_entity(entity);
                Ok(comp as &mut dyn Component)
            }
            None => panic!("Storage did not keep the component of entity {entity}"),
        }
    }

    fn delete_component(&mut self, _: DeleteToken, entity: EntityId) -> bool {
        match self.storage.get_mut(entity) {
            Some(comp) => comp.on_removed_from_entity(entity),
            None => return false,
        }

        self.storage.set(entity, None);
        true
    }

    fn entities(&self) -> Vec<EntityId> { self.storage.iter().map(|(entity, _)| entity).collect() }

    fn component_properties(&self) -> Group { C::default().properties() }

    fn system_properties(&self) -> Group { self.properties.properties() }
}

impl<C: Typed, S: Storage<Comp = C>> fmt::Debug for DefaultEntitySystem<C, S> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("DefaultEntitySystem")
            .field("component_type", &C::TYPE)
            .field("base_type", &self.base_type)
            .field("len", &self.len())
            .finish()
    }
}
