//! Templates for populating entities with preset components.
//!
//! A [`Spawner`] holds property values for a set of component types
//! and may inherit the values of a parent spawner.
//! Values of a child override same-named values of its ancestors.

use std::cell::RefCell;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::entity::EntityId;
use crate::manager::{EntityManager, Error};
use crate::message::builtin;
use crate::property::{Group, Value};
use crate::sid::StringId;
use crate::system::ComponentType;

/// A spawner shared as the parent of other spawners.
pub type SharedSpawner = Rc<RefCell<Spawner>>;

/// A named template of component values.
#[derive(Debug, Default)]
pub struct Spawner {
    name:       String,
    map_name:   String,
    parent:     Option<SharedSpawner>,
    components: IndexMap<ComponentType, Group>,
}

impl Spawner {
    /// Creates an empty spawner.
    pub fn new(name: impl Into<String>, map_name: impl Into<String>) -> Self {
        Self { name: name.into(), map_name: map_name.into(), ..Self::default() }
    }

    /// Sets the spawner whose values this spawner inherits.
    pub fn with_parent(mut self, parent: SharedSpawner) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Wraps the spawner for use as a parent.
    pub fn into_shared(self) -> SharedSpawner { Rc::new(RefCell::new(self)) }

    /// The name of the spawner.
    pub fn name(&self) -> &str { &self.name }

    /// The map the spawner was loaded from.
    pub fn map_name(&self) -> &str { &self.map_name }

    /// The parent spawner, if any.
    pub fn parent(&self) -> Option<&SharedSpawner> { self.parent.as_ref() }

    /// Sets the values of a component type, replacing any previous values.
    pub fn add_component(&mut self, ty: ComponentType, values: Group) {
        self.components.insert(ty, values);
    }

    /// Removes the values of a component type.
    ///
    /// The values of parent spawners are not affected.
    pub fn remove_component(&mut self, ty: ComponentType) -> bool {
        self.components.shift_remove(&ty).is_some()
    }

    /// Whether this spawner itself has values for a component type.
    pub fn has_component(&self, ty: ComponentType) -> bool { self.components.contains_key(&ty) }

    /// Whether this spawner or any ancestor has values for a component type.
    pub fn has_component_recursive(&self, ty: ComponentType) -> bool {
        if self.has_component(ty) {
            return true;
        }

        match &self.parent {
            Some(parent) => parent.borrow().has_component_recursive(ty),
            None => false,
        }
    }

    /// The values of a component type held by this spawner itself.
    pub fn component_values(&self, ty: ComponentType) -> Option<&Group> {
        self.components.get(&ty)
    }

    /// Iterates over the component types held by this spawner itself.
    pub fn component_types(&self) -> impl Iterator<Item = ComponentType> + '_ {
        self.components.keys().copied()
    }

    /// Changes an existing value of a component property.
    ///
    /// The value is converted to the kind of the stored value.
    /// If this spawner does not hold the property, the parent chain is searched.
    /// Returns `false` if no spawner in the chain holds it.
    pub fn set_value(&mut self, ty: ComponentType, name: StringId, value: &Value) -> bool {
        let stored = self.components.get_mut(&ty).and_then(|values| values.get_mut(&name));
        if let Some(stored) = stored {
            return stored.set_from(value);
        }

        match &self.parent {
            Some(parent) => parent.borrow_mut().set_value(ty, name, value),
            None => false,
        }
    }

    /// Combines the values of this spawner and all its ancestors.
    ///
    /// Component types appear in the order they are first defined, root ancestor first.
    pub fn component_properties_recursive(&self) -> IndexMap<ComponentType, Group> {
        let mut combined = match &self.parent {
            Some(parent) => parent.borrow().component_properties_recursive(),
            None => IndexMap::new(),
        };

        for (&ty, values) in &self.components {
            let entry = combined.entry(ty).or_default();
            entry.extend(values.iter().map(|(&name, value)| (name, value.clone())));
        }

        combined
    }

    /// Replaces the values of this spawner with the current component values of an entity.
    pub fn init_from_entity(&mut self, manager: &EntityManager, entity: EntityId) {
        self.components.clear();
        for component in manager.components(entity) {
            self.components.insert(component.component_type(), component.properties());
        }
    }

    /// Creates the components of this spawner and its ancestors on an entity and applies the values.
    ///
    /// Components the entity already has are reused.
    /// Components that cannot be created and values that cannot be applied are logged and skipped.
    /// After all values are applied, every affected component is notified through
    /// [`Properties::finished`](crate::property::Properties::finished),
    /// and an [`entity_spawned`](builtin::entity_spawned) message is emitted.
    pub fn spawn(&self, manager: &mut EntityManager, entity: EntityId) -> Result<(), Error> {
        if !manager.entity_exists(entity) {
            return Err(Error::NoSuchEntity(entity));
        }

        let values = self.component_properties_recursive();

        for &ty in values.keys() {
            if manager.has_component(entity, ty, false) {
                continue;
            }

            if let Err(err) = self.create_component(manager, entity, ty) {
                log::error!(
                    "Could not spawn component of type {}: {err}",
                    manager.interner().resolve(ty),
                );
            }
        }

        let interner = manager.interner().clone();
        for (&ty, group) in &values {
            let Some(component) = manager.get_component_mut(entity, ty, false) else {
                log::warn!("Cannot set property of component {}", interner.resolve(ty));
                continue;
            };

            for (&name, value) in group {
                if !component.has_property(name) {
                    log::warn!("Error in spawner: Cannot set property {}", interner.resolve(name));
                    continue;
                }

                if component.set_property(name, value) {
                    component.on_property_changed(name);
                } else {
                    log::warn!("Could not set property {}", interner.resolve(name));
                }
            }
        }

        for &ty in values.keys() {
            if let Some(component) = manager.get_component_mut(entity, ty, false) {
                component.finished();
            }
        }

        manager.emit_message(&builtin::entity_spawned::new(entity, &self.name));
        Ok(())
    }

    fn create_component(
        &self,
        manager: &mut EntityManager,
        entity: EntityId,
        ty: ComponentType,
    ) -> Result<(), Error> {
        let system = manager.entity_system(ty).ok_or(Error::NoSuchSystem(ty))?;
        if !system.allow_component_creation_by_spawner() {
            return Err(Error::SpawnRefused { spawner: self.name.clone(), ty });
        }

        manager.create_component(entity, ty).map(|_| ())
    }
}
