//! The registry of entities and entity systems.
//!
//! The [`EntityManager`] tracks which entities exist,
//! owns one [`EntitySystem`] per component type,
//! and routes component creation and deletion through the owning system.
//! It also owns the [`MessagePump`] shared by all systems,
//! and announces registry changes through the [built-in messages](crate::message::builtin).

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::entity::EntityId;
use crate::message::{builtin, Message};
use crate::pump::MessagePump;
use crate::sid::Interner;
use crate::system::{self, Component, ComponentType, DeleteToken, EntitySystem, Typed};

mod builder;
pub use builder::{new, Builder, Bundle};

mod error;
pub use error::Error;

#[cfg(test)]
mod tests;

/// A callback notified before a component is deleted through the manager.
///
/// Clones of a callback compare equal to each other,
/// so the same value can be passed to [`EntityManager::remove_deleted_callback`].
#[derive(Clone)]
pub struct DeletedCallback(Rc<dyn Fn(ComponentType, EntityId)>);

impl DeletedCallback {
    /// Wraps a closure.
    pub fn new(f: impl Fn(ComponentType, EntityId) + 'static) -> Self { Self(Rc::new(f)) }

    fn addr(&self) -> *const () { Rc::as_ptr(&self.0) as *const () }
}

impl PartialEq for DeletedCallback {
    fn eq(&self, other: &Self) -> bool { self.addr() == other.addr() }
}

impl Eq for DeletedCallback {}

impl fmt::Debug for DeletedCallback {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "DeletedCallback({:p})", self.addr())
    }
}

/// Owns the entities, the entity systems and the message pump.
pub struct EntityManager {
    interner:          Arc<Interner>,
    pump:              Rc<MessagePump>,
    next_id:           EntityId,
    entities:          BTreeSet<EntityId>,
    systems:           IndexMap<ComponentType, Box<dyn EntitySystem>>,
    /// Maps each base type to the types of the systems that derive from it.
    type_hierarchy:    HashMap<ComponentType, Vec<ComponentType>>,
    deleted_callbacks: Vec<DeletedCallback>,
    flush_on_drop:     bool,
}

impl EntityManager {
    /// Creates a manager with default settings.
    pub fn new() -> Self { Builder::new().build() }

    /// Creates a builder for customizing the manager.
    pub fn builder() -> Builder { Builder::new() }

    pub(crate) fn from_parts(
        interner: Arc<Interner>,
        pump: MessagePump,
        flush_on_drop: bool,
    ) -> Self {
        Self {
            interner,
            pump: Rc::new(pump),
            next_id: EntityId::FIRST,
            entities: BTreeSet::new(),
            systems: IndexMap::new(),
            type_hierarchy: HashMap::new(),
            deleted_callbacks: Vec::new(),
            flush_on_drop,
        }
    }

    /// The interner used for names in logs and messages.
    pub fn interner(&self) -> &Arc<Interner> { &self.interner }

    /// The message pump shared by all entity systems.
    pub fn pump(&self) -> &Rc<MessagePump> { &self.pump }

    /// Dispatches a message synchronously. See [`MessagePump::emit_message`].
    pub fn emit_message(&self, message: &Message) { self.pump.emit_message(message) }

    /// Queues a message for the next flush. See [`MessagePump::enqueue_message`].
    pub fn enqueue_message(&self, message: Message) { self.pump.enqueue_message(message) }

    /// Delivers queued messages. See [`MessagePump::emit_queued_messages`].
    pub fn emit_queued_messages(&self, now: f64) -> usize { self.pump.emit_queued_messages(now) }

    /// Allocates a new entity.
    pub fn create_entity(&mut self) -> EntityId {
        let id = self.next_id;
        self.next_id = id.next();
        self.entities.insert(id);
        log::trace!("Created entity {id}");
        id
    }

    /// Whether the entity exists.
    pub fn entity_exists(&self, entity: EntityId) -> bool { self.entities.contains(&entity) }

    /// Iterates over all existing entities in ascending order.
    pub fn entity_ids(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.entities.iter().copied()
    }

    /// Returns the number of existing entities.
    pub fn entity_count(&self) -> usize { self.entities.len() }

    /// Deletes all components of an entity and removes the entity.
    pub fn kill_entity(&mut self, entity: EntityId) -> Result<(), Error> {
        if !self.entities.contains(&entity) {
            return Err(Error::NoSuchEntity(entity));
        }

        for ty in self.component_types(entity) {
            self.delete_component(entity, ty);
        }

        self.entities.remove(&entity);
        log::trace!("Killed entity {entity}");
        Ok(())
    }

    /// Removes every entity from the scene and kills it.
    pub fn kill_all_entities(&mut self) {
        while let Some(&entity) = self.entities.first() {
            if let Err(err) = self.remove_from_scene(entity) {
                log::error!("Cannot remove entity from scene: {err}");
            }
            if let Err(err) = self.kill_entity(entity) {
                log::error!("Cannot kill entity: {err}");
                self.entities.remove(&entity);
            }
        }
    }

    /// Announces that an entity has been added to the scene.
    pub fn add_to_scene(&self, entity: EntityId) -> Result<(), Error> {
        if !self.entities.contains(&entity) {
            log::error!("Cannot add to scene: Entity with this ID not found!");
            return Err(Error::NoSuchEntity(entity));
        }

        self.pump.emit_message(&builtin::entity_added_to_scene::new(entity));
        Ok(())
    }

    /// Announces that an entity has been removed from the scene.
    pub fn remove_from_scene(&self, entity: EntityId) -> Result<(), Error> {
        if !self.entities.contains(&entity) {
            log::error!("Cannot remove from scene: Entity with this ID not found!");
            return Err(Error::NoSuchEntity(entity));
        }

        self.pump.emit_message(&builtin::entity_removed_from_scene::new(entity));
        Ok(())
    }

    /// Registers an entity system.
    ///
    /// The system is notified through
    /// [`on_added_to_entity_manager`](EntitySystem::on_added_to_entity_manager),
    /// then an [`entity_system_added`](builtin::entity_system_added) message is emitted.
    pub fn add_entity_system(&mut self, system: impl EntitySystem) -> Result<(), Error> {
        self.add_boxed_entity_system(Box::new(system))
    }

    /// Registers a boxed entity system. See [`add_entity_system`](Self::add_entity_system).
    pub fn add_boxed_entity_system(
        &mut self,
        mut system: Box<dyn EntitySystem>,
    ) -> Result<(), Error> {
        let ty = system.component_type();
        if self.systems.contains_key(&ty) {
            log::error!("Entity system already added! Type: {}", self.interner.resolve(ty));
            return Err(Error::DuplicateSystem(ty));
        }

        if let Some(base) = system.base_type() {
            self.type_hierarchy.entry(base).or_default().push(ty);
        }

        system.on_added_to_entity_manager(&self.pump);

        let message = builtin::entity_system_added::new(ty, self.interner.resolve(ty))
            .with(builtin::entity_system_added::SYSTEM_PROPERTIES, system.system_properties());
        self.systems.insert(ty, system);

        log::debug!("Added entity system {}", self.interner.resolve(ty));
        self.pump.emit_message(&message);
        Ok(())
    }

    /// Unregisters an entity system and returns it.
    ///
    /// Components owned by the system are not deleted.
    /// Returns `None` if no system of this type is registered.
    pub fn remove_entity_system(&mut self, ty: ComponentType) -> Option<Box<dyn EntitySystem>> {
        let mut system = self.systems.shift_remove(&ty)?;

        system.on_removed_from_entity_manager(&self.pump);
        self.pump.emit_message(&builtin::entity_system_removed::new(ty, self.interner.resolve(ty)));

        if let Some(base) = system.base_type() {
            if let Some(derived) = self.type_hierarchy.get_mut(&base) {
                derived.retain(|&derived| derived != ty);
                if derived.is_empty() {
                    self.type_hierarchy.remove(&base);
                }
            }
        }

        log::debug!("Removed entity system {}", self.interner.resolve(ty));
        Some(system)
    }

    /// Whether an entity system of this type is registered.
    pub fn has_entity_system(&self, ty: ComponentType) -> bool { self.systems.contains_key(&ty) }

    /// Gets the entity system of a component type.
    pub fn entity_system(&self, ty: ComponentType) -> Option<&dyn EntitySystem> {
        self.systems.get(&ty).map(|system| &**system)
    }

    /// Gets the entity system of a component type mutably.
    pub fn entity_system_mut(&mut self, ty: ComponentType) -> Option<&mut dyn EntitySystem> {
        match self.systems.get_mut(&ty) {
            Some(system) => Some(&mut **system),
            None => None,
        }
    }

    /// Iterates over all registered systems in registration order.
    pub fn entity_systems(&self) -> impl Iterator<Item = &dyn EntitySystem> + '_ {
        self.systems.values().map(|system| &**system)
    }

    /// Gets the entity system of a component type as its concrete type.
    pub fn system<S: EntitySystem>(&self, ty: ComponentType) -> Option<&S> {
        system::downcast_system_ref(self.entity_system(ty)?)
    }

    /// Gets the entity system of a component type mutably as its concrete type.
    pub fn system_mut<S: EntitySystem>(&mut self, ty: ComponentType) -> Option<&mut S> {
        system::downcast_system_mut(self.entity_system_mut(ty)?)
    }

    /// Finds the type of the system holding the component of `entity` for `ty`,
    /// optionally searching systems that derive from `ty`.
    fn find_owner(
        &self,
        entity: EntityId,
        ty: ComponentType,
        search_derived: bool,
    ) -> Option<ComponentType> {
        if let Some(system) = self.systems.get(&ty) {
            if system.has_component(entity) {
                return Some(ty);
            }
        }

        if search_derived {
            let mut visited = vec![ty];
            self.find_derived(entity, ty, &mut visited)
        } else {
            None
        }
    }

    fn find_derived(
        &self,
        entity: EntityId,
        base: ComponentType,
        visited: &mut Vec<ComponentType>,
    ) -> Option<ComponentType> {
        let derived = self.type_hierarchy.get(&base)?;

        for &ty in derived {
            if visited.contains(&ty) {
                continue;
            }
            visited.push(ty);

            let Some(system) = self.systems.get(&ty) else {
                log::error!(
                    "Error in type hierarchy structure! Cannot find entity system {}",
                    self.interner.resolve(ty),
                );
                continue;
            };

            if system.has_component(entity) {
                return Some(ty);
            }

            if let Some(found) = self.find_derived(entity, ty, visited) {
                return Some(found);
            }
        }

        None
    }

    /// Whether `entity` has a component of type `ty`,
    /// or of a type derived from `ty` if `search_derived` is set.
    pub fn has_component(&self, entity: EntityId, ty: ComponentType, search_derived: bool) -> bool {
        self.find_owner(entity, ty, search_derived).is_some()
    }

    /// Gets the component of `entity` of type `ty`,
    /// or of a type derived from `ty` if `search_derived` is set.
    pub fn get_component(
        &self,
        entity: EntityId,
        ty: ComponentType,
        search_derived: bool,
    ) -> Option<&dyn Component> {
        let owner = self.find_owner(entity, ty, search_derived)?;
        self.systems.get(&owner)?.component(entity)
    }

    /// Gets the component of `entity` of type `ty` mutably,
    /// or of a type derived from `ty` if `search_derived` is set.
    pub fn get_component_mut(
        &mut self,
        entity: EntityId,
        ty: ComponentType,
        search_derived: bool,
    ) -> Option<&mut dyn Component> {
        let owner = self.find_owner(entity, ty, search_derived)?;
        self.systems.get_mut(&owner)?.component_mut(entity)
    }

    /// Gets the typed component of `entity`.
    pub fn component<C: Typed>(&self, entity: EntityId) -> Option<&C> {
        system::downcast_ref(self.get_component(entity, C::TYPE, false)?)
    }

    /// Gets the typed component of `entity` mutably.
    pub fn component_mut<C: Typed>(&mut self, entity: EntityId) -> Option<&mut C> {
        system::downcast_mut(self.get_component_mut(entity, C::TYPE, false)?)
    }

    /// Lists the components of `entity` in system registration order.
    pub fn components(&self, entity: EntityId) -> Vec<&dyn Component> {
        self.systems.values().filter_map(|system| system.component(entity)).collect()
    }

    /// Lists the types of the components of `entity` in system registration order.
    pub fn component_types(&self, entity: EntityId) -> Vec<ComponentType> {
        self.systems
            .iter()
            .filter(|(_, system)| system.has_component(entity))
            .map(|(&ty, _)| ty)
            .collect()
    }

    /// Creates a component of type `ty` for `entity` through the owning system.
    pub fn create_component(
        &mut self,
        entity: EntityId,
        ty: ComponentType,
    ) -> Result<&mut dyn Component, Error> {
        if !self.entities.contains(&entity) {
            return Err(Error::NoSuchEntity(entity));
        }

        match self.systems.get_mut(&ty) {
            Some(system) => system.create_component(entity),
            None => {
                log::error!(
                    "Could not add component: no entity system of type {}",
                    self.interner.resolve(ty),
                );
                Err(Error::NoSuchSystem(ty))
            }
        }
    }

    /// Creates a typed component for `entity`.
    ///
    /// # Panics
    /// Panics if the system registered for `C::TYPE` creates components of another Rust type.
    pub fn create<C: Typed>(&mut self, entity: EntityId) -> Result<&mut C, Error> {
        let component = self.create_component(entity, C::TYPE)?;
        match system::downcast_mut::<C>(component) {
            Some(component) => Ok(component),
            None => panic!(
                "Entity system of type {} does not store {}",
                C::TYPE,
                std::any::type_name::<C>()
            ),
        }
    }

    /// Deletes the component of type `ty` from `entity`.
    ///
    /// All deletion callbacks are notified before the owning system destroys the component.
    /// Returns `false` if there is no such component.
    pub fn delete_component(&mut self, entity: EntityId, ty: ComponentType) -> bool {
        let Some(system) = self.systems.get_mut(&ty) else { return false };
        if !system.has_component(entity) {
            return false;
        }

        for callback in &self.deleted_callbacks {
            (callback.0)(ty, entity);
        }

        system.delete_component(DeleteToken::new(), entity)
    }

    /// Registers a callback notified before each component deletion.
    ///
    /// Returns `false` if the callback is already registered.
    pub fn add_deleted_callback(&mut self, callback: DeletedCallback) -> bool {
        if self.deleted_callbacks.contains(&callback) {
            return false;
        }

        self.deleted_callbacks.push(callback);
        true
    }

    /// Unregisters a deletion callback.
    ///
    /// Returns `false` if the callback is not registered.
    pub fn remove_deleted_callback(&mut self, callback: &DeletedCallback) -> bool {
        let len = self.deleted_callbacks.len();
        self.deleted_callbacks.retain(|existing| existing != callback);
        self.deleted_callbacks.len() != len
    }
}

impl Default for EntityManager {
    fn default() -> Self { Self::new() }
}

impl Drop for EntityManager {
    fn drop(&mut self) {
        if self.flush_on_drop {
            self.pump.emit_queued_messages(f64::MAX);
        }

        for system in self.systems.values_mut() {
            system.on_removed_from_entity_manager(&self.pump);
        }
    }
}

impl fmt::Debug for EntityManager {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("EntityManager")
            .field("entities", &self.entities.len())
            .field("systems", &self.systems.keys().collect::<Vec<_>>())
            .finish()
    }
}
