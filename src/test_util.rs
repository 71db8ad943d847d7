#![allow(missing_docs)]

use std::cell::{Cell, RefCell};
use std::mem;
use std::rc::Rc;

use glam::Vec3;
use parking_lot::Once;

use crate::entity::EntityId;
use crate::manager::Error;
use crate::message::{builtin, Message, MessageType};
use crate::property::{Group, Value};
use crate::pump::{MessageFunctor, MessagePump, Options};
use crate::sid::StringId;
use crate::storage;
use crate::system::{
    Component, ComponentType, DefaultEntitySystem, DeleteToken, EntitySystem, Typed,
};

pub fn init() {
    static SET_LOGGER_ONCE: Once = Once::new();
    SET_LOGGER_ONCE.call_once(env_logger::init);
}

/// Records events in the order they happen.
#[derive(Debug, Clone, Default)]
pub struct CallRecorder(Rc<RefCell<Vec<String>>>);

impl CallRecorder {
    /// Records an event.
    pub fn push(&self, event: impl Into<String>) { self.0.borrow_mut().push(event.into()); }

    /// Creates a new functor that records `label` whenever it is called.
    pub fn functor(&self, label: &str) -> MessageFunctor {
        let recorder = self.clone();
        let label = label.to_owned();
        MessageFunctor::new(move |_| recorder.push(label.as_str()))
    }

    /// Returns the recorded events.
    pub fn events(&self) -> Vec<String> { self.0.borrow().clone() }

    /// Returns the recorded events and starts over.
    pub fn take(&self) -> Vec<String> { mem::take(&mut *self.0.borrow_mut()) }
}

/// Collects every message of type `ty` emitted through `pump`.
pub fn record_messages(pump: &MessagePump, ty: MessageType) -> Rc<RefCell<Vec<Message>>> {
    let messages = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&messages);
    pump.subscribe(ty, Options::default(), move |message| sink.borrow_mut().push(message.clone()));
    messages
}

/// A plain component with two properties.
#[derive(Debug, Clone, PartialEq, Default, dtentity_codegen::Properties)]
#[properties(dtentity_as(crate))]
pub struct Position {
    #[property(name = "Position")]
    pub position: Vec3,
    #[property(name = "Visible")]
    pub visible:  bool,
}

impl Position {
    pub const POSITION: StringId = StringId::of("Position");
    pub const VISIBLE: StringId = StringId::of("Visible");
}

impl Component for Position {
    fn component_type(&self) -> ComponentType { Self::TYPE }
}

impl Typed for Position {
    const TYPE: ComponentType = StringId::of("PositionComponent");
}

/// A component that records its change notifications.
#[derive(Debug, Default, dtentity_codegen::Properties)]
#[properties(dtentity_as(crate), on_changed = health_changed, finished = health_finished)]
pub struct Health {
    #[property(name = "Current")]
    pub current:  f32,
    #[property(name = "Max")]
    pub max:      f32,
    #[property(skip)]
    pub changed:  Vec<StringId>,
    #[property(skip)]
    pub finished: u32,
    #[property(skip)]
    pub attached: Option<EntityId>,
}

impl Health {
    pub const CURRENT: StringId = StringId::of("Current");
    pub const MAX: StringId = StringId::of("Max");
}

fn health_changed(health: &mut Health, name: StringId) { health.changed.push(name); }

fn health_finished(health: &mut Health) { health.finished += 1; }

impl Component for Health {
    fn component_type(&self) -> ComponentType { Self::TYPE }

    fn on_added_to_entity(&mut self, entity: EntityId) { self.attached = Some(entity); }
}

impl Typed for Health {
    const TYPE: ComponentType = StringId::of("HealthComponent");
}

/// The base type of [`PointLight`].
pub const LIGHT: ComponentType = StringId::of("Light");

/// A component derived from [`LIGHT`].
#[derive(Debug, Default, dtentity_codegen::Properties)]
#[properties(dtentity_as(crate))]
pub struct PointLight {
    #[property(name = "Radius")]
    pub radius: f64,
}

impl Component for PointLight {
    fn component_type(&self) -> ComponentType { Self::TYPE }
}

impl Typed for PointLight {
    const TYPE: ComponentType = StringId::of("PointLight");
}

/// A component derived from [`PointLight`].
#[derive(Debug, Default, dtentity_codegen::Properties)]
#[properties(dtentity_as(crate))]
pub struct SpotLight {
    #[property(flatten)]
    pub light: PointLight,
    #[property(name = "Angle")]
    pub angle: f64,
}

impl Component for SpotLight {
    fn component_type(&self) -> ComponentType { Self::TYPE }
}

impl Typed for SpotLight {
    const TYPE: ComponentType = StringId::of("SpotLight");
}

pub fn point_light_system() -> DefaultEntitySystem<PointLight> {
    DefaultEntitySystem::new().with_base_type(LIGHT)
}

pub fn spot_light_system() -> DefaultEntitySystem<SpotLight> {
    DefaultEntitySystem::new().with_base_type(PointLight::TYPE)
}

/// The component of [`TickSystem`].
#[derive(Debug, Default, dtentity_codegen::Properties)]
#[properties(dtentity_as(crate))]
pub struct TickCounter {
    #[property(name = "Ticks")]
    pub ticks: u32,
}

impl Component for TickCounter {
    fn component_type(&self) -> ComponentType { Self::TYPE }
}

impl Typed for TickCounter {
    const TYPE: ComponentType = StringId::of("TickCounter");
}

/// A system that counts tick messages while it is registered
/// and refuses component creation by spawners.
pub struct TickSystem {
    inner:   DefaultEntitySystem<TickCounter, storage::Vec<TickCounter>>,
    ticks:   Rc<Cell<u32>>,
    functor: Option<MessageFunctor>,
}

impl TickSystem {
    pub const TICKS: StringId = StringId::of("Ticks");

    pub fn new() -> Self {
        Self { inner: DefaultEntitySystem::new(), ticks: Rc::default(), functor: None }
    }

    /// Returns the shared tick counter.
    pub fn ticks(&self) -> Rc<Cell<u32>> { Rc::clone(&self.ticks) }
}

impl Default for TickSystem {
    fn default() -> Self { Self::new() }
}

impl EntitySystem for TickSystem {
    fn component_type(&self) -> ComponentType { TickCounter::TYPE }

    fn has_component(&self, entity: EntityId) -> bool { self.inner.has_component(entity) }

    fn component(&self, entity: EntityId) -> Option<&dyn Component> {
        self.inner.component(entity)
    }

    fn component_mut(&mut self, entity: EntityId) -> Option<&mut dyn Component> {
        self.inner.component_mut(entity)
    }

    fn create_component(&mut self, entity: EntityId) -> Result<&mut dyn Component, Error> {
        self.inner.create_component(entity)
    }

    fn delete_component(&mut self, token: DeleteToken, entity: EntityId) -> bool {
        self.inner.delete_component(token, entity)
    }

    fn entities(&self) -> Vec<EntityId> { self.inner.entities() }

    fn component_properties(&self) -> Group { self.inner.component_properties() }

    fn system_properties(&self) -> Group {
        Group::from([(Self::TICKS, Value::UInt(self.ticks.get()))])
    }

    fn on_added_to_entity_manager(&mut self, pump: &Rc<MessagePump>) {
        let ticks = Rc::clone(&self.ticks);
        self.functor = Some(pump.subscribe(builtin::tick::TYPE, Options::default(), move |_| {
            ticks.set(ticks.get() + 1);
        }));
    }

    fn on_removed_from_entity_manager(&mut self, pump: &Rc<MessagePump>) {
        if let Some(functor) = self.functor.take() {
            pump.unregister_for_messages(builtin::tick::TYPE, &functor);
        }
    }

    fn allow_component_creation_by_spawner(&self) -> bool { false }

    fn store_properties_to_scene(&self) -> bool { false }
}

/// A system whose components are managed elsewhere and cannot be created through the manager.
#[derive(Debug, Default)]
pub struct ExternalSystem;

impl ExternalSystem {
    pub const TYPE: ComponentType = StringId::of("External");
}

impl EntitySystem for ExternalSystem {
    fn component_type(&self) -> ComponentType { Self::TYPE }

    fn has_component(&self, _: EntityId) -> bool { false }

    fn component(&self, _: EntityId) -> Option<&dyn Component> { None }

    fn component_mut(&mut self, _: EntityId) -> Option<&mut dyn Component> { None }

    fn delete_component(&mut self, _: DeleteToken, _: EntityId) -> bool { false }

    fn entities(&self) -> Vec<EntityId> { Vec::new() }

    fn component_properties(&self) -> Group { Group::new() }
}
