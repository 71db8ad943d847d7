use std::cell::RefCell;
use std::rc::Rc;

use super::*;
use crate::property::{PropertiesExt, Value};
use crate::sid::StringId;
use crate::system::DefaultEntitySystem;
use crate::test_util::{
    self, CallRecorder, ExternalSystem, Health, PointLight, Position, SpotLight, TickCounter,
    TickSystem, LIGHT,
};

fn manager() -> EntityManager {
    test_util::init();

    let mut manager = EntityManager::new();
    manager.add_entity_system(DefaultEntitySystem::<Position>::new()).expect("fresh manager");
    manager.add_entity_system(DefaultEntitySystem::<Health>::new()).expect("fresh manager");
    manager
}

fn tick(manager: &EntityManager) { manager.emit_message(&builtin::tick::new(0.1, 0.1, 1., 0.)); }

#[test]
fn test_entity_ids_start_at_one() {
    let mut manager = manager();

    let ids: Vec<_> = (0..3).map(|_| manager.create_entity()).collect();
    assert_eq!(ids.iter().map(|id| id.raw()).collect::<Vec<_>>(), [1, 2, 3]);
    assert_eq!(manager.entity_count(), 3);

    manager.kill_entity(ids[1]).expect("entity exists");
    assert_eq!(manager.entity_ids().collect::<Vec<_>>(), [ids[0], ids[2]]);
    assert_eq!(manager.create_entity().raw(), 4);
}

#[test]
fn test_builtin_names_are_preloaded() {
    let manager = manager();
    assert_eq!(manager.interner().resolve(builtin::tick::TYPE), "TickMessage");
    assert_eq!(manager.interner().resolve(builtin::entity_spawned::SPAWNER_NAME), "SpawnerName");
}

#[test]
fn test_add_system_emits_message() {
    let mut manager = manager();
    manager.interner().intern("TickCounter");
    let added = test_util::record_messages(manager.pump(), builtin::entity_system_added::TYPE);

    manager.add_entity_system(TickSystem::new()).expect("first tick system");

    let added = added.borrow();
    assert_eq!(added.len(), 1);
    let message = &added[0];
    assert_eq!(
        message.typed::<StringId>(builtin::entity_system_added::COMPONENT_TYPE),
        Some(TickCounter::TYPE),
    );
    assert_eq!(
        message.typed::<String>(builtin::entity_system_added::COMPONENT_TYPE_STRING).as_deref(),
        Some("TickCounter"),
    );

    let properties = message
        .get(builtin::entity_system_added::SYSTEM_PROPERTIES)
        .and_then(Value::group_value)
        .expect("system properties are attached");
    assert_eq!(properties.get(&TickSystem::TICKS), Some(&Value::UInt(0)));
}

#[test]
fn test_duplicate_system_is_rejected() {
    let mut manager = manager();

    let result = manager.add_entity_system(DefaultEntitySystem::<Position>::new());
    assert_eq!(result, Err(Error::DuplicateSystem(Position::TYPE)));
    assert_eq!(manager.entity_systems().count(), 2);
}

#[test]
fn test_system_lifecycle_hooks() {
    let mut manager = manager();
    manager.add_entity_system(TickSystem::new()).expect("first tick system");
    let ticks =
        manager.system::<TickSystem>(TickCounter::TYPE).expect("tick system is added").ticks();
    let removed_messages =
        test_util::record_messages(manager.pump(), builtin::entity_system_removed::TYPE);

    tick(&manager);
    assert_eq!(ticks.get(), 1);

    let removed = manager.remove_entity_system(TickCounter::TYPE).expect("system is registered");
    assert!(system::downcast_system_ref::<TickSystem>(&*removed).is_some());
    assert!(!manager.has_entity_system(TickCounter::TYPE));
    assert!(!manager.pump().has_registrants(builtin::tick::TYPE));
    assert_eq!(removed_messages.borrow().len(), 1);

    tick(&manager);
    assert_eq!(ticks.get(), 1);
    assert!(manager.remove_entity_system(TickCounter::TYPE).is_none());
}

#[test]
fn test_typed_system_access() {
    let mut manager = manager();
    manager.add_entity_system(TickSystem::new()).expect("first tick system");

    assert!(manager.system::<TickSystem>(TickCounter::TYPE).is_some());
    assert!(manager.system::<DefaultEntitySystem<Position>>(TickCounter::TYPE).is_none());
    assert!(manager.system::<TickSystem>(StringId::of("Missing")).is_none());

    let positions = manager
        .system_mut::<DefaultEntitySystem<Position>>(Position::TYPE)
        .expect("position system is added");
    assert!(positions.is_empty());
}

#[test]
fn test_create_and_delete_component() {
    let mut manager = manager();
    let deleted = Rc::new(RefCell::new(Vec::new()));
    let callback = DeletedCallback::new({
        let deleted = Rc::clone(&deleted);
        move |ty, entity| deleted.borrow_mut().push((ty, entity))
    });
    assert!(manager.add_deleted_callback(callback.clone()));
    assert!(!manager.add_deleted_callback(callback.clone()));

    let entity = manager.create_entity();
    let health = manager.create::<Health>(entity).expect("health system exists");
    assert_eq!(health.attached, Some(entity));
    health.max = 10.;

    let result = manager.create_component(entity, Health::TYPE).map(|_| ());
    assert_eq!(result, Err(Error::ComponentExists { entity, ty: Health::TYPE }));
    assert_eq!(manager.component::<Health>(entity).map(|health| health.max), Some(10.));

    let component = manager.get_component(entity, Health::TYPE, false).expect("created above");
    assert_eq!(component.component_type(), Health::TYPE);
    assert_eq!(component.get_as::<f64>(Health::MAX), Some(10.));

    assert!(manager.delete_component(entity, Health::TYPE));
    assert!(!manager.delete_component(entity, Health::TYPE));
    assert!(!manager.delete_component(entity, Position::TYPE));
    assert_eq!(*deleted.borrow(), [(Health::TYPE, entity)]);
    assert!(manager.component::<Health>(entity).is_none());

    assert!(manager.remove_deleted_callback(&callback));
    assert!(!manager.remove_deleted_callback(&callback));
}

#[test]
fn test_create_component_failures() {
    let mut manager = manager();
    manager.add_entity_system(ExternalSystem).expect("first external system");

    let entity = manager.create_entity();
    let missing = EntityId::from_index(99);

    let result = manager.create_component(missing, Health::TYPE).map(|_| ());
    assert_eq!(result, Err(Error::NoSuchEntity(missing)));

    let unknown = StringId::of("Unknown");
    let result = manager.create_component(entity, unknown).map(|_| ());
    assert_eq!(result, Err(Error::NoSuchSystem(unknown)));

    let result = manager.create_component(entity, ExternalSystem::TYPE).map(|_| ());
    assert_eq!(result, Err(Error::CreationRefused { entity, ty: ExternalSystem::TYPE }));
    assert!(manager.component_types(entity).is_empty());
}

#[test]
fn test_kill_entity() {
    let mut manager = manager();
    let recorder = CallRecorder::default();
    manager.add_deleted_callback(DeletedCallback::new({
        let recorder = recorder.clone();
        move |ty, _| recorder.push(type_label(ty))
    }));

    let entity = manager.create_entity();
    let other = manager.create_entity();
    manager.create::<Position>(entity).expect("position system exists");
    manager.create::<Health>(entity).expect("health system exists");
    manager.create::<Health>(other).expect("health system exists");
    assert_eq!(manager.component_types(entity), [Position::TYPE, Health::TYPE]);

    manager.kill_entity(entity).expect("entity exists");
    assert_eq!(recorder.take(), ["Position", "Health"]);
    assert!(!manager.entity_exists(entity));
    assert!(!manager.has_component(entity, Health::TYPE, false));
    assert!(manager.has_component(other, Health::TYPE, false));

    assert_eq!(manager.kill_entity(entity), Err(Error::NoSuchEntity(entity)));
    assert!(recorder.events().is_empty());
}

fn type_label(ty: ComponentType) -> &'static str {
    if ty == Position::TYPE {
        "Position"
    } else if ty == Health::TYPE {
        "Health"
    } else {
        "?"
    }
}

#[test]
fn test_scene_messages() {
    let mut manager = manager();
    let added = test_util::record_messages(manager.pump(), builtin::entity_added_to_scene::TYPE);
    let removed =
        test_util::record_messages(manager.pump(), builtin::entity_removed_from_scene::TYPE);

    let first = manager.create_entity();
    let second = manager.create_entity();
    manager.create::<Health>(second).expect("health system exists");

    manager.add_to_scene(second).expect("entity exists");
    let about = added.borrow()[0].typed::<u32>(builtin::entity_added_to_scene::ABOUT_ENTITY);
    assert_eq!(about, Some(second.raw()));

    let missing = EntityId::from_index(99);
    assert_eq!(manager.add_to_scene(missing), Err(Error::NoSuchEntity(missing)));
    assert_eq!(manager.remove_from_scene(missing), Err(Error::NoSuchEntity(missing)));
    assert_eq!(added.borrow().len(), 1);

    manager.kill_all_entities();
    assert_eq!(manager.entity_count(), 0);
    let healths = manager.system::<DefaultEntitySystem<Health>>(Health::TYPE);
    assert!(healths.expect("health system is added").is_empty());

    let about: Vec<_> = removed
        .borrow()
        .iter()
        .filter_map(|msg| msg.typed::<u32>(builtin::entity_removed_from_scene::ABOUT_ENTITY))
        .collect();
    assert_eq!(about, [first.raw(), second.raw()]);
}

#[test]
fn test_derived_component_search() {
    let mut manager = manager();
    manager.add_entity_system(test_util::point_light_system()).expect("first point light system");
    manager.add_entity_system(test_util::spot_light_system()).expect("first spot light system");

    let point = manager.create_entity();
    let spot = manager.create_entity();
    let plain = manager.create_entity();
    manager.create::<PointLight>(point).expect("point light system exists");
    manager.create::<SpotLight>(spot).expect("spot light system exists");

    assert!(!manager.has_component(point, LIGHT, false));
    assert!(manager.has_component(point, LIGHT, true));
    assert!(manager.has_component(spot, LIGHT, true));
    assert!(manager.has_component(spot, PointLight::TYPE, true));
    assert!(!manager.has_component(point, SpotLight::TYPE, true));
    assert!(!manager.has_component(plain, LIGHT, true));

    let light = manager.get_component(spot, LIGHT, true).expect("spot light derives from light");
    assert_eq!(light.component_type(), SpotLight::TYPE);

    let radius = StringId::of("Radius");
    let light = manager.get_component_mut(spot, LIGHT, true).expect("found above");
    assert!(light.set_as(radius, 2.5_f64));
    assert_eq!(manager.component::<SpotLight>(spot).map(|light| light.light.radius), Some(2.5));

    manager.remove_entity_system(SpotLight::TYPE).expect("spot light system is registered");
    assert!(!manager.has_component(spot, LIGHT, true));
    assert!(manager.has_component(point, LIGHT, true));
}

#[test]
fn test_components_follow_registration_order() {
    let mut manager = manager();
    let entity = manager.create_entity();
    manager.create::<Health>(entity).expect("health system exists");
    manager.create::<Position>(entity).expect("position system exists");

    let types: Vec<_> =
        manager.components(entity).iter().map(|component| component.component_type()).collect();
    assert_eq!(types, [Position::TYPE, Health::TYPE]);
}

struct PositionBundle;

impl Bundle for PositionBundle {
    fn register(&self, builder: &mut Builder) {
        builder.add_system(DefaultEntitySystem::<Position>::new());
    }

    fn populate(&self, manager: &mut EntityManager) {
        let entity = manager.create_entity();
        if let Ok(position) = manager.create::<Position>(entity) {
            position.visible = true;
        }
    }
}

struct TickBundle;

impl Bundle for TickBundle {
    fn register(&self, builder: &mut Builder) { builder.add_system(TickSystem::new()); }
}

#[test]
fn test_bundles() {
    test_util::init();

    let manager = new([&PositionBundle as &dyn Bundle, &TickBundle]);
    assert!(manager.has_entity_system(Position::TYPE));
    assert!(manager.has_entity_system(TickCounter::TYPE));

    let entities: Vec<_> = manager.entity_ids().collect();
    assert_eq!(entities.len(), 1);
    let position = manager.component::<Position>(entities[0]).expect("populated by bundle");
    assert!(position.visible);
}

#[test]
fn test_drop_flushes_queue() {
    test_util::init();

    let recorder = CallRecorder::default();
    let mut manager = EntityManager::builder().build();
    manager.add_entity_system(TickSystem::new()).expect("first tick system");
    let pump = Rc::clone(manager.pump());
    pump.register_for_messages(
        builtin::tick::TYPE,
        &recorder.functor("tick"),
        Default::default(),
        "recorder",
    );

    manager.enqueue_message(builtin::tick::prototype());
    pump.enqueue_message_at(builtin::tick::prototype(), 1e9);
    drop(manager);

    assert_eq!(recorder.take(), ["tick", "tick"]);
    assert_eq!(pump.queued_messages(), 0);
    assert!(pump.has_registrants(builtin::tick::TYPE));
    pump.unregister_all();
}

#[test]
fn test_drop_without_flush() {
    test_util::init();

    let recorder = CallRecorder::default();
    let mut manager = EntityManager::builder().with_flush_on_drop(false).build();
    manager.add_entity_system(TickSystem::new()).expect("first tick system");
    let ticks =
        manager.system::<TickSystem>(TickCounter::TYPE).expect("tick system is added").ticks();
    let pump = Rc::clone(manager.pump());
    pump.register_for_messages(
        builtin::tick::TYPE,
        &recorder.functor("tick"),
        Default::default(),
        "recorder",
    );

    manager.enqueue_message(builtin::tick::prototype());
    drop(manager);

    assert!(recorder.events().is_empty());
    assert_eq!(pump.queued_messages(), 1);

    pump.emit_queued_messages(0.);
    assert_eq!(recorder.take(), ["tick"]);
    assert_eq!(ticks.get(), 0);
}
