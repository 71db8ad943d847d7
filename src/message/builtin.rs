//! Message types emitted by the entity manager and the update loop.
//!
//! Each submodule defines the type tag, the field names and a constructor.

use super::MessageFactory;

/// The names of all built-in types and fields,
/// for preloading into an [`Interner`](crate::sid::Interner).
pub const NAMES: &[&str] = &[
    "TickMessage",
    "DeltaSimTime",
    "DeltaRealTime",
    "SimTimeScale",
    "SimulationTime",
    "EntitySystemAddedMessage",
    "EntitySystemRemovedMessage",
    "ComponentType",
    "ComponentTypeString",
    "SystemProperties",
    "EntityAddedToSceneMessage",
    "EntityRemovedFromSceneMessage",
    "AboutEntity",
    "EntityName",
    "UniqueId",
    "MapName",
    "VisibleInEntityList",
    "EntitySpawnedMessage",
    "SpawnerName",
];

/// Registers the prototypes of all built-in message types.
pub fn register_all(factory: &mut MessageFactory) {
    factory.register(tick::prototype());
    factory.register(entity_system_added::prototype());
    factory.register(entity_system_removed::prototype());
    factory.register(entity_added_to_scene::prototype());
    factory.register(entity_removed_from_scene::prototype());
    factory.register(entity_spawned::prototype());
}

/// Advances the simulation by one frame.
pub mod tick {
    use crate::message::{Message, MessageType};
    use crate::StringId;

    pub const TYPE: MessageType = StringId::of("TickMessage");
    /// Simulated seconds since the last tick (`FLOAT`).
    pub const DELTA_SIM_TIME: StringId = StringId::of("DeltaSimTime");
    /// Wall-clock seconds since the last tick (`FLOAT`).
    pub const DELTA_REAL_TIME: StringId = StringId::of("DeltaRealTime");
    /// Ratio of simulated time to wall-clock time (`FLOAT`).
    pub const SIM_TIME_SCALE: StringId = StringId::of("SimTimeScale");
    /// Total simulated seconds (`DOUBLE`).
    pub const SIMULATION_TIME: StringId = StringId::of("SimulationTime");

    pub fn prototype() -> Message { new(0., 0., 1., 0.) }

    pub fn new(
        delta_sim_time: f32,
        delta_real_time: f32,
        sim_time_scale: f32,
        simulation_time: f64,
    ) -> Message {
        Message::new(TYPE)
            .with(DELTA_SIM_TIME, delta_sim_time)
            .with(DELTA_REAL_TIME, delta_real_time)
            .with(SIM_TIME_SCALE, sim_time_scale)
            .with(SIMULATION_TIME, simulation_time)
    }
}

macro_rules! system_message {
    ($(#[$meta:meta])* $module:ident, $name:literal $(, $extra_name:ident: $extra_ty:ty = $extra_id:literal)?) => {
        $(#[$meta])*
        pub mod $module {
            use crate::message::{Message, MessageType};
            use crate::system::ComponentType;
            use crate::StringId;

            pub const TYPE: MessageType = StringId::of($name);
            /// The component type of the system (`STRINGID`).
            pub const COMPONENT_TYPE: StringId = StringId::of("ComponentType");
            /// The recorded name of the component type (`STRING`).
            pub const COMPONENT_TYPE_STRING: StringId = StringId::of("ComponentTypeString");
            $(
                #[allow(missing_docs)]
                pub const $extra_name: StringId = StringId::of($extra_id);
            )?

            pub fn prototype() -> Message {
                Message::new(TYPE)
                    .with(COMPONENT_TYPE, StringId::NONE)
                    .with(COMPONENT_TYPE_STRING, String::new())
                    $(.with($extra_name, <$extra_ty>::default()))?
            }

            pub fn new(component_type: ComponentType, type_string: String) -> Message {
                prototype()
                    .with(COMPONENT_TYPE, component_type)
                    .with(COMPONENT_TYPE_STRING, type_string)
            }
        }
    };
}

system_message! {
    /// An entity system has been added to the entity manager.
    ///
    /// `SYSTEM_PROPERTIES` holds a snapshot of the system-level properties (`GROUP`).
    entity_system_added, "EntitySystemAddedMessage",
    SYSTEM_PROPERTIES: crate::property::Group = "SystemProperties"
}

system_message! {
    /// An entity system has been removed from the entity manager.
    entity_system_removed, "EntitySystemRemovedMessage"
}

macro_rules! scene_message {
    ($(#[$meta:meta])* $module:ident, $name:literal) => {
        $(#[$meta])*
        pub mod $module {
            use crate::entity::EntityId;
            use crate::message::{Message, MessageType};
            use crate::StringId;

            pub const TYPE: MessageType = StringId::of($name);
            /// The entity concerned (`UINT`).
            pub const ABOUT_ENTITY: StringId = StringId::of("AboutEntity");
            /// The display name of the entity (`STRING`).
            pub const ENTITY_NAME: StringId = StringId::of("EntityName");
            /// A persistent identifier of the entity (`STRING`).
            pub const UNIQUE_ID: StringId = StringId::of("UniqueId");
            /// The map the entity was loaded from (`STRING`).
            pub const MAP_NAME: StringId = StringId::of("MapName");
            /// Whether editors should list the entity (`BOOL`).
            pub const VISIBLE_IN_ENTITY_LIST: StringId = StringId::of("VisibleInEntityList");

            pub fn prototype() -> Message {
                Message::new(TYPE)
                    .with(ABOUT_ENTITY, 0_u32)
                    .with(ENTITY_NAME, String::new())
                    .with(UNIQUE_ID, String::new())
                    .with(MAP_NAME, String::new())
                    .with(VISIBLE_IN_ENTITY_LIST, true)
            }

            pub fn new(entity: EntityId) -> Message { prototype().with(ABOUT_ENTITY, entity.raw()) }
        }
    };
}

scene_message! {
    /// An entity has been added to the scene.
    entity_added_to_scene, "EntityAddedToSceneMessage"
}

scene_message! {
    /// An entity has been removed from the scene.
    entity_removed_from_scene, "EntityRemovedFromSceneMessage"
}

/// A spawner has created the components of an entity.
pub mod entity_spawned {
    use crate::entity::EntityId;
    use crate::message::{Message, MessageType};
    use crate::StringId;

    pub const TYPE: MessageType = StringId::of("EntitySpawnedMessage");
    /// The spawned entity (`UINT`).
    pub const ABOUT_ENTITY: StringId = StringId::of("AboutEntity");
    /// The name of the spawner (`STRING`).
    pub const SPAWNER_NAME: StringId = StringId::of("SpawnerName");

    pub fn prototype() -> Message {
        Message::new(TYPE).with(ABOUT_ENTITY, 0_u32).with(SPAWNER_NAME, String::new())
    }

    pub fn new(entity: EntityId, spawner_name: &str) -> Message {
        prototype().with(ABOUT_ENTITY, entity.raw()).with(SPAWNER_NAME, spawner_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sid::StringId;

    #[test]
    fn test_names_cover_builtin_ids() {
        let ids: Vec<StringId> = NAMES.iter().map(|name| StringId::of(name)).collect();
        for msg in [
            tick::prototype(),
            entity_system_added::prototype(),
            entity_system_removed::prototype(),
            entity_added_to_scene::prototype(),
            entity_removed_from_scene::prototype(),
            entity_spawned::prototype(),
        ] {
            assert!(ids.contains(&msg.ty()));
            for (field, _) in msg.iter() {
                assert!(ids.contains(&field));
            }
        }
    }

    #[test]
    fn test_system_added_fields() {
        let ty = StringId::of("Position");
        let msg = entity_system_added::new(ty, "Position".to_string());
        assert_eq!(msg.typed::<StringId>(entity_system_added::COMPONENT_TYPE), Some(ty));
        assert_eq!(
            msg.typed::<String>(entity_system_added::COMPONENT_TYPE_STRING).as_deref(),
            Some("Position"),
        );
        assert!(msg.get(entity_system_added::SYSTEM_PROPERTIES).is_some());
        assert!(entity_system_removed::new(ty, String::new())
            .get(entity_system_added::SYSTEM_PROPERTIES)
            .is_none());
    }
}
