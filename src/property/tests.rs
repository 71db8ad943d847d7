use std::cell::Cell;
use std::rc::Rc;

use glam::{DQuat, DVec3, DVec4, Vec3};
use strum::IntoEnumIterator;

use super::*;
use crate::test_util::{self, Health, Position, SpotLight};

#[test]
fn test_default_values_have_their_kind() {
    for kind in Kind::iter() {
        assert_eq!(Value::default_of(kind).kind(), kind);
        assert_eq!(Property::of_kind(kind).kind(), kind);
    }

    assert_eq!(Value::default_of(Kind::Quat), Value::Quat(DQuat::IDENTITY));
    assert_eq!(Value::default_of(Kind::StringId), Value::StringId(StringId::NONE));
}

macro_rules! test_conversion {
    ($($name:ident: $value:expr => $accessor:ident == $expect:expr;)*) => {
        $(
            paste::paste! {
                #[test]
                fn [<test_convert_ $name>]() {
                    test_util::init();
                    assert_eq!($value.$accessor(), $expect);
                }
            }
        )*
    }
}

test_conversion! {
    double_to_int: Value::Double(2.9) => int_value == Some(2);
    negative_int_to_uint: Value::Int(-3) => uint_value == None;
    uint_to_float: Value::UInt(7) => float_value == Some(7.);
    float_to_double: Value::Float(0.5) => double_value == Some(0.5);
    large_uint_to_int: Value::UInt(u32::MAX) => int_value == None;
    string_to_bool: Value::String("true".into()) => bool_value == None;
    string_to_string_id: Value::String("Position".into())
        => string_id_value == Some(StringId::of("Position"));
    array_to_vec3: Value::Array(vec![Value::Int(1), Value::Float(2.), Value::Double(3.)])
        => vec3_value == Some(Vec3::new(1., 2., 3.));
    short_array_to_vec3: Value::Array(vec![Value::Int(1), Value::Int(2)]) => vec3_value == None;
    vec3_to_vec3d: Value::Vec3(Vec3::new(1., 2., 3.)) => vec3d_value == Some(DVec3::new(1., 2., 3.));
    vec4d_to_quat: Value::Vec4d(DVec4::new(0., 0., 0., 1.)) => quat_value == Some(DQuat::IDENTITY);
    quat_to_vec4d: Value::Quat(DQuat::IDENTITY) => vec4d_value == Some(DVec4::new(0., 0., 0., 1.));
    large_double_to_int: Value::Double(1e12) => int_value == None;
    large_double_to_uint: Value::Double(1e12) => uint_value == None;
    nan_to_int: Value::Double(f64::NAN) => int_value == None;
    max_float_to_int: Value::Float(f32::MAX) => int_value == None;
    negative_double_to_int: Value::Double(-2.9) => int_value == Some(-2);
    max_double_to_uint: Value::Double(4294967295.5) => uint_value == Some(u32::MAX);
}

#[test]
fn test_set_from_keeps_kind() {
    let mut value = Value::UInt(3);
    assert!(value.set_from(&Value::Double(7.9)));
    assert_eq!(value, Value::UInt(7));

    assert!(!value.set_from(&Value::Bool(true)));
    assert_eq!(value, Value::UInt(7));
}

#[test]
fn test_string_format() {
    let interner = Interner::new();

    assert_eq!(Value::Float(3.5).string_value(&interner), "3.5000000000");
    assert_eq!(Value::Double(0.25).string_value(&interner), "0.2500000000");
    assert_eq!(Value::parse(Kind::Float, "3.5000000000", &interner), Some(Value::Float(3.5)));

    let vector = Value::Vec3(Vec3::new(1., 2.5, -3.));
    let text = vector.string_value(&interner);
    assert_eq!(text, "1.0000000000 2.5000000000 -3.0000000000");
    assert_eq!(Value::parse(Kind::Vec3, &text, &interner), Some(vector));

    let id = Value::parse(Kind::StringId, "PositionComponent", &interner).expect("names parse");
    assert_eq!(id, Value::StringId(StringId::of("PositionComponent")));
    assert_eq!(id.string_value(&interner), "PositionComponent");

    assert_eq!(Value::parse(Kind::Bool, "1", &interner), Some(Value::Bool(true)));
    assert_eq!(Value::parse(Kind::Bool, "yes", &interner), None);
    assert_eq!(Value::parse(Kind::Vec2, "1 2 3", &interner), None);
    assert_eq!(Value::parse(Kind::Group, "", &interner), None);
    assert_eq!(Value::Group(Group::new()).string_value(&interner), "Group");
}

#[test]
fn test_property_rejects_other_kinds() {
    let interner = Interner::new();
    let mut property = Property::of_kind(Kind::Float);

    assert!(!property.set(Value::Double(1.)));
    assert!(property.set(Value::Float(1.5)));
    assert!(property.set_from_value(&Value::Int(4)));
    assert_eq!(property.float_value(), Some(4.));
    assert_eq!(property.kind(), Kind::Float);

    assert!(property.set_string("0.25", &interner));
    assert_eq!(property.string_value(&interner), "0.2500000000");
    assert!(!property.set_string("quarter", &interner));
}

#[test]
fn test_dynamic_follows_external_state() {
    let state = Rc::new(Cell::new(0.));
    let mut property = Property::from(Dynamic::new(
        {
            let state = Rc::clone(&state);
            move || state.get()
        },
        {
            let state = Rc::clone(&state);
            move |value: f64| state.set(value)
        },
    ));

    assert!(property.is_dynamic());
    assert_eq!(property.kind(), Kind::Double);
    assert_eq!(property.double_value(), Some(0.));

    state.set(3.5);
    assert_eq!(property.double_value(), Some(3.5));

    let snapshot = property.clone();
    assert!(property.set_from_value(&Value::Int(7)));
    assert_eq!(state.get(), 7.);
    assert_eq!(snapshot.double_value(), Some(3.5));
    assert!(!snapshot.is_dynamic());

    assert!(!property.set(Value::Float(1.)));
    assert_eq!(state.get(), 7.);
}

#[test]
fn test_out_of_range_set_is_rejected() {
    let mut property = Property::of_kind(Kind::Int);
    assert!(property.set_from_value(&Value::Int(5)));

    assert!(!property.set_from_value(&Value::Double(1e12)));
    assert!(!property.set_from_value(&Value::Float(f32::NAN)));
    assert_eq!(property.int_value(), Some(5));
}

#[test]
fn test_dynamic_float_writes_through() {
    let state = Rc::new(Cell::new(0_f32));
    let mut property = Property::from(Dynamic::new(
        {
            let state = Rc::clone(&state);
            move || state.get()
        },
        {
            let state = Rc::clone(&state);
            move |value: f32| state.set(value)
        },
    ));

    assert_eq!(property.kind(), Kind::Float);
    assert!(property.set(Value::Float(3.5)));
    assert_eq!(state.get(), 3.5);
    assert_eq!(property.float_value(), Some(3.5));
}

#[test]
fn test_read_only_dynamic() {
    let mut property = Property::from(Dynamic::read_only(|| String::from("fixed")));
    assert!(!property.set(Value::String("changed".into())));
    assert_eq!(property.string().as_deref(), Some("fixed"));
}

const SPEED: StringId = StringId::of("Speed");
const NAME: StringId = StringId::of("Name");

fn container() -> PropertyContainer {
    PropertyContainer::new()
        .with(SPEED, Value::Float(1.))
        .with(NAME, Value::String("runner".into()))
        .with(Position::POSITION, Value::Vec3d(DVec3::ZERO))
}

#[test]
fn test_container_order_and_access() {
    let mut container = container();

    assert_eq!(container.property_names(), [SPEED, NAME, Position::POSITION]);
    assert_eq!(container.property_kind(NAME), Some(Kind::String));
    assert!(container.set_as(SPEED, 2_u32));
    assert_eq!(container.get_as::<f32>(SPEED), Some(2.));
    assert!(!container.set_as(SPEED, true));
    assert!(!container.set_as(StringId::of("Missing"), 1_u32));

    assert!(container.remove(NAME).is_some());
    assert_eq!(container.len(), 2);
    assert!(!container.has_property(NAME));

    let group = container.properties();
    assert_eq!(group.get(&SPEED), Some(&Value::Float(2.)));
}

#[test]
#[should_panic(expected = "registered twice")]
fn test_container_rejects_duplicates() { container().register(SPEED, Value::Float(2.)); }

#[test]
fn test_container_clone_is_independent() {
    let state = Rc::new(Cell::new(1_u32));
    let mut original = container().with(
        StringId::of("Level"),
        Dynamic::new(
            {
                let state = Rc::clone(&state);
                move || state.get()
            },
            |_: u32| {},
        ),
    );

    let mut copy = original.clone();
    assert!(copy.set_as(SPEED, 5.));
    state.set(9);

    assert_eq!(original.get_as::<f32>(SPEED), Some(1.));
    assert_eq!(original.get_as::<u32>(StringId::of("Level")), Some(9));
    assert_eq!(copy.get_as::<u32>(StringId::of("Level")), Some(1));

    original.clear();
    assert!(original.is_empty());
    assert_eq!(copy.len(), 4);
}

#[test]
fn test_init_from_converts_matching_names() {
    test_util::init();

    let position = Position { position: Vec3::new(1., 2., 3.), visible: true };
    let mut container = container();
    container.init_from(&position);

    assert_eq!(container.get_as::<DVec3>(Position::POSITION), Some(DVec3::new(1., 2., 3.)));
    assert_eq!(container.property_kind(Position::POSITION), Some(Kind::Vec3d));
    assert!(!container.has_property(Position::VISIBLE));
}

#[test]
fn test_derived_properties() {
    let mut position = Position::default();

    assert_eq!(position.property_names(), [Position::POSITION, Position::VISIBLE]);
    assert_eq!(position.property_kind(Position::POSITION), Some(Kind::Vec3));
    assert!(position.set_as(Position::POSITION, DVec3::new(4., 5., 6.)));
    assert!(position.set_as(Position::VISIBLE, true));
    assert_eq!(position, Position { position: Vec3::new(4., 5., 6.), visible: true });
    assert!(!position.set_as(Position::VISIBLE, 1_u32));
    assert_eq!(position.get_property(StringId::of("position")), None);
}

#[test]
fn test_derived_flatten() {
    let mut light = SpotLight::default();
    let radius = StringId::of("Radius");
    let angle = StringId::of("Angle");

    assert_eq!(light.property_names(), [angle, radius]);
    assert!(light.set_as(radius, 3_i32));
    assert_eq!(light.light.radius, 3.);
    assert_eq!(light.property_kind(radius), Some(Kind::Double));
}

#[test]
fn test_derived_notifications() {
    let mut health = Health::default();

    assert!(health.set_and_notify(Health::MAX, &Value::Double(100.)));
    assert!(!health.set_and_notify(Health::MAX, &Value::Bool(true)));
    assert!(health.set_property(Health::CURRENT, &Value::UInt(50)));
    health.finished();

    assert_eq!(health.changed, [Health::MAX]);
    assert_eq!(health.finished, 1);
    assert_eq!(health.current, 50.);
    assert!(!health.has_property(StringId::of("Changed")));
}
