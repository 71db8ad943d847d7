//! Typed, introspectable property values.
//!
//! A [`Value`] is a tagged union over the supported [`Kind`]s.
//! A [`Property`] is either a plain value or a [`Dynamic`] view
//! that forwards reads and writes to externally owned state.
//!
//! Objects expose their properties by name through the [`Properties`] trait.
//! The trait can be derived for structs with `#[derive(Properties)]`,
//! or implemented by storing properties in a [`PropertyContainer`].

use std::fmt;

use glam::{DMat4, DQuat, DVec2, DVec3, DVec4, Vec2, Vec3, Vec4};

use crate::sid::{Interner, StringId};

mod kind;
pub use kind::Kind;

mod value;
pub use value::{Array, Group, Value};

mod dynamic;
pub use dynamic::Dynamic;

mod container;
pub use container::PropertyContainer;

#[cfg(test)]
mod tests;

/// A Rust type that corresponds to exactly one [`Kind`].
pub trait PropertyValue: Clone + 'static {
    /// The kind of values produced by [`into_value`](Self::into_value).
    const KIND: Kind;

    /// Wraps `self` in a [`Value`].
    fn into_value(self) -> Value;

    /// Reads a value using the accessor of [`Self::KIND`],
    /// converting from compatible kinds.
    fn from_value(value: &Value) -> Option<Self>;
}

macro_rules! impl_property_value {
    ($($ty:ty => $kind:ident, |$value:ident| $from:expr;)*) => {
        $(
            impl PropertyValue for $ty {
                const KIND: Kind = Kind::$kind;

                fn into_value(self) -> Value { Value::$kind(self) }

                fn from_value($value: &Value) -> Option<Self> { $from }
            }
        )*
    }
}

impl_property_value! {
    Array => Array, |value| value.array_value().cloned();
    bool => Bool, |value| value.bool_value();
    f64 => Double, |value| value.double_value();
    f32 => Float, |value| value.float_value();
    Group => Group, |value| value.group_value().cloned();
    i32 => Int, |value| value.int_value();
    DMat4 => Matrix, |value| value.matrix_value();
    DQuat => Quat, |value| value.quat_value();
    String => String, |value| value.str_value().map(str::to_owned);
    StringId => StringId, |value| value.string_id_value();
    u32 => UInt, |value| value.uint_value();
    Vec2 => Vec2, |value| value.vec2_value();
    Vec3 => Vec3, |value| value.vec3_value();
    Vec4 => Vec4, |value| value.vec4_value();
    DVec2 => Vec2d, |value| value.vec2d_value();
    DVec3 => Vec3d, |value| value.vec3d_value();
    DVec4 => Vec4d, |value| value.vec4d_value();
}

/// A single property, either owning its value or proxying to external state.
///
/// The kind of a property never changes after construction.
pub enum Property {
    /// A property that owns its value.
    Plain(Value),
    /// A property that forwards to a getter/setter pair.
    Dynamic(Dynamic),
}

impl Property {
    /// Creates a plain property with the default value of `kind`.
    pub fn of_kind(kind: Kind) -> Self { Self::Plain(Value::default_of(kind)) }

    /// Returns the fixed kind of the property.
    pub fn kind(&self) -> Kind {
        match self {
            Self::Plain(value) => value.kind(),
            Self::Dynamic(dynamic) => dynamic.kind(),
        }
    }

    /// Whether the property proxies to external state.
    pub fn is_dynamic(&self) -> bool { matches!(self, Self::Dynamic(_)) }

    /// Returns the current value.
    ///
    /// For dynamic properties, this calls the getter.
    pub fn get(&self) -> Value {
        match self {
            Self::Plain(value) => value.clone(),
            Self::Dynamic(dynamic) => dynamic.get(),
        }
    }

    /// Returns a reference to the owned value of a plain property.
    pub fn as_plain(&self) -> Option<&Value> {
        match self {
            Self::Plain(value) => Some(value),
            Self::Dynamic(_) => None,
        }
    }

    /// Reads the current value as `T`, converting from compatible kinds.
    pub fn typed<T: PropertyValue>(&self) -> Option<T> {
        match self {
            Self::Plain(value) => T::from_value(value),
            Self::Dynamic(dynamic) => T::from_value(&dynamic.get()),
        }
    }

    /// Materializes the current value into a new plain property.
    ///
    /// The snapshot of a dynamic property does not follow later changes of the external state.
    pub fn snapshot(&self) -> Self { Self::Plain(self.get()) }

    /// Replaces the value with one of the same kind.
    ///
    /// Returns `false` without modifying anything if the kinds differ.
    pub fn set(&mut self, value: Value) -> bool {
        if value.kind() != self.kind() {
            return false;
        }

        match self {
            Self::Plain(current) => {
                *current = value;
                true
            }
            Self::Dynamic(dynamic) => dynamic.set(&value),
        }
    }

    /// Copies the value of `other`, converting it to the kind of `self`.
    pub fn set_from(&mut self, other: &Property) -> bool {
        match other {
            Self::Plain(value) => self.set_from_value(value),
            Self::Dynamic(dynamic) => self.set_from_value(&dynamic.get()),
        }
    }

    /// Copies `value`, converting it to the kind of `self`.
    pub fn set_from_value(&mut self, value: &Value) -> bool {
        match self {
            Self::Plain(current) => current.set_from(value),
            Self::Dynamic(dynamic) => dynamic.set(value),
        }
    }

    /// Formats the current value as a string.
    pub fn string_value(&self, interner: &Interner) -> String {
        self.get().string_value(interner)
    }

    /// Parses `text` as a value of the property's kind and stores it.
    pub fn set_string(&mut self, text: &str, interner: &Interner) -> bool {
        match Value::parse(self.kind(), text, interner) {
            Some(value) => self.set(value),
            None => false,
        }
    }
}

macro_rules! typed_accessors {
    ($($name:ident: $ty:ty,)*) => {
        impl Property {
            $(
                #[doc = concat!("Reads the current value as `", stringify!($ty), "`.")]
                pub fn $name(&self) -> Option<$ty> { self.typed() }
            )*
        }
    }
}

typed_accessors! {
    bool_value: bool,
    int_value: i32,
    uint_value: u32,
    float_value: f32,
    double_value: f64,
    string: String,
    string_id_value: StringId,
    vec2_value: Vec2,
    vec3_value: Vec3,
    vec4_value: Vec4,
    vec2d_value: DVec2,
    vec3d_value: DVec3,
    vec4d_value: DVec4,
    quat_value: DQuat,
    matrix_value: DMat4,
    array_value: Array,
    group_value: Group,
}

impl Clone for Property {
    fn clone(&self) -> Self { self.snapshot() }
}

impl PartialEq for Property {
    fn eq(&self, other: &Self) -> bool { self.get() == other.get() }
}

impl fmt::Debug for Property {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Plain(value) => fmt::Debug::fmt(value, f),
            Self::Dynamic(dynamic) => fmt::Debug::fmt(dynamic, f),
        }
    }
}

impl From<Value> for Property {
    fn from(value: Value) -> Self { Self::Plain(value) }
}

impl From<Dynamic> for Property {
    fn from(dynamic: Dynamic) -> Self { Self::Dynamic(dynamic) }
}

/// Get/set access to named properties.
///
/// Values cross this interface by copy,
/// so implementors may compute them on demand.
pub trait Properties {
    /// Returns the current value of a property, or `None` if no such property exists.
    fn get_property(&self, name: StringId) -> Option<Value>;

    /// Copies `value` into a property, converting it to the property's kind.
    ///
    /// Returns `false` if the property does not exist or the value cannot be converted.
    /// This does not call [`on_property_changed`](Self::on_property_changed).
    fn set_property(&mut self, name: StringId, value: &Value) -> bool;

    /// Returns the kind of a property, or `None` if no such property exists.
    fn property_kind(&self, name: StringId) -> Option<Kind>;

    /// Returns the names of all properties in declaration order.
    fn property_names(&self) -> Vec<StringId>;

    /// Whether a property with this name exists.
    fn has_property(&self, name: StringId) -> bool { self.property_kind(name).is_some() }

    /// Returns a snapshot of all property values.
    fn properties(&self) -> Group {
        self.property_names()
            .into_iter()
            .filter_map(|name| Some((name, self.get_property(name)?)))
            .collect()
    }

    /// Copies every property of `other` into the same-named property of `self`.
    ///
    /// Properties that `self` does not have are skipped with an error log.
    fn init_from(&mut self, other: &dyn Properties) {
        for name in other.property_names() {
            let Some(value) = other.get_property(name) else { continue };

            if !self.has_property(name) {
                log::error!("Cannot initialize property {name}: no such property");
                continue;
            }

            if !self.set_property(name, &value) {
                log::error!("Cannot initialize property {name} from a {} value", value.kind());
            }
        }
    }

    /// Called after a property has been modified through generic access.
    fn on_property_changed(&mut self, _name: StringId) {}

    /// Called after a batch of generic property modifications completes.
    fn finished(&mut self) {}
}

/// Typed helpers for [`Properties`].
pub trait PropertiesExt: Properties {
    /// Reads a property as `T`, converting from compatible kinds.
    fn get_as<T: PropertyValue>(&self, name: StringId) -> Option<T> {
        T::from_value(&self.get_property(name)?)
    }

    /// Writes a typed value into a property.
    fn set_as<T: PropertyValue>(&mut self, name: StringId, value: T) -> bool {
        self.set_property(name, &value.into_value())
    }

    /// Writes a property and notifies [`on_property_changed`](Properties::on_property_changed)
    /// if the write succeeded.
    fn set_and_notify(&mut self, name: StringId, value: &Value) -> bool {
        let success = self.set_property(name, value);
        if success {
            self.on_property_changed(name);
        }
        success
    }
}

impl<P: Properties + ?Sized> PropertiesExt for P {}
