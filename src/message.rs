//! Messages carried by the [`MessagePump`](crate::pump::MessagePump).
//!
//! A message is a type tag plus named field values.
//! Fields are plain [`Value`]s, so messages can be cloned into queues and sent across threads.

use indexmap::IndexMap;

use crate::property::{Kind, Properties, PropertyValue, Value};
use crate::sid::StringId;

pub mod builtin;

/// The interned name identifying a message type.
pub type MessageType = StringId;

/// A typed event with named fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    ty:     MessageType,
    fields: IndexMap<StringId, Value>,
}

impl Message {
    /// Creates a message of type `ty` without any fields.
    pub fn new(ty: MessageType) -> Self { Self { ty, fields: IndexMap::new() } }

    /// Returns the message type.
    pub fn ty(&self) -> MessageType { self.ty }

    /// Sets a field, returning `self` for chaining.
    pub fn with(mut self, name: StringId, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    /// Sets a field, defining it if it does not exist yet.
    ///
    /// Unlike [`Properties::set_property`], this replaces the kind of an existing field.
    pub fn insert(&mut self, name: StringId, value: impl Into<Value>) -> Option<Value> {
        self.fields.insert(name, value.into())
    }

    /// Returns the value of a field.
    pub fn get(&self, name: StringId) -> Option<&Value> { self.fields.get(&name) }

    /// Reads a field as `T`, converting from compatible kinds.
    pub fn typed<T: PropertyValue>(&self, name: StringId) -> Option<T> {
        T::from_value(self.get(name)?)
    }

    /// Iterates over the fields in definition order.
    pub fn iter(&self) -> impl Iterator<Item = (StringId, &Value)> + '_ {
        self.fields.iter().map(|(&name, value)| (name, value))
    }

    /// Returns the number of fields.
    pub fn len(&self) -> usize { self.fields.len() }

    /// Whether the message has no fields.
    pub fn is_empty(&self) -> bool { self.fields.is_empty() }
}

impl Properties for Message {
    fn get_property(&self, name: StringId) -> Option<Value> { self.get(name).cloned() }

    fn set_property(&mut self, name: StringId, value: &Value) -> bool {
        match self.fields.get_mut(&name) {
            Some(field) => field.set_from(value),
            None => false,
        }
    }

    fn property_kind(&self, name: StringId) -> Option<Kind> { self.get(name).map(Value::kind) }

    fn property_names(&self) -> Vec<StringId> { self.fields.keys().copied().collect() }
}

static_assertions::assert_impl_all!(Message: Send, Sync, Clone);

/// Creates messages from registered prototypes.
///
/// A prototype defines the fields and default values of a message type.
#[derive(Debug, Default)]
pub struct MessageFactory {
    prototypes: IndexMap<MessageType, Message>,
}

impl MessageFactory {
    /// Creates an empty factory.
    pub fn new() -> Self { Self::default() }

    /// Creates a factory with all [built-in](builtin) message types registered.
    pub fn with_builtins() -> Self {
        let mut factory = Self::new();
        builtin::register_all(&mut factory);
        factory
    }

    /// Registers the prototype of a message type.
    ///
    /// Returns `false` if the type was already registered,
    /// in which case the existing prototype is kept.
    pub fn register(&mut self, prototype: Message) -> bool {
        let ty = prototype.ty();
        if self.prototypes.contains_key(&ty) {
            log::error!("Message type {ty} is already registered in the message factory");
            return false;
        }

        self.prototypes.insert(ty, prototype);
        true
    }

    /// Whether a message type is registered.
    pub fn is_registered(&self, ty: MessageType) -> bool { self.prototypes.contains_key(&ty) }

    /// Creates a message of a registered type with default field values.
    pub fn create(&self, ty: MessageType) -> Option<Message> { self.prototypes.get(&ty).cloned() }

    /// Iterates over the registered message types in registration order.
    pub fn message_types(&self) -> impl Iterator<Item = MessageType> + '_ {
        self.prototypes.keys().copied()
    }
}
