use indexmap::IndexMap;

use super::{Kind, Properties, Property, Value};
use crate::sid::StringId;

/// An insertion-ordered set of uniquely named properties.
///
/// The container owns its properties.
/// Properties that must reflect state owned elsewhere are registered as
/// [`Dynamic`](super::Dynamic) properties.
/// Cloning a container snapshots its dynamic properties into plain ones.
#[derive(Debug, Default, Clone)]
pub struct PropertyContainer {
    properties: IndexMap<StringId, Property>,
}

impl PropertyContainer {
    /// Creates an empty container.
    pub fn new() -> Self { Self::default() }

    /// Adds a property.
    ///
    /// # Panics
    /// Panics if a property with the same name is already registered.
    pub fn register(&mut self, name: StringId, property: impl Into<Property>) {
        let property = property.into();
        let kind = property.kind();
        let old = self.properties.insert(name, property);
        assert!(
            old.is_none(),
            "Property {name} is registered twice in the same container (second kind: {kind})"
        );
    }

    /// Adds a property, returning `self` for chaining.
    pub fn with(mut self, name: StringId, property: impl Into<Property>) -> Self {
        self.register(name, property);
        self
    }

    /// Returns the property with this name.
    pub fn get(&self, name: StringId) -> Option<&Property> { self.properties.get(&name) }

    /// Returns the property with this name mutably.
    pub fn get_mut(&mut self, name: StringId) -> Option<&mut Property> {
        self.properties.get_mut(&name)
    }

    /// Whether a property with this name is registered.
    pub fn contains(&self, name: StringId) -> bool { self.properties.contains_key(&name) }

    /// Removes a property, returning it if it was registered.
    pub fn remove(&mut self, name: StringId) -> Option<Property> {
        self.properties.shift_remove(&name)
    }

    /// Iterates over the properties in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (StringId, &Property)> + '_ {
        self.properties.iter().map(|(&name, property)| (name, property))
    }

    /// Returns the number of properties.
    pub fn len(&self) -> usize { self.properties.len() }

    /// Whether the container has no properties.
    pub fn is_empty(&self) -> bool { self.properties.is_empty() }

    /// Removes all properties.
    pub fn clear(&mut self) { self.properties.clear() }
}

impl Properties for PropertyContainer {
    fn get_property(&self, name: StringId) -> Option<Value> { self.get(name).map(Property::get) }

    fn set_property(&mut self, name: StringId, value: &Value) -> bool {
        match self.get_mut(name) {
            Some(property) => property.set_from_value(value),
            None => false,
        }
    }

    fn property_kind(&self, name: StringId) -> Option<Kind> { self.get(name).map(Property::kind) }

    fn property_names(&self) -> Vec<StringId> { self.properties.keys().copied().collect() }
}

impl FromIterator<(StringId, Property)> for PropertyContainer {
    fn from_iter<I: IntoIterator<Item = (StringId, Property)>>(iter: I) -> Self {
        let mut container = Self::new();
        for (name, property) in iter {
            container.register(name, property);
        }
        container
    }
}
