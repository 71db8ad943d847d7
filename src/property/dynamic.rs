use std::fmt;

use super::{Kind, PropertyValue, Value};

/// A property that proxies to externally owned state.
///
/// Every read calls the getter and every write calls the setter;
/// nothing is cached.
pub struct Dynamic {
    kind: Kind,
    get:  Box<dyn Fn() -> Value>,
    set:  Box<dyn Fn(&Value) -> bool>,
}

impl Dynamic {
    /// Creates a dynamic property from a typed getter/setter pair.
    pub fn new<T: PropertyValue>(
        get: impl Fn() -> T + 'static,
        set: impl Fn(T) + 'static,
    ) -> Self {
        Self {
            kind: T::KIND,
            get:  Box::new(move || get().into_value()),
            set:  Box::new(move |value| match T::from_value(value) {
                Some(value) => {
                    set(value);
                    true
                }
                None => false,
            }),
        }
    }

    /// Creates a dynamic property that rejects all writes.
    pub fn read_only<T: PropertyValue>(get: impl Fn() -> T + 'static) -> Self {
        Self {
            kind: T::KIND,
            get:  Box::new(move || get().into_value()),
            set:  Box::new(|_| false),
        }
    }

    /// The kind of values produced by the getter.
    pub fn kind(&self) -> Kind { self.kind }

    /// Calls the getter.
    pub fn get(&self) -> Value { (self.get)() }

    /// Converts `value` to the kind of this property and calls the setter.
    ///
    /// Returns `false` if the value cannot be converted or the property is read-only.
    pub fn set(&self, value: &Value) -> bool { (self.set)(value) }
}

impl fmt::Debug for Dynamic {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Dynamic").field("kind", &self.kind).field("value", &self.get()).finish()
    }
}
