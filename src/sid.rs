//! Interned names.
//!
//! A [`StringId`] is a 32-bit hash of a human-readable name.
//! Hashing is pure and does not require any shared state,
//! so ids can be computed in `const` context with [`StringId::of`].
//!
//! Reverse lookup is only possible for names recorded in an [`Interner`].
//! The interner is an explicit context object shared through an `Arc`;
//! there is no process-wide table.
//!
//! Two distinct names may hash to the same id.
//! The interner detects this when both names are recorded and logs a warning,
//! but the ids themselves remain equal.

use std::collections::HashMap;
use std::fmt;

use parking_lot::RwLock;

/// The string returned by [`Interner::resolve`] for ids that were never recorded.
pub const NOT_FOUND: &str = "<String not found>";

/// A compact, comparable identifier derived from a name.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct StringId(u32);

impl StringId {
    /// The id of the empty name.
    pub const NONE: Self = Self(0);

    /// Computes the id of a name without recording it for reverse lookup.
    ///
    /// The empty string always maps to [`StringId::NONE`].
    pub const fn of(name: &str) -> Self {
        if name.is_empty() {
            return Self::NONE;
        }

        let hash = xxhash_rust::const_xxh3::xxh3_64(name.as_bytes());
        match (hash ^ (hash >> 32)) as u32 {
            0 => Self(1),
            folded => Self(folded),
        }
    }

    /// Wraps a raw hash value.
    pub const fn from_raw(raw: u32) -> Self { Self(raw) }

    /// Returns the raw hash value.
    pub const fn raw(self) -> u32 { self.0 }

    /// Whether this is the id of the empty name.
    pub const fn is_none(self) -> bool { self.0 == 0 }
}

impl fmt::Debug for StringId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result { write!(f, "StringId({:#010x})", self.0) }
}

impl fmt::Display for StringId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result { write!(f, "{:#010x}", self.0) }
}

impl From<&str> for StringId {
    fn from(name: &str) -> Self { Self::of(name) }
}

/// Records names for reverse lookup of [`StringId`]s.
#[derive(Default)]
pub struct Interner {
    names: RwLock<HashMap<StringId, Box<str>>>,
}

impl Interner {
    /// Creates an empty interner.
    pub fn new() -> Self { Self::default() }

    /// Computes the id of `name` and records it for reverse lookup.
    ///
    /// The table is only write-locked when `name` has not been seen yet.
    pub fn intern(&self, name: &str) -> StringId {
        let id = StringId::of(name);
        if id.is_none() {
            return id;
        }

        if let Some(existing) = self.names.read().get(&id) {
            if &**existing != name {
                log::warn!("StringId collision: {name:?} and {existing:?} both hash to {id}");
            }
            return id;
        }

        let mut names = self.names.write();
        // another thread may have inserted between the two locks
        let existing = names.entry(id).or_insert_with(|| name.into());
        if &**existing != name {
            log::warn!("StringId collision: {name:?} and {existing:?} both hash to {id}");
        }

        id
    }

    /// Records several names at once.
    pub fn preload<'t>(&self, names: impl IntoIterator<Item = &'t str>) {
        let mut table = self.names.write();
        for name in names {
            let id = StringId::of(name);
            if !id.is_none() {
                table.entry(id).or_insert_with(|| name.into());
            }
        }
    }

    /// Looks up the name recorded for `id`.
    ///
    /// This is a debugging aid and should not be used on hot paths.
    /// Returns [`NOT_FOUND`] if the name was never recorded.
    pub fn resolve(&self, id: StringId) -> String {
        self.try_resolve(id).unwrap_or_else(|| NOT_FOUND.to_string())
    }

    /// Looks up the name recorded for `id`, returning `None` if it was never recorded.
    pub fn try_resolve(&self, id: StringId) -> Option<String> {
        if id.is_none() {
            return Some(String::new());
        }
        self.names.read().get(&id).map(|name| name.to_string())
    }

    /// Returns the number of recorded names.
    pub fn len(&self) -> usize { self.names.read().len() }

    /// Whether no names have been recorded.
    pub fn is_empty(&self) -> bool { self.names.read().is_empty() }
}

impl fmt::Debug for Interner {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Interner").field("len", &self.len()).finish()
    }
}

static_assertions::assert_impl_all!(Interner: Send, Sync);
static_assertions::assert_impl_all!(StringId: Send, Sync, Copy);

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use super::*;

    #[test]
    fn test_intern_is_stable_across_call_sites() {
        let interner = Interner::new();
        let first = interner.intern("Position");
        let second = interner.intern("Position");
        assert_eq!(first, second);
        assert_eq!(first, StringId::of("Position"));
    }

    #[test]
    fn test_round_trip() {
        let interner = Interner::new();
        for name in ["Position", "Velocity", "TickMessage", "a", "ünïcödé"] {
            let id = interner.intern(name);
            assert_eq!(interner.resolve(id), name);
        }
    }

    #[test]
    fn test_unrecorded_lookup() {
        let interner = Interner::new();
        let id = StringId::of("never interned");
        assert_eq!(interner.resolve(id), NOT_FOUND);
        assert_eq!(interner.try_resolve(id), None);
    }

    #[test]
    fn test_empty_is_none() {
        let interner = Interner::new();
        assert_eq!(StringId::of(""), StringId::NONE);
        assert_eq!(interner.intern(""), StringId::NONE);
        assert_eq!(interner.resolve(StringId::NONE), "");
        assert!(interner.is_empty());
    }

    #[test]
    fn test_const_evaluation() {
        const POSITION: StringId = StringId::of("Position");
        assert_eq!(POSITION, StringId::from("Position"));
        assert_ne!(POSITION, StringId::of("position"));
    }

    #[test]
    fn test_preload() {
        let interner = Interner::new();
        interner.preload(["Foo", "Bar", "Foo"]);
        assert_eq!(interner.len(), 2);
        assert_eq!(interner.resolve(StringId::of("Bar")), "Bar");
    }

    #[test]
    fn test_concurrent_intern() {
        crate::test_util::init();

        let interner = Arc::new(Interner::new());
        let handles: Vec<_> = (0..4)
            .map(|thread_id| {
                let interner = Arc::clone(&interner);
                thread::spawn(move || {
                    for i in 0..100 {
                        let name = format!("name{}", (i + thread_id * 50) % 150);
                        let id = interner.intern(&name);
                        assert_eq!(interner.resolve(id), name);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().expect("interning thread panicked");
        }

        assert_eq!(interner.len(), 150);
    }
}
