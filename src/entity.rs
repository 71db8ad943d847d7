//! An entity is an identifier that components are attached to.
//!
//! Entities carry no data of their own;
//! the [`EntityManager`](crate::EntityManager) only tracks which ids are alive,
//! and each [`EntitySystem`](crate::EntitySystem) stores the components of its type by entity id.

use std::fmt;
use std::num::NonZeroU32;

use xias::Xias;

/// Identifies an entity within one [`EntityManager`](crate::EntityManager).
///
/// Ids are allocated from 1 upwards and never reused by the same manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntityId(NonZeroU32);

impl EntityId {
    /// The first id allocated by a manager.
    pub const FIRST: Self = Self(NonZeroU32::MIN);

    /// Converts a raw id, returning `None` for `0`.
    pub fn from_raw(raw: u32) -> Option<Self> { NonZeroU32::new(raw).map(Self) }

    /// Returns the raw id, as carried in messages.
    pub fn raw(self) -> u32 { self.0.get() }

    /// Returns the raw id as an index for dense storages.
    pub fn index(self) -> usize { self.0.get().small_int() }

    /// Converts a dense storage index back into an id.
    ///
    /// Panics if `index` is not a valid id.
    pub fn from_index(index: usize) -> Self {
        match NonZeroU32::new(index.small_int()) {
            Some(raw) => Self(raw),
            None => panic!("Entity index 0 is reserved"),
        }
    }

    /// Returns the id after this one.
    ///
    /// Panics if the id space is exhausted.
    pub(crate) fn next(self) -> Self {
        match self.0.checked_add(1) {
            Some(raw) => Self(raw),
            None => panic!("Too many entities"),
        }
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result { write!(f, "{}", self.0) }
}

impl From<EntityId> for u32 {
    fn from(id: EntityId) -> Self { id.raw() }
}

#[cfg(test)]
mod tests {
    use super::EntityId;

    #[test]
    fn test_raw_conversion() {
        assert_eq!(EntityId::from_raw(0), None);
        let id = EntityId::from_raw(7).expect("nonzero");
        assert_eq!(id.raw(), 7);
        assert_eq!(id.index(), 7);
        assert_eq!(EntityId::from_index(7), id);
        assert_eq!(id.next().raw(), 8);
        assert_eq!(EntityId::FIRST.to_string(), "1");
    }
}
