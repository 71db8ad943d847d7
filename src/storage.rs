//! A storage is the data structure where the components of one entity system are kept.

use crate::entity::EntityId;

mod vec;
pub use vec::VecStorage as Vec;

mod tree;
pub use tree::Tree;


/// A storage for storing component data, keyed by entity.
pub trait Storage: Default + 'static {
    /// The component type stored.
    type Comp;

    /// Gets a shared reference to the component for a specific entity if it is present.
    fn get(&self, id: EntityId) -> Option<&Self::Comp>;

    /// Gets a mutable reference to the component for a specific entity if it is present.
    fn get_mut(&mut self, id: EntityId) -> Option<&mut Self::Comp>;

    /// Sets or removes the component for a specific entity,
    /// returning the original value if it was present.
    fn set(&mut self, id: EntityId, value: Option<Self::Comp>) -> Option<Self::Comp>;

    /// Returns the number of components that exist in this storage.
    fn cardinality(&self) -> usize;

    /// Return value of [`iter`](Self::iter).
    type Iter<'t>: Iterator<Item = (EntityId, &'t Self::Comp)> + 't
    where
        Self: 't;
    /// Returns an immutable iterator over the storage, ordered by entity id.
    fn iter(&self) -> Self::Iter<'_>;

    /// Return value of [`iter_mut`](Self::iter_mut).
    type IterMut<'t>: Iterator<Item = (EntityId, &'t mut Self::Comp)> + 't
    where
        Self: 't;
    /// Returns a mutable iterator over the storage, ordered by entity id.
    fn iter_mut(&mut self) -> Self::IterMut<'_>;
}
